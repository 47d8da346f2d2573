use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::answers::{AnswerEntry, AnswerSet, AnswerSetError};
use super::catalog::{CatalogError, QuestionCatalog};
use super::gateways::{CollaboratorError, Collaborators, OutboundEmail, PaymentRequest};
use super::report::{assemble, fallback_narrative, narrative_prompt, Report};
use super::scoring::{ScoreResult, ScoringError};
use super::submission::{
    storage_key, PaymentReference, PaymentStatus, PipelineStep, StepDiagnostic, Submission,
    SubmissionId, SubmissionRecord, SubmissionState, UserMeta,
};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Commercial and notification settings applied to every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub fee_minor_units: u32,
    pub currency: String,
    pub email_subject: String,
    pub email_html: String,
    pub attachment_name: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fee_minor_units: 19_900,
            currency: "INR".to_string(),
            email_subject: "Your TAICC AI Readiness Report".to_string(),
            email_html: "<p>Attached is your TAICC AI Readiness report.</p>".to_string(),
            attachment_name: "TAICC_AI_Readiness_Report.pdf".to_string(),
        }
    }
}

/// Sequences payment, scoring, report generation, persistence and notification for
/// one submission at a time. Collaborator failures degrade the affected step and the
/// flow continues; only caller errors are returned as `Err`.
#[derive(Debug)]
pub struct AssessmentPipeline {
    catalog: Arc<QuestionCatalog>,
    collaborators: Collaborators,
    settings: PipelineSettings,
}

impl AssessmentPipeline {
    pub fn new(
        catalog: Arc<QuestionCatalog>,
        collaborators: Collaborators,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog,
            collaborators,
            settings,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Register a user and request payment. The submission starts in `AwaitingPayment`.
    pub fn begin(&self, user: UserMeta) -> Result<Submission, PipelineError> {
        if user.email.trim().is_empty() {
            return Err(PipelineError::MissingEmail);
        }
        self.catalog.questions(&user.domain, &user.tier)?;

        let request = PaymentRequest {
            amount_minor_units: self.settings.fee_minor_units,
            currency: self.settings.currency.clone(),
            description: format!(
                "TAICC AI Readiness Assessment - {} - {}",
                user.domain, user.tier
            ),
            payer: user.clone(),
        };
        let link = self
            .collaborators
            .payments
            .create_payment_link(&request)
            .map_err(PipelineError::PaymentLink)?;

        let payment = PaymentReference {
            method: self.collaborators.payments.method().to_string(),
            link_id: link.link_id,
            status: PaymentStatus::NotPaid,
        };
        let submission = Submission::new(user, payment, link.url);
        info!(submission = %submission.id, "payment link issued");
        Ok(submission)
    }

    /// Poll the payment gateway. Only an explicit `Paid` moves the submission on;
    /// anything else, including a failed status check, leaves it awaiting payment.
    pub fn verify_payment(&self, submission: &mut Submission) -> PaymentStatus {
        if submission.state != SubmissionState::AwaitingPayment {
            return submission.payment.status;
        }

        let status = match self
            .collaborators
            .payments
            .payment_status(&submission.payment.link_id)
        {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    submission = %submission.id,
                    step = %PipelineStep::Payment,
                    error = %err,
                    "payment status check failed"
                );
                PaymentStatus::Unknown
            }
        };

        submission.payment.status = status;
        if status == PaymentStatus::Paid {
            submission.transition(SubmissionState::AwaitingAnswers);
        }
        status
    }

    /// Prompts for the submission's domain and tier, available once payment is confirmed.
    pub fn questions(&self, submission: &Submission) -> Result<&[String], PipelineError> {
        Self::ensure_awaiting_answers(submission)?;
        Ok(self
            .catalog
            .questions(&submission.user.domain, &submission.user.tier)?)
    }

    /// Score the answers and run the submission through to a terminal state.
    pub fn complete(
        &self,
        submission: &mut Submission,
        entries: Vec<AnswerEntry>,
    ) -> Result<PipelineOutcome, PipelineError> {
        Self::ensure_awaiting_answers(submission)?;

        let questions = self
            .catalog
            .questions(&submission.user.domain, &submission.user.tier)?;
        let answers = AnswerSet::new(questions.len(), entries)?;
        let score = ScoreResult::from_scores(&answers.scores())?;
        submission.score = Some(score);
        submission.transition(SubmissionState::Scored);

        let narrative = match self.collaborators.text.generate(&narrative_prompt(&score)) {
            Ok(text) => text,
            Err(err) => {
                let cause = degrade(submission, PipelineStep::TextGeneration, &err);
                fallback_narrative(&cause)
            }
        };
        let report = assemble(&submission.user, &score, &narrative);
        submission.report = Some(report.clone());
        submission.transition(SubmissionState::ReportGenerated);

        let document = match self.collaborators.renderer.render(&report) {
            Ok(bytes) => bytes,
            Err(err) => {
                let cause = degrade(submission, PipelineStep::Rendering, &err);
                submission.transition(SubmissionState::PartialFailure {
                    step: PipelineStep::Rendering,
                    cause,
                });
                return Ok(PipelineOutcome::new(submission, score, report));
            }
        };

        let key = storage_key(&submission.user.email, Utc::now());
        submission.pdf_reference =
            match self
                .collaborators
                .storage
                .upload(&key, &document, PDF_CONTENT_TYPE)
            {
                Ok(reference) => Some(reference),
                Err(err) => {
                    degrade(submission, PipelineStep::Storage, &err);
                    None
                }
            };

        let record = SubmissionRecord {
            submission_id: submission.id.clone(),
            user: submission.user.clone(),
            score,
            report_text: narrative,
            pdf_reference: submission.pdf_reference.clone(),
            payment: submission.payment.clone(),
            degraded_steps: submission.diagnostics.clone(),
            created_at: Utc::now(),
        };
        submission.record_id = match self.collaborators.store.append(&record) {
            Ok(record_id) => Some(record_id),
            Err(err) => {
                degrade(submission, PipelineStep::Persistence, &err);
                None
            }
        };
        submission.transition(SubmissionState::Persisted);

        let email = OutboundEmail {
            recipient: submission.user.email.clone(),
            subject: self.settings.email_subject.clone(),
            html_body: self.settings.email_html.clone(),
            attachment_name: self.settings.attachment_name.clone(),
            attachment: document,
        };
        let sent = self.collaborators.mail.send(&email);
        submission.document = Some(email.attachment);

        match sent {
            Ok(()) => {
                submission.transition(SubmissionState::Notified);
                info!(
                    submission = %submission.id,
                    maturity = score.maturity.label(),
                    degraded = submission.diagnostics.len(),
                    "assessment report delivered"
                );
            }
            Err(err) => {
                let cause = degrade(submission, PipelineStep::Email, &err);
                submission.transition(SubmissionState::PartialFailure {
                    step: PipelineStep::Email,
                    cause,
                });
            }
        }

        Ok(PipelineOutcome::new(submission, score, report))
    }

    fn ensure_awaiting_answers(submission: &Submission) -> Result<(), PipelineError> {
        match submission.state {
            SubmissionState::AwaitingAnswers => Ok(()),
            SubmissionState::AwaitingPayment => Err(PipelineError::PaymentPending),
            ref other => Err(PipelineError::AlreadyCompleted(other.label())),
        }
    }
}

fn degrade(submission: &mut Submission, step: PipelineStep, err: &CollaboratorError) -> String {
    let cause = err.to_string();
    warn!(
        submission = %submission.id,
        step = %step,
        error = %cause,
        "collaborator step degraded"
    );
    submission.record_degraded(step, cause.clone());
    cause
}

/// Result of a completed run, returned to the caller for display.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub submission_id: SubmissionId,
    #[serde(flatten)]
    pub state: SubmissionState,
    pub score: ScoreResult,
    pub report: Report,
    pub pdf_reference: Option<String>,
    pub record_id: Option<String>,
    pub degraded: Vec<StepDiagnostic>,
}

impl PipelineOutcome {
    fn new(submission: &Submission, score: ScoreResult, report: Report) -> Self {
        Self {
            submission_id: submission.id.clone(),
            state: submission.state.clone(),
            score,
            report,
            pdf_reference: submission.pdf_reference.clone(),
            record_id: submission.record_id.clone(),
            degraded: submission.diagnostics.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("an email address is required")]
    MissingEmail,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("unable to create payment link: {0}")]
    PaymentLink(#[source] CollaboratorError),
    #[error("payment has not been confirmed for this submission")]
    PaymentPending,
    #[error("submission is no longer accepting answers (state: {0})")]
    AlreadyCompleted(&'static str),
    #[error(transparent)]
    Answers(#[from] AnswerSetError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
