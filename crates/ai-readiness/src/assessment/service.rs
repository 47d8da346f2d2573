use serde::Serialize;

use super::admin::{export_csv, AdminError, AdminView};
use super::answers::AnswerEntry;
use super::pipeline::{AssessmentPipeline, PipelineError, PipelineOutcome};
use super::scoring::ResponseLabel;
use super::sessions::{SessionError, SessionRetention, SubmissionSessions};
use super::submission::{
    PaymentStatus, Submission, SubmissionId, SubmissionRecord, SubmissionStatusView, UserMeta,
};

/// Pipeline plus the session registry and admin gate a hosting process needs.
#[derive(Debug)]
pub struct AssessmentService {
    pipeline: AssessmentPipeline,
    sessions: SubmissionSessions,
    admin: AdminView,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireView {
    pub submission_id: SubmissionId,
    pub domain: String,
    pub tier: String,
    pub questions: Vec<QuestionView>,
    pub responses: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentCheckView {
    pub submission_id: SubmissionId,
    pub payment_status: PaymentStatus,
    pub state_label: &'static str,
}

impl AssessmentService {
    pub fn new(pipeline: AssessmentPipeline, admin: AdminView) -> Self {
        Self {
            pipeline,
            sessions: SubmissionSessions::default(),
            admin,
        }
    }

    /// Replace the default bound on finished submissions kept for status and download.
    pub fn with_session_retention(mut self, retention: SessionRetention) -> Self {
        self.sessions = SubmissionSessions::with_retention(retention);
        self
    }

    pub fn pipeline(&self) -> &AssessmentPipeline {
        &self.pipeline
    }

    pub fn begin(&self, user: UserMeta) -> Result<SubmissionStatusView, ServiceError> {
        let submission = self.pipeline.begin(user)?;
        let view = submission.status_view();
        self.sessions.insert(submission);
        Ok(view)
    }

    pub fn status(&self, id: &SubmissionId) -> Result<SubmissionStatusView, ServiceError> {
        Ok(self.sessions.snapshot(id)?.status_view())
    }

    pub fn verify_payment(&self, id: &SubmissionId) -> Result<PaymentCheckView, ServiceError> {
        let mut submission = self.sessions.checkout(id)?;
        let payment_status = self.pipeline.verify_payment(&mut submission);
        Ok(PaymentCheckView {
            submission_id: submission.id.clone(),
            payment_status,
            state_label: submission.state.label(),
        })
    }

    pub fn questionnaire(&self, id: &SubmissionId) -> Result<QuestionnaireView, ServiceError> {
        let submission = self.sessions.snapshot(id)?;
        let questions = self
            .pipeline
            .questions(&submission)?
            .iter()
            .enumerate()
            .map(|(index, prompt)| QuestionView {
                index,
                prompt: prompt.clone(),
            })
            .collect();

        Ok(QuestionnaireView {
            submission_id: submission.id,
            domain: submission.user.domain,
            tier: submission.user.tier,
            questions,
            responses: ResponseLabel::ordered()
                .into_iter()
                .map(ResponseLabel::label)
                .collect(),
        })
    }

    pub fn submit_answers(
        &self,
        id: &SubmissionId,
        entries: Vec<AnswerEntry>,
    ) -> Result<PipelineOutcome, ServiceError> {
        let mut submission = self.sessions.checkout(id)?;
        Ok(self.pipeline.complete(&mut submission, entries)?)
    }

    /// Rendered PDF bytes, once the pipeline has produced them.
    pub fn document(&self, id: &SubmissionId) -> Result<Vec<u8>, ServiceError> {
        let submission: Submission = self.sessions.snapshot(id)?;
        submission
            .document
            .ok_or_else(|| ServiceError::DocumentUnavailable(id.clone()))
    }

    pub fn admin_records(&self, admin_email: &str) -> Result<Vec<SubmissionRecord>, ServiceError> {
        let store = self.pipeline.collaborators().store.as_ref();
        Ok(self.admin.list(store, admin_email)?)
    }

    pub fn admin_csv(&self, admin_email: &str) -> Result<String, ServiceError> {
        let records = self.admin_records(admin_email)?;
        Ok(export_csv(&records)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error("no rendered report is available for submission {0}")]
    DocumentUnavailable(SubmissionId),
}
