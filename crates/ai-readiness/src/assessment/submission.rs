use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::report::Report;
use super::scoring::ScoreResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl SubmissionId {
    pub(crate) fn next() -> Self {
        let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("sub-{id:06}"))
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and questionnaire selection captured before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeta {
    pub name: String,
    pub company: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub domain: String,
    pub tier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    NotPaid,
    Unknown,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::NotPaid => "not_paid",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReference {
    pub method: String,
    pub link_id: String,
    pub status: PaymentStatus,
}

/// External call a submission depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Payment,
    TextGeneration,
    Rendering,
    Storage,
    Persistence,
    Email,
}

impl PipelineStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::TextGeneration => "text_generation",
            Self::Rendering => "rendering",
            Self::Storage => "storage",
            Self::Persistence => "persistence",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A collaborator step that failed and was replaced by a degraded or absent result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDiagnostic {
    pub step: PipelineStep,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    AwaitingPayment,
    AwaitingAnswers,
    Scored,
    ReportGenerated,
    Persisted,
    Notified,
    PartialFailure { step: PipelineStep, cause: String },
}

impl SubmissionState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "Awaiting Payment",
            Self::AwaitingAnswers => "Awaiting Answers",
            Self::Scored => "Scored",
            Self::ReportGenerated => "Report Generated",
            Self::Persisted => "Persisted",
            Self::Notified => "Notified",
            Self::PartialFailure { .. } => "Partial Failure",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Notified | Self::PartialFailure { .. })
    }
}

/// One user journey, passed by reference through the pipeline.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: SubmissionId,
    pub user: UserMeta,
    pub payment: PaymentReference,
    pub payment_url: String,
    pub state: SubmissionState,
    pub diagnostics: Vec<StepDiagnostic>,
    pub score: Option<ScoreResult>,
    pub report: Option<Report>,
    pub document: Option<Vec<u8>>,
    pub pdf_reference: Option<String>,
    pub record_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(user: UserMeta, payment: PaymentReference, payment_url: String) -> Self {
        Self {
            id: SubmissionId::next(),
            user,
            payment,
            payment_url,
            state: SubmissionState::AwaitingPayment,
            diagnostics: Vec::new(),
            score: None,
            report: None,
            document: None,
            pdf_reference: None,
            record_id: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn transition(&mut self, next: SubmissionState) {
        debug!(
            submission = %self.id,
            from = self.state.label(),
            to = next.label(),
            "submission state transition"
        );
        self.state = next;
    }

    pub(crate) fn record_degraded(&mut self, step: PipelineStep, cause: impl Into<String>) {
        self.diagnostics.push(StepDiagnostic {
            step,
            cause: cause.into(),
        });
    }

    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            submission_id: self.id.clone(),
            state: self.state.clone(),
            state_label: self.state.label(),
            domain: self.user.domain.clone(),
            tier: self.user.tier.clone(),
            payment_status: self.payment.status,
            payment_url: self.payment_url.clone(),
            average_score: self.score.map(|score| score.average),
            maturity: self.score.map(|score| score.maturity.label()),
            pdf_available: self.document.is_some(),
            pdf_reference: self.pdf_reference.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatusView {
    pub submission_id: SubmissionId,
    #[serde(flatten)]
    pub state: SubmissionState,
    pub state_label: &'static str,
    pub domain: String,
    pub tier: String,
    pub payment_status: PaymentStatus,
    pub payment_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity: Option<&'static str>,
    pub pdf_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_reference: Option<String>,
}

/// Append-only audit entry written once to the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission_id: SubmissionId,
    pub user: UserMeta,
    pub score: ScoreResult,
    pub report_text: String,
    pub pdf_reference: Option<String>,
    pub payment: PaymentReference,
    #[serde(default)]
    pub degraded_steps: Vec<StepDiagnostic>,
    pub created_at: DateTime<Utc>,
}

/// Object key for the rendered report: `reports/{email}_{utc timestamp}.pdf`.
pub fn storage_key(email: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
        .replace(':', "-");
    format!("reports/{email}_{timestamp}.pdf")
}
