//! AI readiness questionnaire: scoring, maturity classification and the report pipeline.

pub mod admin;
pub mod answers;
pub mod catalog;
pub mod gateways;
pub mod maturity;
pub mod pipeline;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod sessions;
pub mod submission;

#[cfg(test)]
mod tests;

pub use admin::{export_csv, AdminError, AdminView};
pub use answers::{AnswerEntry, AnswerSet, AnswerSetError};
pub use catalog::{CatalogDomainView, CatalogError, CatalogTierView, QuestionCatalog};
pub use gateways::{
    CollaboratorError, Collaborators, DocumentRenderer, MailDispatcher, ObjectStorage,
    OutboundEmail, PaymentGateway, PaymentLink, PaymentRequest, SubmissionStore, TextGenerator,
};
pub use maturity::{classify, MaturityLabel};
pub use pipeline::{AssessmentPipeline, PipelineError, PipelineOutcome, PipelineSettings};
pub use report::{assemble, sanitize_for_rendering, Report, TitleBlock};
pub use router::assessment_router;
pub use scoring::{aggregate, normalize, ResponseLabel, ScoreResult, ScoringError};
pub use service::{AssessmentService, ServiceError};
pub use sessions::{CheckedOut, SessionError, SessionRetention, SubmissionSessions};
pub use submission::{
    PaymentReference, PaymentStatus, PipelineStep, StepDiagnostic, Submission, SubmissionId,
    SubmissionRecord, SubmissionState, SubmissionStatusView, UserMeta,
};
