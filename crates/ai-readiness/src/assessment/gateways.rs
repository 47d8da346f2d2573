//! Narrow interfaces to the external systems the pipeline depends on.
//!
//! Every adapter translates its provider's response shape into the types below so that
//! nothing provider-specific leaks into the assessment core.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::report::Report;
use super::submission::{PaymentStatus, SubmissionRecord, UserMeta};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount_minor_units: u32,
    pub currency: String,
    pub description: String,
    pub payer: UserMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub link_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

pub trait PaymentGateway: Debug + Send + Sync {
    /// Name recorded as the payment method on submission records.
    fn method(&self) -> &'static str;
    fn create_payment_link(&self, request: &PaymentRequest)
        -> Result<PaymentLink, CollaboratorError>;
    fn payment_status(&self, link_id: &str) -> Result<PaymentStatus, CollaboratorError>;
}

pub trait TextGenerator: Debug + Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

pub trait DocumentRenderer: Debug + Send + Sync {
    fn render(&self, report: &Report) -> Result<Vec<u8>, CollaboratorError>;
}

pub trait ObjectStorage: Debug + Send + Sync {
    /// Upload bytes under `key`, returning a URL or reference to the stored object.
    fn upload(&self, key: &str, bytes: &[u8], content_type: &str)
        -> Result<String, CollaboratorError>;
}

pub trait SubmissionStore: Debug + Send + Sync {
    /// Append one record, returning its identifier.
    fn append(&self, record: &SubmissionRecord) -> Result<String, CollaboratorError>;
    fn list(&self) -> Result<Vec<SubmissionRecord>, CollaboratorError>;
}

pub trait MailDispatcher: Debug + Send + Sync {
    fn send(&self, email: &OutboundEmail) -> Result<(), CollaboratorError>;
}

/// The full set of collaborators a pipeline is wired with.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub payments: Arc<dyn PaymentGateway>,
    pub text: Arc<dyn TextGenerator>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub store: Arc<dyn SubmissionStore>,
    pub mail: Arc<dyn MailDispatcher>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::InvalidResponse(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(value: std::io::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}
