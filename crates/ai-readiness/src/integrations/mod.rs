//! Adapters binding the assessment collaborator traits to concrete providers.

pub mod gemini;
pub mod pdf;
pub mod razorpay;
pub mod sendgrid;
pub mod storage;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::warn;

use crate::assessment::gateways::{
    CollaboratorError, Collaborators, DocumentRenderer, MailDispatcher, ObjectStorage,
    OutboundEmail, PaymentGateway, PaymentLink, PaymentRequest, SubmissionStore, TextGenerator,
};
use crate::assessment::report::Report;
use crate::assessment::submission::{PaymentStatus, SubmissionRecord};
use crate::config::IntegrationConfig;

pub use gemini::GeminiTextGenerator;
pub use pdf::PdfRenderer;
pub use razorpay::RazorpayGateway;
pub use sendgrid::SendGridMailer;
pub use storage::CloudStorageBucket;
pub use store::{JsonlSubmissionStore, StoreError};

const USER_AGENT: &str = concat!("ai-readiness/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 512;

/// Wire the provider adapters for every collaborator with credentials, falling back to
/// [`Unconfigured`] for the rest.
pub fn build_collaborators(
    config: &IntegrationConfig,
    store: Arc<dyn SubmissionStore>,
) -> Collaborators {
    let payments: Arc<dyn PaymentGateway> = match &config.razorpay {
        Some(razorpay) => Arc::new(RazorpayGateway::new(razorpay.clone())),
        None => Arc::new(unconfigured("payment gateway")),
    };
    let text: Arc<dyn TextGenerator> = match &config.gemini {
        Some(gemini) => Arc::new(GeminiTextGenerator::new(gemini.clone())),
        None => Arc::new(unconfigured("text generator")),
    };
    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        Some(storage) => Arc::new(CloudStorageBucket::new(storage.clone())),
        None => Arc::new(unconfigured("object storage")),
    };
    let mail: Arc<dyn MailDispatcher> = match &config.sendgrid {
        Some(sendgrid) => Arc::new(SendGridMailer::new(sendgrid.clone())),
        None => Arc::new(unconfigured("mail dispatcher")),
    };

    Collaborators {
        payments,
        text,
        renderer: Arc::new(PdfRenderer::a4()),
        storage,
        store,
        mail,
    }
}

fn unconfigured(collaborator: &'static str) -> Unconfigured {
    warn!(collaborator, "credentials missing; calls will degrade");
    Unconfigured::new(collaborator)
}

/// Stand-in for a collaborator whose credentials are missing. Every call fails with
/// [`CollaboratorError::NotConfigured`].
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured {
    collaborator: &'static str,
}

impl Unconfigured {
    pub const fn new(collaborator: &'static str) -> Self {
        Self { collaborator }
    }

    fn fail<T>(&self) -> Result<T, CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.collaborator))
    }
}

impl PaymentGateway for Unconfigured {
    fn method(&self) -> &'static str {
        "unconfigured"
    }

    fn create_payment_link(
        &self,
        _request: &PaymentRequest,
    ) -> Result<PaymentLink, CollaboratorError> {
        self.fail()
    }

    fn payment_status(&self, _link_id: &str) -> Result<PaymentStatus, CollaboratorError> {
        self.fail()
    }
}

impl TextGenerator for Unconfigured {
    fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
        self.fail()
    }
}

impl DocumentRenderer for Unconfigured {
    fn render(&self, _report: &Report) -> Result<Vec<u8>, CollaboratorError> {
        self.fail()
    }
}

impl ObjectStorage for Unconfigured {
    fn upload(
        &self,
        _key: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, CollaboratorError> {
        self.fail()
    }
}

impl SubmissionStore for Unconfigured {
    fn append(&self, _record: &SubmissionRecord) -> Result<String, CollaboratorError> {
        self.fail()
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, CollaboratorError> {
        self.fail()
    }
}

impl MailDispatcher for Unconfigured {
    fn send(&self, _email: &OutboundEmail) -> Result<(), CollaboratorError> {
        self.fail()
    }
}

/// Blocking client built per call so it never outlives the worker thread that uses it.
pub(crate) fn http_client() -> Result<Client, CollaboratorError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Turn a non-2xx response into [`CollaboratorError::Rejected`] with a truncated body.
pub(crate) fn ensure_success(response: Response) -> Result<Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(CollaboratorError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, IntegrationConfig};
    use crate::integrations::store::JsonlSubmissionStore;

    #[test]
    fn unconfigured_collaborators_fail_with_their_name() {
        let store = Arc::new(Unconfigured::new("submission store"));
        let collaborators = build_collaborators(&IntegrationConfig::default(), store);

        let err = collaborators.text.generate("prompt").expect_err("no key");
        assert_eq!(err.to_string(), "text generator is not configured");
        assert!(matches!(
            collaborators.payments.payment_status("plink_1"),
            Err(CollaboratorError::NotConfigured("payment gateway"))
        ));
        assert!(matches!(
            collaborators.store.list(),
            Err(CollaboratorError::NotConfigured("submission store"))
        ));
        assert_eq!(collaborators.payments.method(), "unconfigured");
    }

    #[test]
    fn configured_collaborators_use_provider_adapters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(JsonlSubmissionStore::new(dir.path().join("records.jsonl")));
        let config = IntegrationConfig {
            gemini: Some(GeminiConfig {
                api_key: "key".to_string(),
                model: "gemini-1.5-flash".to_string(),
            }),
            ..IntegrationConfig::default()
        };

        let collaborators = build_collaborators(&config, store);

        assert!(format!("{:?}", collaborators.text).contains("GeminiTextGenerator"));
        assert!(collaborators.store.list().expect("empty store").is_empty());
    }
}
