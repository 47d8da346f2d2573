use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::assessment::admin::AdminView;
use crate::assessment::answers::AnswerEntry;
use crate::assessment::catalog::QuestionCatalog;
use crate::assessment::gateways::{
    CollaboratorError, Collaborators, DocumentRenderer, MailDispatcher, ObjectStorage,
    OutboundEmail, PaymentGateway, PaymentLink, PaymentRequest, SubmissionStore, TextGenerator,
};
use crate::assessment::pipeline::{AssessmentPipeline, PipelineSettings};
use crate::assessment::report::Report;
use crate::assessment::service::AssessmentService;
use crate::assessment::submission::{PaymentStatus, SubmissionRecord, UserMeta};

pub(super) const ADMIN_EMAIL: &str = "ops@taicc.co";
pub(super) const NARRATIVE: &str =
    "Solid foundations in place\nInvest in data governance before scaling pilots.";

pub(super) fn user() -> UserMeta {
    UserMeta {
        name: "Priya Raman".to_string(),
        company: "Lotus Clinics".to_string(),
        email: "priya@lotus.example".to_string(),
        phone: "+91 98450 00000".to_string(),
        domain: "Healthcare".to_string(),
        tier: "Tier 2".to_string(),
    }
}

pub(super) fn answers(responses: &[&str]) -> Vec<AnswerEntry> {
    responses
        .iter()
        .enumerate()
        .map(|(index, response)| AnswerEntry::new(index, *response))
        .collect()
}

pub(super) fn uniform_answers(response: &str) -> Vec<AnswerEntry> {
    answers(&[response; 5])
}

#[derive(Debug)]
pub(super) struct FakePayments {
    status: Mutex<Result<PaymentStatus, String>>,
    link_failure: Option<String>,
    pub(super) requests: Mutex<Vec<PaymentRequest>>,
}

impl Default for FakePayments {
    fn default() -> Self {
        Self {
            status: Mutex::new(Ok(PaymentStatus::Paid)),
            link_failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakePayments {
    pub(super) fn rejecting_links() -> Self {
        Self {
            link_failure: Some("gateway offline".to_string()),
            ..Self::default()
        }
    }

    pub(super) fn set_status(&self, status: Result<PaymentStatus, String>) {
        *self.status.lock().expect("payments mutex poisoned") = status;
    }
}

impl PaymentGateway for FakePayments {
    fn method(&self) -> &'static str {
        "fake"
    }

    fn create_payment_link(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, CollaboratorError> {
        if let Some(message) = &self.link_failure {
            return Err(CollaboratorError::Unavailable(message.clone()));
        }
        let mut requests = self.requests.lock().expect("payments mutex poisoned");
        requests.push(request.clone());
        Ok(PaymentLink {
            link_id: format!("plink_{}", requests.len()),
            url: format!("https://pay.example/plink_{}", requests.len()),
        })
    }

    fn payment_status(&self, _link_id: &str) -> Result<PaymentStatus, CollaboratorError> {
        self.status
            .lock()
            .expect("payments mutex poisoned")
            .clone()
            .map_err(CollaboratorError::Transport)
    }
}

#[derive(Debug)]
pub(super) struct FakeText {
    reply: Result<String, String>,
    panics: bool,
    pub(super) prompts: Mutex<Vec<String>>,
}

impl FakeText {
    pub(super) fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            panics: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            panics: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn panicking() -> Self {
        Self {
            reply: Err("unreachable".to_string()),
            panics: true,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for FakeText {
    fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.prompts
            .lock()
            .expect("text mutex poisoned")
            .push(prompt.to_string());
        if self.panics {
            panic!("text generator crashed");
        }
        self.reply.clone().map_err(CollaboratorError::Unavailable)
    }
}

#[derive(Debug, Default)]
pub(super) struct FakeRenderer {
    fail: bool,
}

impl FakeRenderer {
    pub(super) fn failing() -> Self {
        Self { fail: true }
    }
}

impl DocumentRenderer for FakeRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("font missing".to_string()));
        }
        Ok(format!("%PDF-fake {}", report.maturity_headline).into_bytes())
    }
}

#[derive(Debug, Default)]
pub(super) struct FakeStorage {
    fail: bool,
    pub(super) uploads: Mutex<Vec<(String, String)>>,
}

impl FakeStorage {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl ObjectStorage for FakeStorage {
    fn upload(
        &self,
        key: &str,
        _bytes: &[u8],
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected {
                status: 403,
                message: "bucket denied".to_string(),
            });
        }
        self.uploads
            .lock()
            .expect("storage mutex poisoned")
            .push((key.to_string(), content_type.to_string()));
        Ok(format!("https://storage.example/{key}"))
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryStore {
    fail: bool,
    records: Mutex<Vec<SubmissionRecord>>,
}

impl MemoryStore {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

impl SubmissionStore for MemoryStore {
    fn append(&self, record: &SubmissionRecord) -> Result<String, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("store offline".to_string()));
        }
        let mut records = self.records.lock().expect("store mutex poisoned");
        records.push(record.clone());
        Ok(format!("rec-{}", records.len()))
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("store offline".to_string()));
        }
        Ok(self.records())
    }
}

#[derive(Debug, Default)]
pub(super) struct FakeMail {
    fail: bool,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl FakeMail {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mail mutex poisoned").clone()
    }
}

impl MailDispatcher for FakeMail {
    fn send(&self, email: &OutboundEmail) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Rejected {
                status: 401,
                message: "bad api key".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("mail mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

/// Fakes kept behind `Arc` so tests can inspect them after wiring.
#[derive(Debug, Clone)]
pub(super) struct Harness {
    pub(super) payments: Arc<FakePayments>,
    pub(super) text: Arc<FakeText>,
    pub(super) renderer: Arc<FakeRenderer>,
    pub(super) storage: Arc<FakeStorage>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) mail: Arc<FakeMail>,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            payments: Arc::new(FakePayments::default()),
            text: Arc::new(FakeText::replying(NARRATIVE)),
            renderer: Arc::new(FakeRenderer::default()),
            storage: Arc::new(FakeStorage::default()),
            store: Arc::new(MemoryStore::default()),
            mail: Arc::new(FakeMail::default()),
        }
    }
}

impl Harness {
    pub(super) fn collaborators(&self) -> Collaborators {
        Collaborators {
            payments: self.payments.clone(),
            text: self.text.clone(),
            renderer: self.renderer.clone(),
            storage: self.storage.clone(),
            store: self.store.clone(),
            mail: self.mail.clone(),
        }
    }

    pub(super) fn pipeline(&self) -> AssessmentPipeline {
        self.pipeline_with_catalog(QuestionCatalog::standard())
    }

    pub(super) fn pipeline_with_catalog(&self, catalog: QuestionCatalog) -> AssessmentPipeline {
        AssessmentPipeline::new(
            Arc::new(catalog),
            self.collaborators(),
            PipelineSettings::default(),
        )
    }

    pub(super) fn service(&self) -> AssessmentService {
        AssessmentService::new(self.pipeline(), AdminView::new([ADMIN_EMAIL]))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
