use crate::infra::{load_catalog, InMemorySubmissionStore};
use ai_readiness::assessment::{
    AdminView, AnswerEntry, AssessmentPipeline, AssessmentService, CollaboratorError,
    Collaborators, MailDispatcher, ObjectStorage, OutboundEmail, PaymentGateway, PaymentLink,
    PaymentRequest, PaymentStatus, PipelineSettings, ResponseLabel, TextGenerator, UserMeta,
};
use ai_readiness::error::AppError;
use ai_readiness::integrations::PdfRenderer;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const DEMO_ADMIN: &str = "demo-admin@taicc.co";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Where to write the rendered PDF report
    #[arg(long, default_value = "ai-readiness-demo.pdf")]
    pub(crate) output: PathBuf,
    #[arg(long, default_value = "Financial Services")]
    pub(crate) domain: String,
    #[arg(long, default_value = "Tier 3")]
    pub(crate) tier: String,
    /// Optional JSON question catalog
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        output,
        domain,
        tier,
        catalog,
    } = args;

    let catalog = load_catalog(catalog.as_deref())?;
    let outbox = Arc::new(DemoOutbox::default());
    let collaborators = Collaborators {
        payments: Arc::new(InstantPayments),
        text: Arc::new(CannedNarrative),
        renderer: Arc::new(PdfRenderer::a4()),
        storage: Arc::new(LocalFileStorage {
            path: output.clone(),
        }),
        store: Arc::new(InMemorySubmissionStore::default()),
        mail: outbox.clone(),
    };
    let pipeline = AssessmentPipeline::new(
        Arc::new(catalog),
        collaborators,
        PipelineSettings::default(),
    );
    let service = AssessmentService::new(pipeline, AdminView::new([DEMO_ADMIN]));

    println!("AI readiness assessment demo (offline collaborators)");
    let user = UserMeta {
        name: "Demo Participant".to_string(),
        company: "Example Holdings".to_string(),
        email: "participant@example.com".to_string(),
        phone: String::new(),
        domain,
        tier,
    };
    let started = service.begin(user)?;
    println!(
        "- Submission {} created | payment link {}",
        started.submission_id, started.payment_url
    );

    let payment = service.verify_payment(&started.submission_id)?;
    println!(
        "- Payment {} -> {}",
        payment.payment_status.label(),
        payment.state_label
    );

    let questionnaire = service.questionnaire(&started.submission_id)?;
    let scale = ResponseLabel::ordered();
    let answers: Vec<AnswerEntry> = questionnaire
        .questions
        .iter()
        .map(|question| {
            let response = scale[(question.index + 2) % scale.len()];
            println!("  [{}] {}", response.score(), question.prompt);
            AnswerEntry::new(question.index, response.label())
        })
        .collect();

    let outcome = service.submit_answers(&started.submission_id, answers)?;
    println!(
        "- Average score {:.2} -> {}",
        outcome.score.average, outcome.report.maturity_headline
    );
    println!("  Headline: {}", outcome.report.headline);
    match &outcome.pdf_reference {
        Some(reference) => println!("- Report written to {reference}"),
        None => println!("- Report could not be written to {}", output.display()),
    }
    for diagnostic in &outcome.degraded {
        println!("  Degraded {}: {}", diagnostic.step, diagnostic.cause);
    }
    for email in outbox.sent() {
        println!(
            "- Email queued for {} ({} bytes attached as {})",
            email.recipient,
            email.attachment.len(),
            email.attachment_name
        );
    }

    let records = service.admin_records(DEMO_ADMIN)?;
    println!("- Admin view lists {} submission(s)", records.len());
    Ok(())
}

#[derive(Debug)]
struct InstantPayments;

impl PaymentGateway for InstantPayments {
    fn method(&self) -> &'static str {
        "demo"
    }

    fn create_payment_link(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, CollaboratorError> {
        Ok(PaymentLink {
            link_id: "plink_demo".to_string(),
            url: format!(
                "https://payments.invalid/demo?amount={}&currency={}",
                request.amount_minor_units, request.currency
            ),
        })
    }

    fn payment_status(&self, _link_id: &str) -> Result<PaymentStatus, CollaboratorError> {
        Ok(PaymentStatus::Paid)
    }
}

#[derive(Debug)]
struct CannedNarrative;

impl TextGenerator for CannedNarrative {
    fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let maturity = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Maturity level: "))
            .unwrap_or("your current level");
        Ok(format!(
            "You are operating at the {maturity} stage\n\
             Executive summary: the organisation has early building blocks in place.\n\n\
             Key weaknesses: data ownership is unclear and pilots lack success metrics.\n\n\
             Recommendations: appoint a data owner per domain, select two measurable use \
             cases and fund a twelve-week pilot.\n\n\
             Next step: book a readiness workshop with the TAICC team."
        ))
    }
}

#[derive(Debug)]
struct LocalFileStorage {
    path: PathBuf,
}

impl ObjectStorage for LocalFileStorage {
    fn upload(
        &self,
        _key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, CollaboratorError> {
        fs::write(&self.path, bytes)?;
        Ok(self.path.display().to_string())
    }
}

#[derive(Debug, Default)]
struct DemoOutbox {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl DemoOutbox {
    fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("outbox mutex poisoned").clone()
    }
}

impl MailDispatcher for DemoOutbox {
    fn send(&self, email: &OutboundEmail) -> Result<(), CollaboratorError> {
        self.sent
            .lock()
            .expect("outbox mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_writes_pdf_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("report.pdf");

        run_demo(DemoArgs {
            output: output.clone(),
            domain: "Education".to_string(),
            tier: "Tier 2".to_string(),
            catalog: None,
        })
        .expect("demo runs");

        let bytes = fs::read(&output).expect("report written");
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(String::from_utf8_lossy(&bytes).contains("AI Maturity Level"));
    }

    #[test]
    fn demo_rejects_unknown_tier() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run_demo(DemoArgs {
            output: dir.path().join("report.pdf"),
            domain: "Education".to_string(),
            tier: "Tier 12".to_string(),
            catalog: None,
        });
        assert!(matches!(result, Err(AppError::Assessment(_))));
    }

    #[test]
    fn canned_narrative_names_maturity() {
        let text = CannedNarrative
            .generate("Overall numeric score: 3.00\nMaturity level: Established\n")
            .expect("text");
        assert!(text.starts_with("You are operating at the Established stage"));
    }
}
