use serde::Serialize;

use super::gateways::{CollaboratorError, SubmissionStore};
use super::submission::SubmissionRecord;

/// Read-only view over stored submissions, gated by an email allow-list.
#[derive(Debug, Clone, Default)]
pub struct AdminView {
    allow_list: Vec<String>,
}

impl AdminView {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allow_list = emails
            .into_iter()
            .map(|email| email.as_ref().trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        Self { allow_list }
    }

    pub fn is_authorized(&self, email: &str) -> bool {
        let candidate = email.trim().to_ascii_lowercase();
        !candidate.is_empty() && self.allow_list.iter().any(|allowed| *allowed == candidate)
    }

    /// All stored records, newest first.
    pub fn list(
        &self,
        store: &dyn SubmissionStore,
        admin_email: &str,
    ) -> Result<Vec<SubmissionRecord>, AdminError> {
        if !self.is_authorized(admin_email) {
            return Err(AdminError::Forbidden);
        }

        let mut records = store.list()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[derive(Debug, Serialize)]
struct SubmissionCsvRow<'a> {
    submission_id: &'a str,
    created_at: String,
    name: &'a str,
    company: &'a str,
    email: &'a str,
    phone: &'a str,
    domain: &'a str,
    tier: &'a str,
    average_score: f64,
    maturity: &'static str,
    pdf_reference: &'a str,
    payment_method: &'a str,
    payment_link_id: &'a str,
    payment_status: &'static str,
    degraded_steps: String,
}

impl<'a> From<&'a SubmissionRecord> for SubmissionCsvRow<'a> {
    fn from(record: &'a SubmissionRecord) -> Self {
        Self {
            submission_id: &record.submission_id.0,
            created_at: record.created_at.to_rfc3339(),
            name: &record.user.name,
            company: &record.user.company,
            email: &record.user.email,
            phone: &record.user.phone,
            domain: &record.user.domain,
            tier: &record.user.tier,
            average_score: record.score.average,
            maturity: record.score.maturity.label(),
            pdf_reference: record.pdf_reference.as_deref().unwrap_or(""),
            payment_method: &record.payment.method,
            payment_link_id: &record.payment.link_id,
            payment_status: record.payment.status.label(),
            degraded_steps: record
                .degraded_steps
                .iter()
                .map(|diagnostic| diagnostic.step.label())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Flatten records into CSV with a header row.
pub fn export_csv(records: &[SubmissionRecord]) -> Result<String, AdminError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(SubmissionCsvRow::from(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| AdminError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| AdminError::Export(err.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("email is not on the admin allow-list")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] CollaboratorError),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Export(String),
}
