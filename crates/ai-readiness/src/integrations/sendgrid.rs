use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use super::{ensure_success, http_client};
use crate::assessment::gateways::{CollaboratorError, MailDispatcher, OutboundEmail};
use crate::config::SendGridConfig;

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com/v3";

/// Mail Send v3 client; the report travels as a base64 PDF attachment.
#[derive(Clone)]
pub struct SendGridMailer {
    config: SendGridConfig,
    base_url: String,
}

impl fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridMailer")
            .field("sender", &self.config.sender)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SendGridMailer {
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl MailDispatcher for SendGridMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), CollaboratorError> {
        let response = http_client()?
            .post(format!("{}/mail/send", self.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&message_body(&self.config.sender, email))
            .send()?;
        ensure_success(response)?;
        Ok(())
    }
}

fn message_body(sender: &str, email: &OutboundEmail) -> Value {
    json!({
        "personalizations": [ { "to": [ { "email": email.recipient } ] } ],
        "from": { "email": sender },
        "subject": email.subject,
        "content": [ { "type": "text/html", "value": email.html_body } ],
        "attachments": [
            {
                "content": STANDARD.encode(&email.attachment),
                "type": "application/pdf",
                "filename": email.attachment_name,
                "disposition": "attachment",
            }
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_encoded_attachment() {
        let email = OutboundEmail {
            recipient: "priya@lotus.example".to_string(),
            subject: "Your TAICC AI Readiness Report".to_string(),
            html_body: "<p>Attached.</p>".to_string(),
            attachment_name: "TAICC_AI_Readiness_Report.pdf".to_string(),
            attachment: b"%PDF-1.4".to_vec(),
        };

        let body = message_body("reports@taicc.co", &email);

        assert_eq!(body["from"]["email"], "reports@taicc.co");
        assert_eq!(
            body["personalizations"][0]["to"][0]["email"],
            "priya@lotus.example"
        );
        assert_eq!(body["content"][0]["type"], "text/html");
        assert_eq!(body["attachments"][0]["content"], "JVBERi0xLjQ=");
        assert_eq!(
            body["attachments"][0]["filename"],
            "TAICC_AI_Readiness_Report.pdf"
        );
        assert_eq!(body["attachments"][0]["disposition"], "attachment");
    }
}
