use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ensure_success, http_client};
use crate::assessment::gateways::{CollaboratorError, PaymentGateway, PaymentLink, PaymentRequest};
use crate::assessment::submission::PaymentStatus;
use crate::config::RazorpayConfig;

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com/v1";

/// Payment Links API client.
#[derive(Clone)]
pub struct RazorpayGateway {
    config: RazorpayConfig,
    base_url: String,
}

impl fmt::Debug for RazorpayGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RazorpayGateway")
            .field("key_id", &self.config.key_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PaymentLinkResponse {
    id: String,
    #[serde(default)]
    short_url: Option<String>,
    #[serde(default)]
    long_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn fetch_link(&self, link_id: &str) -> Result<PaymentLinkResponse, CollaboratorError> {
        let response = http_client()?
            .get(format!("{}/payment_links/{link_id}", self.base_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()?;
        Ok(ensure_success(response)?.json()?)
    }
}

impl PaymentGateway for RazorpayGateway {
    fn method(&self) -> &'static str {
        "razorpay"
    }

    fn create_payment_link(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, CollaboratorError> {
        let response = http_client()?
            .post(format!("{}/payment_links", self.base_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&link_payload(request))
            .send()?;
        let created: PaymentLinkResponse = ensure_success(response)?.json()?;
        debug!(link_id = %created.id, "razorpay payment link created");
        into_link(created)
    }

    fn payment_status(&self, link_id: &str) -> Result<PaymentStatus, CollaboratorError> {
        let link = self.fetch_link(link_id)?;
        Ok(link
            .status
            .as_deref()
            .map_or(PaymentStatus::Unknown, status_from_provider))
    }
}

fn link_payload(request: &PaymentRequest) -> Value {
    let payer = &request.payer;
    let name = if payer.name.trim().is_empty() {
        "Participant"
    } else {
        payer.name.as_str()
    };

    json!({
        "amount": request.amount_minor_units,
        "currency": request.currency,
        "accept_partial": false,
        "description": request.description,
        "customer": {
            "name": name,
            "email": payer.email,
            "contact": payer.phone,
        },
        "notify": { "sms": false, "email": true },
        "reminder_enable": true,
    })
}

fn into_link(response: PaymentLinkResponse) -> Result<PaymentLink, CollaboratorError> {
    let url = response
        .short_url
        .filter(|url| !url.is_empty())
        .or(response.long_url.filter(|url| !url.is_empty()))
        .ok_or_else(|| {
            CollaboratorError::InvalidResponse(format!(
                "payment link {} has no url",
                response.id
            ))
        })?;
    Ok(PaymentLink {
        link_id: response.id,
        url,
    })
}

/// Only a `paid` link counts as paid; unrecognised statuses are not trusted.
fn status_from_provider(status: &str) -> PaymentStatus {
    match status {
        "paid" => PaymentStatus::Paid,
        "created" | "partially_paid" | "expired" | "cancelled" => PaymentStatus::NotPaid,
        _ => PaymentStatus::Unknown,
    }
}
