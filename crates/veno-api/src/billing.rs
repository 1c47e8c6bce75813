//! Payment provider client.
//!
//! Initializes checkouts and verifies references against the provider's
//! REST API. Fraud, settlement, and idempotent charge state are the
//! provider's responsibility; this client shapes requests and reads the
//! `{ status, message, data }` envelope.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub base_url: String,
    /// Provider secret key, sent as a bearer token.
    pub secret_key: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Provider plan code for subscriptions; empty for one-off charges.
    pub plan_code: String,
}

/// A checkout the user is redirected into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Charge state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
}

impl PaymentStatus {
    /// Map a provider status string; anything unrecognized stays Pending.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "success" => PaymentStatus::Success,
            "failed" => PaymentStatus::Failed,
            "abandoned" => PaymentStatus::Abandoned,
            _ => PaymentStatus::Pending,
        }
    }
}

pub struct BillingClient {
    http: reqwest::Client,
    config: BillingConfig,
}

impl BillingClient {
    pub fn new(config: BillingConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { http, config })
    }

    /// Start a checkout for `amount_minor` (smallest currency unit).
    pub async fn initialize_checkout(
        &self,
        email: &str,
        amount_minor: u64,
    ) -> Result<CheckoutSession, ApiError> {
        let url = format!(
            "{}/transaction/initialize",
            self.config.base_url.trim_end_matches('/')
        );
        let body = init_body(email, amount_minor, &self.config.currency, &self.config.plan_code);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "checkout initialization failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: serde_json::Value = response.json().await?;
        parse_init_response(&envelope)
    }

    /// Look up the charge state for a checkout reference.
    pub async fn verify(&self, reference: &str) -> Result<PaymentStatus, ApiError> {
        let url = format!(
            "{}/transaction/verify/{reference}",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: serde_json::Value = response.json().await?;
        let payment = parse_verify_response(&envelope)?;
        debug!(reference = %reference, ?payment, "verified checkout");
        Ok(payment)
    }
}

fn init_body(
    email: &str,
    amount_minor: u64,
    currency: &str,
    plan_code: &str,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "email": email,
        "amount": amount_minor,
        "currency": currency,
    });
    if !plan_code.is_empty() {
        body["plan"] = serde_json::json!(plan_code);
    }
    body
}

fn parse_init_response(envelope: &serde_json::Value) -> Result<CheckoutSession, ApiError> {
    ensure_provider_ok(envelope)?;
    let data = envelope
        .get("data")
        .ok_or_else(|| ApiError::Decode("missing data".into()))?;
    serde_json::from_value(data.clone()).map_err(|e| ApiError::Decode(e.to_string()))
}

fn parse_verify_response(envelope: &serde_json::Value) -> Result<PaymentStatus, ApiError> {
    ensure_provider_ok(envelope)?;
    let status = envelope
        .get("data")
        .and_then(|d| d.get("status"))
        .and_then(|s| s.as_str())
        .ok_or_else(|| ApiError::Decode("missing data.status".into()))?;
    Ok(PaymentStatus::from_provider(status))
}

fn ensure_provider_ok(envelope: &serde_json::Value) -> Result<(), ApiError> {
    let ok = envelope
        .get("status")
        .and_then(|s| s.as_bool())
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        let message = envelope
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("request rejected")
            .to_string();
        Err(ApiError::Provider(message))
    }
}
