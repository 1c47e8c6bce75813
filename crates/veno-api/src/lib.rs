//! HTTP clients for Veno's hosted backend and third-party services.
//!
//! `client` talks to the backend REST surface with retry/backoff,
//! `billing` wraps the payment provider, `ai` wraps the key-vending
//! completion proxy. All business logic stays provider-side; these
//! clients only shape requests and parse envelopes.

pub mod ai;
pub mod billing;
pub mod client;

pub use ai::{AiConfig, CompletionClient};
pub use billing::{BillingClient, BillingConfig, CheckoutSession, PaymentStatus};
pub use client::{ApiClient, ApiConfig, BlogPost, QuestionDto, QuizSummary, RetryPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(String),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl ApiError {
    /// Transport failures and server-side errors are worth retrying;
    /// client errors and malformed bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Decode(_) | ApiError::Provider(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}
