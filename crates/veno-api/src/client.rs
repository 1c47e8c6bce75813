//! Backend data client.
//!
//! Read-only fetches against the hosted REST surface (quizzes, questions,
//! blog posts) with exponential-backoff retries. Server-side failures and
//! transport errors are retried up to the configured attempt count; 4xx
//! responses fail immediately.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.veno.app".into(),
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 250,
        }
    }
}

/// Exponential backoff schedule for failed fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based): base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor)
    }
}

/// A quiz as listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub question_count: u32,
    #[serde(default)]
    pub premium: bool,
}

/// A question as served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDto {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// A published blog post summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub published_at: String,
}

/// Client for the backend REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
        })
    }

    /// List quizzes, optionally filtered by subject.
    pub async fn fetch_quizzes(
        &self,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QuizSummary>, ApiError> {
        self.get_json(&quizzes_path(subject, limit)).await
    }

    /// Fetch the questions of one quiz.
    pub async fn fetch_questions(&self, quiz_id: &str) -> Result<Vec<QuestionDto>, ApiError> {
        self.get_json(&format!("quizzes/{quiz_id}/questions")).await
    }

    /// List recent blog posts.
    pub async fn fetch_posts(&self, limit: usize) -> Result<Vec<BlogPost>, ApiError> {
        self.get_json(&format!("posts?limit={limit}")).await
    }

    /// GET a JSON document, retrying transient failures with backoff.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempt: u32 = 0;
        loop {
            match self.get_once(&url).await {
                Ok(value) => {
                    return serde_json::from_value(value)
                        .map_err(|e| ApiError::Decode(e.to_string()));
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(url = %url, "fetch ok");
        Ok(response.json().await?)
    }
}

fn quizzes_path(subject: Option<&str>, limit: usize) -> String {
    match subject {
        Some(subject) => format!("quizzes?limit={limit}&subject={subject}"),
        None => format!("quizzes?limit={limit}"),
    }
}
