//! AI completion client.
//!
//! Completions flow through a key-vending edge function: the client first
//! fetches a short-lived API key, then posts a chat completion request.
//! No prompting pipeline or orchestration lives here.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Edge function that vends a short-lived completion API key.
    pub key_endpoint: String,
    pub completion_url: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct VendedKey {
    key: String,
}

pub struct CompletionClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl CompletionClient {
    pub fn new(config: AiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    /// Ask for an explanation of why `correct_option` answers `question`.
    pub async fn explain_answer(
        &self,
        question: &str,
        correct_option: &str,
    ) -> Result<String, ApiError> {
        self.complete(&explanation_prompt(question, correct_option))
            .await
    }

    /// Run one completion round trip.
    pub async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        let key = self.fetch_key().await?;
        let body = completion_body(&self.config.model, prompt, self.config.max_tokens);

        let response = self
            .http
            .post(&self.config.completion_url)
            .bearer_auth(&key)
            .json(&body)
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
        let text = parse_completion(&envelope)?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }

    async fn fetch_key(&self) -> Result<String, ApiError> {
        let response = self.http.get(&self.config.key_endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let vended: VendedKey = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(vended.key)
    }
}

fn explanation_prompt(question: &str, correct_option: &str) -> String {
    format!(
        "Explain briefly, for a student, why \"{correct_option}\" is the correct \
         answer to the question: {question}"
    )
}

fn completion_body(model: &str, prompt: &str, max_tokens: u32) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "max_tokens": max_tokens,
    })
}

fn parse_completion(envelope: &serde_json::Value) -> Result<String, ApiError> {
    envelope
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode("no completion choices".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_body_shape() {
        let body = completion_body("gpt-4o-mini", "why is the sky blue", 512);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "why is the sky blue");
    }

    #[test]
    fn explanation_prompt_mentions_both_parts() {
        let prompt = explanation_prompt("2 + 2?", "4");
        assert!(prompt.contains("2 + 2?"));
        assert!(prompt.contains("\"4\""));
    }

    #[test]
    fn parse_completion_extracts_first_choice() {
        let envelope = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Because addition." } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(parse_completion(&envelope).unwrap(), "Because addition.");
    }

    #[test]
    fn parse_completion_without_choices_fails() {
        let envelope = serde_json::json!({ "choices": [] });
        let err = parse_completion(&envelope).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn vended_key_deserializes() {
        let vended: VendedKey = serde_json::from_str(r#"{ "key": "sk-short-lived" }"#).unwrap();
        assert_eq!(vended.key, "sk-short-lived");
    }
}
