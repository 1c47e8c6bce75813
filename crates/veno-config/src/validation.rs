//! Configuration validation.
//!
//! Validates numeric ranges and string formats across all sections,
//! collecting every failure into a single `ConfigError`.

use crate::schema::VenoConfig;
use veno_common::ConfigError;

const LOG_LEVELS: [&str; 4] = ["DEBUG", "INFO", "WARNING", "ERROR"];

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &VenoConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_presence(&mut errors, config);
    validate_api(&mut errors, config);
    validate_billing(&mut errors, config);
    validate_ai(&mut errors, config);
    validate_cbt(&mut errors, config);
    validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn check_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} must be between {min} and {max}, got {value}"));
    }
}

fn check_http_url(errors: &mut Vec<String>, name: &str, value: &str) {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        errors.push(format!("{name} must be an http(s) URL, got '{value}'"));
    }
}

fn validate_presence(errors: &mut Vec<String>, config: &VenoConfig) {
    let p = &config.presence;
    if p.topic.is_empty() {
        errors.push("presence.topic must not be empty".into());
    }
    check_range(errors, "presence.heartbeat_interval", p.heartbeat_interval, 5, 120);
    check_range(errors, "presence.reconnect_delay", p.reconnect_delay, 1, 60);
    check_range(errors, "presence.max_reconnect_delay", p.max_reconnect_delay, 1, 300);
    if p.reconnect_delay > p.max_reconnect_delay {
        errors.push(format!(
            "presence.reconnect_delay ({}) must not exceed presence.max_reconnect_delay ({})",
            p.reconnect_delay, p.max_reconnect_delay
        ));
    }
}

fn validate_api(errors: &mut Vec<String>, config: &VenoConfig) {
    let a = &config.api;
    check_http_url(errors, "api.base_url", &a.base_url);
    check_range(errors, "api.timeout_secs", a.timeout_secs, 1, 60);
    check_range(errors, "api.max_retries", a.max_retries as u64, 0, 10);
    check_range(errors, "api.retry_base_delay_ms", a.retry_base_delay_ms, 10, 10_000);
}

fn validate_billing(errors: &mut Vec<String>, config: &VenoConfig) {
    let b = &config.billing;
    check_http_url(errors, "billing.base_url", &b.base_url);
    if b.currency.len() != 3 || !b.currency.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(format!(
            "billing.currency must be a 3-letter ISO 4217 code, got '{}'",
            b.currency
        ));
    }
}

fn validate_ai(errors: &mut Vec<String>, config: &VenoConfig) {
    let ai = &config.ai;
    check_http_url(errors, "ai.key_endpoint", &ai.key_endpoint);
    check_http_url(errors, "ai.completion_url", &ai.completion_url);
    check_range(errors, "ai.max_tokens", ai.max_tokens as u64, 1, 8192);
    if ai.model.is_empty() {
        errors.push("ai.model must not be empty".into());
    }
}

fn validate_cbt(errors: &mut Vec<String>, config: &VenoConfig) {
    check_range(
        errors,
        "cbt.default_duration_secs",
        config.cbt.default_duration_secs,
        60,
        14_400,
    );
}

fn validate_logging(errors: &mut Vec<String>, config: &VenoConfig) {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(format!(
            "logging.level must be one of {LOG_LEVELS:?}, got '{}'",
            config.logging.level
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&VenoConfig::default()).is_ok());
    }

    #[test]
    fn empty_topic_rejected() {
        let mut config = VenoConfig::default();
        config.presence.topic = String::new();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("presence.topic"));
    }

    #[test]
    fn heartbeat_out_of_range_rejected() {
        let mut config = VenoConfig::default();
        config.presence.heartbeat_interval = 2;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("presence.heartbeat_interval"));
    }

    #[test]
    fn reconnect_delay_above_cap_rejected() {
        let mut config = VenoConfig::default();
        config.presence.reconnect_delay = 45;
        config.presence.max_reconnect_delay = 30;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn non_http_urls_rejected() {
        let mut config = VenoConfig::default();
        config.api.base_url = "ftp://example.com".into();
        config.billing.base_url = "paystack.co".into();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("api.base_url"));
        assert!(msg.contains("billing.base_url"));
    }

    #[test]
    fn bad_currency_rejected() {
        let mut config = VenoConfig::default();
        config.billing.currency = "naira".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("billing.currency"));
    }

    #[test]
    fn bad_log_level_rejected() {
        let mut config = VenoConfig::default();
        config.logging.level = "TRACE".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn errors_are_collected_not_short_circuited() {
        let mut config = VenoConfig::default();
        config.presence.heartbeat_interval = 0;
        config.ai.model = String::new();
        config.logging.level = "bogus".into();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("heartbeat_interval"));
        assert!(msg.contains("ai.model"));
        assert!(msg.contains("logging.level"));
    }
}
