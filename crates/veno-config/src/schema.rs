//! Configuration schema with serde defaults for every field, so partial
//! config files work out of the box.

use serde::{Deserialize, Serialize};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Top-level Veno configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VenoConfig {
    pub supabase: SupabaseSection,
    pub presence: PresenceSection,
    pub api: ApiSection,
    pub billing: BillingSection,
    pub ai: AiSection,
    pub cbt: CbtSection,
    pub logging: LoggingSection,
}

/// Hosted platform connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupabaseSection {
    /// Project reference, the subdomain of the realtime endpoint.
    pub project_ref: String,
    /// Publishable anon key.
    pub anon_key: String,
}

impl Default for SupabaseSection {
    fn default() -> Self {
        Self {
            project_ref: String::new(),
            anon_key: String::new(),
        }
    }
}

/// Realtime presence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PresenceSection {
    pub enabled: bool,
    /// Channel topic all clients share for the online-users list.
    pub topic: String,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Base reconnect delay in seconds.
    pub reconnect_delay: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay: u64,
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            enabled: true,
            topic: "online-users".into(),
            heartbeat_interval: 25,
            reconnect_delay: 1,
            max_reconnect_delay: 30,
        }
    }
}

/// Backend REST API settings, including the fetch retry policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Maximum retry attempts after the initial request.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.veno.app".into(),
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 250,
        }
    }
}

/// Payment provider settings. All charge-state logic lives provider-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BillingSection {
    pub base_url: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Provider plan code for the premium subscription.
    pub plan_code: String,
}

impl Default for BillingSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".into(),
            currency: "NGN".into(),
            plan_code: String::new(),
        }
    }
}

/// AI completion proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiSection {
    /// Edge function that vends a short-lived completion API key.
    pub key_endpoint: String,
    pub completion_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            key_endpoint: "https://api.veno.app/functions/ai-key".into(),
            completion_url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            max_tokens: 512,
        }
    }
}

/// Test-taking defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CbtSection {
    /// Default test duration in seconds.
    pub default_duration_secs: u64,
    pub shuffle_questions: bool,
}

impl Default for CbtSection {
    fn default() -> Self {
        Self {
            default_duration_secs: 1200,
            shuffle_questions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// DEBUG, INFO, WARNING, ERROR
    pub level: String,
    pub file_logging: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "INFO".into(),
            file_logging: false,
        }
    }
}
