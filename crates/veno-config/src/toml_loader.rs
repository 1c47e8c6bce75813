//! TOML config file loading and creation.

use crate::schema::VenoConfig;
use crate::validation;
use std::path::Path;
use tracing::{info, warn};
use veno_common::ConfigError;

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// After loading, the config is validated; if validation fails, a warning
/// is logged and the default config is returned.
pub fn load_from_path(path: &Path) -> Result<VenoConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: VenoConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    // Validate and warn on errors, but still return a usable config
    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(VenoConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/veno/config.toml`
/// On Linux: `~/.config/veno/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<VenoConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(VenoConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("veno").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let content = default_config_toml();

    std::fs::write(path, content).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

/// Generate the default TOML config content with comments.
fn default_config_toml() -> String {
    r##"# Veno Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[supabase]
# project_ref = ""        # the subdomain of your realtime endpoint
# anon_key = ""

[presence]
# enabled = true
# topic = "online-users"
# heartbeat_interval = 25   # seconds, 5-120
# reconnect_delay = 1       # seconds, base for exponential backoff
# max_reconnect_delay = 30  # seconds, backoff cap

[api]
# base_url = "https://api.veno.app"
# timeout_secs = 10         # 1-60
# max_retries = 3           # 0-10
# retry_base_delay_ms = 250 # 10-10000

[billing]
# base_url = "https://api.paystack.co"
# currency = "NGN"          # ISO 4217
# plan_code = ""

[ai]
# key_endpoint = "https://api.veno.app/functions/ai-key"
# completion_url = "https://api.openai.com/v1/chat/completions"
# model = "gpt-4o-mini"
# max_tokens = 512          # 1-8192

[cbt]
# default_duration_secs = 1200  # 60-14400
# shuffle_questions = true

[logging]
# level = "INFO"            # DEBUG, INFO, WARNING, ERROR
# file_logging = false
"##
    .to_string()
}
