//! Multi-tier TOML configuration for Redraft.
//!
//! Reads configuration from multiple sources with precedence:
//! env vars > config file > defaults

use redraft_types::{ConfigError, Credentials, Provider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// The provider used when nothing selects one.
pub const DEFAULT_PROVIDER: Provider = Provider::OpenAi;

/// The system prompt used when the settings omit one.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an assistant that rewrites emails. Preserve the sender's intent and any \
     factual content exactly.";

/// Resolved configuration for a Redraft session.
#[derive(Debug, Clone)]
pub struct RedraftConfig {
    pub provider: Provider,
    pub model: Option<String>,
    pub system_prompt: String,
    pub credentials: Credentials,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
///
/// `[credentials]` is the flat string-key table the settings layer
/// shares with the rest of the system (`openai_key`, `anthropic_key`,
/// `google_key`, `deepseek_key`, `azure_api_key`, `azure_endpoint`,
/// `azure_deployment`, `azure_api_version`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub credentials: HashMap<String, String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

/// Environment variable overlayed onto each credential key.
const CREDENTIAL_ENV_VARS: [(&str, &str); 8] = [
    ("openai_key", "OPENAI_API_KEY"),
    ("anthropic_key", "ANTHROPIC_API_KEY"),
    ("google_key", "GEMINI_API_KEY"),
    ("deepseek_key", "DEEPSEEK_API_KEY"),
    ("azure_api_key", "AZURE_OPENAI_API_KEY"),
    ("azure_endpoint", "AZURE_OPENAI_ENDPOINT"),
    ("azure_deployment", "AZURE_OPENAI_DEPLOYMENT"),
    ("azure_api_version", "AZURE_OPENAI_API_VERSION"),
];

impl RedraftConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.redraft/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));

        let provider = match overrides
            .provider
            .or_else(|| non_empty_env("REDRAFT_PROVIDER"))
            .or(settings.provider)
        {
            Some(name) => Provider::from_str(&name)?,
            None => DEFAULT_PROVIDER,
        };

        let model = overrides
            .model
            .or_else(|| non_empty_env("REDRAFT_MODEL"))
            .or(settings.model);

        let system_prompt = overrides
            .system_prompt
            .or(settings.system_prompt)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let mut credential_map = settings.credentials;
        for (key, var) in CREDENTIAL_ENV_VARS {
            if let Some(value) = non_empty_env(var) {
                credential_map.insert(key.to_string(), value);
            }
        }

        Ok(RedraftConfig {
            provider,
            model,
            system_prompt,
            credentials: Credentials::from_map(&credential_map),
            config_dir,
        })
    }
}

/// Get the Redraft config directory path (~/.redraft/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REDRAFT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".redraft")
}

/// An env var's value, with empty treated the same as unset.
fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &std::path::Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = SettingsFile::default();
        assert!(settings.provider.is_none());
        assert!(settings.credentials.is_empty());
    }

    #[test]
    fn settings_toml_parse() {
        let toml_str = r#"
provider = "anthropic"
model = "claude-3-5-sonnet-20241022"

[credentials]
anthropic_key = "ant-key"
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.provider.as_deref(), Some("anthropic"));
        assert_eq!(
            settings.credentials.get("anthropic_key").map(String::as_str),
            Some("ant-key")
        );
    }

    #[test]
    fn settings_azure_credentials() {
        let toml_str = r#"
provider = "azure"

[credentials]
azure_api_key = "key"
azure_endpoint = "https://foo.openai.azure.com"
azure_deployment = "prod"
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        let creds = Credentials::from_map(&settings.credentials);
        assert!(creds.is_configured(Provider::Azure));
        // api_version falls back to the default when absent
        assert_eq!(creds.azure.api_version, "2024-02-01");
    }

    #[test]
    fn malformed_settings_degrade_to_defaults() {
        let settings: SettingsFile =
            toml::from_str("provider = ").unwrap_or_default();
        assert!(settings.provider.is_none());
    }

    #[test]
    fn empty_credential_values_mean_unconfigured() {
        let toml_str = r#"
[credentials]
openai_key = ""
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        let creds = Credentials::from_map(&settings.credentials);
        assert!(!creds.is_configured(Provider::OpenAi));
    }
}
