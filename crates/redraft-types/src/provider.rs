//! Provider identities and credential material.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Default Azure OpenAI API version when the settings omit one.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// A hosted LLM provider the gateway can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    DeepSeek,
    Azure,
}

impl Provider {
    /// Lowercase wire/display name (used in error messages and config).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::DeepSeek => "deepseek",
            Provider::Azure => "azure",
        }
    }

    /// Model used when the caller supplies none.
    ///
    /// Azure has no default: the deployment name implies the model.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("gpt-4o-mini"),
            Provider::Anthropic => Some("claude-3-5-sonnet-20241022"),
            Provider::Google => Some("gemini-1.5-flash"),
            Provider::DeepSeek => Some("deepseek-chat"),
            Provider::Azure => None,
        }
    }

    /// All supported providers, in display order.
    pub fn all() -> [Provider; 5] {
        [
            Provider::OpenAi,
            Provider::Anthropic,
            Provider::Google,
            Provider::DeepSeek,
            Provider::Azure,
        ]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "google" | "gemini" => Ok(Provider::Google),
            "deepseek" => Ok(Provider::DeepSeek),
            "azure" => Ok(Provider::Azure),
            other => Err(ConfigError::InvalidValue {
                key: "provider".into(),
                message: format!("unknown provider '{other}'"),
            }),
        }
    }
}

/// Azure OpenAI credential set. Configured only when `api_key`,
/// `endpoint`, and `deployment` are all non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_AZURE_API_VERSION.to_string()
}

impl Default for AzureCredentials {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_api_version(),
        }
    }
}

/// API secrets for every provider. Empty string means "not configured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub openai_key: String,
    #[serde(default)]
    pub anthropic_key: String,
    #[serde(default)]
    pub google_key: String,
    #[serde(default)]
    pub deepseek_key: String,
    #[serde(default)]
    pub azure: AzureCredentials,
}

impl Credentials {
    /// Build credentials from the flat string-key map used by the
    /// settings layer. Absent and empty values are equivalent.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        let api_version = get("azure_api_version");
        Self {
            openai_key: get("openai_key"),
            anthropic_key: get("anthropic_key"),
            google_key: get("google_key"),
            deepseek_key: get("deepseek_key"),
            azure: AzureCredentials {
                api_key: get("azure_api_key"),
                endpoint: get("azure_endpoint"),
                deployment: get("azure_deployment"),
                api_version: if api_version.is_empty() {
                    default_api_version()
                } else {
                    api_version
                },
            },
        }
    }

    /// Whether the provider has everything it needs to make a call.
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.validate(provider).is_ok()
    }

    /// Check the provider's credential set, naming every missing field.
    ///
    /// The Azure endpoint must be an HTTPS URL; anything else is
    /// rejected here, before any network attempt.
    pub fn validate(&self, provider: Provider) -> Result<(), ConfigError> {
        match provider {
            Provider::OpenAi => require_key("openai_key", &self.openai_key),
            Provider::Anthropic => require_key("anthropic_key", &self.anthropic_key),
            Provider::Google => require_key("google_key", &self.google_key),
            Provider::DeepSeek => require_key("deepseek_key", &self.deepseek_key),
            Provider::Azure => {
                let mut missing = Vec::new();
                if self.azure.api_key.is_empty() {
                    missing.push("azure_api_key");
                }
                if self.azure.endpoint.is_empty() {
                    missing.push("azure_endpoint");
                }
                if self.azure.deployment.is_empty() {
                    missing.push("azure_deployment");
                }
                if !missing.is_empty() {
                    return Err(ConfigError::MissingKey {
                        key: missing.join(", "),
                    });
                }
                if !self.azure.endpoint.starts_with("https://") {
                    return Err(ConfigError::InvalidValue {
                        key: "azure_endpoint".into(),
                        message: "must be an HTTPS URL".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

fn require_key(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        Err(ConfigError::MissingKey { key: name.into() })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure_creds() -> Credentials {
        Credentials {
            azure: AzureCredentials {
                api_key: "key".into(),
                endpoint: "https://foo.openai.azure.com".into(),
                deployment: "gpt4o".into(),
                api_version: DEFAULT_AZURE_API_VERSION.into(),
            },
            ..Credentials::default()
        }
    }

    #[test]
    fn provider_roundtrip() {
        for p in Provider::all() {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
    }

    #[test]
    fn provider_parse_unknown() {
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn default_models() {
        assert_eq!(Provider::OpenAi.default_model(), Some("gpt-4o-mini"));
        assert_eq!(Provider::Google.default_model(), Some("gemini-1.5-flash"));
        assert_eq!(Provider::Azure.default_model(), None);
    }

    #[test]
    fn missing_single_key() {
        let creds = Credentials::default();
        match creds.validate(Provider::OpenAi) {
            Err(ConfigError::MissingKey { key }) => assert_eq!(key, "openai_key"),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn azure_missing_fields_all_named() {
        let creds = Credentials {
            azure: AzureCredentials {
                api_key: "key".into(),
                ..AzureCredentials::default()
            },
            ..Credentials::default()
        };
        match creds.validate(Provider::Azure) {
            Err(ConfigError::MissingKey { key }) => {
                assert_eq!(key, "azure_endpoint, azure_deployment");
            }
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn azure_http_endpoint_rejected() {
        let mut creds = azure_creds();
        creds.azure.endpoint = "http://foo.com".into();
        match creds.validate(Provider::Azure) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "azure_endpoint"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn azure_https_endpoint_ok() {
        assert!(azure_creds().is_configured(Provider::Azure));
    }

    #[test]
    fn from_map_empty_means_unconfigured() {
        let mut map = HashMap::new();
        map.insert("openai_key".to_string(), String::new());
        let creds = Credentials::from_map(&map);
        assert!(!creds.is_configured(Provider::OpenAi));
    }

    #[test]
    fn from_map_defaults_api_version() {
        let map = HashMap::new();
        let creds = Credentials::from_map(&map);
        assert_eq!(creds.azure.api_version, DEFAULT_AZURE_API_VERSION);
    }
}
