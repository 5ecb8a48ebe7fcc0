//! Request and stream-event types shared across the gateway and session.

use crate::provider::{Credentials, Provider};

/// One generation request, built fresh per call and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub provider: Provider,
    /// Model override; the provider default applies when `None`.
    pub model: Option<String>,
    pub prompt: String,
    pub system_prompt: String,
    pub credentials: Credentials,
}

impl ProviderRequest {
    /// The model the wire request will carry: the caller's override,
    /// else the provider default. Azure resolves to the deployment name.
    pub fn resolved_model(&self) -> &str {
        if let Some(model) = self.model.as_deref() {
            if !model.is_empty() {
                return model;
            }
        }
        match self.provider {
            Provider::Azure => &self.credentials.azure.deployment,
            _ => self.provider.default_model().unwrap_or_default(),
        }
    }
}

/// An event from a streaming generation.
///
/// A stream yields zero or more `Delta`s followed by exactly one
/// terminal event: `Done` or `Error`, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental fragment of generated text.
    Delta { text: String },
    /// The stream finished; carries the full generated text.
    Done { full_text: String },
    /// The stream failed; no further events follow.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(provider: Provider, model: Option<&str>) -> ProviderRequest {
        ProviderRequest {
            provider,
            model: model.map(String::from),
            prompt: "Hi".into(),
            system_prompt: String::new(),
            credentials: Credentials::default(),
        }
    }

    #[test]
    fn resolved_model_prefers_override() {
        let req = request(Provider::OpenAi, Some("gpt-4o"));
        assert_eq!(req.resolved_model(), "gpt-4o");
    }

    #[test]
    fn resolved_model_falls_back_to_default() {
        let req = request(Provider::Google, None);
        assert_eq!(req.resolved_model(), "gemini-1.5-flash");
    }

    #[test]
    fn resolved_model_empty_override_is_unset() {
        let req = request(Provider::DeepSeek, Some(""));
        assert_eq!(req.resolved_model(), "deepseek-chat");
    }

    #[test]
    fn resolved_model_azure_uses_deployment() {
        let mut req = request(Provider::Azure, None);
        req.credentials.azure.deployment = "prod-gpt4o".into();
        assert_eq!(req.resolved_model(), "prod-gpt4o");
    }
}
