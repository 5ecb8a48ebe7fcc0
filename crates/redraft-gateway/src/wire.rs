//! Per-provider wire translation: request construction and response
//! text extraction for the three wire families (OpenAI-style chat
//! completions, Anthropic Messages, Google Gemini generateContent).

use redraft_types::{ConfigError, GatewayError, Provider, ProviderRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

const CHAT_TEMPERATURE: f32 = 0.7;
const ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// A fully-constructed HTTP request, ready to POST.
pub(crate) struct WireRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI-style chat completions body; also used by DeepSeek and Azure
/// (Azure omits `model`; the deployment implies it).
#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
}

/// Construct the provider-specific URL, headers, and JSON body.
///
/// Assumes credentials were already validated; header-value failures
/// (control characters in a key) still reject before any network call.
pub(crate) fn build(
    request: &ProviderRequest,
    streaming: bool,
) -> Result<WireRequest, GatewayError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let model = request.resolved_model();

    let (url, body) = match request.provider {
        Provider::OpenAi | Provider::DeepSeek => {
            let (key_name, key, url) = match request.provider {
                Provider::OpenAi => ("openai_key", &request.credentials.openai_key, OPENAI_URL),
                _ => ("deepseek_key", &request.credentials.deepseek_key, DEEPSEEK_URL),
            };
            headers.insert(AUTHORIZATION, bearer_value(key_name, key)?);
            let body = ChatRequest {
                model: Some(model),
                messages: chat_messages(request),
                temperature: CHAT_TEMPERATURE,
                stream: streaming,
            };
            (url.to_string(), encode(&body)?)
        }
        Provider::Anthropic => {
            headers.insert(
                "x-api-key",
                header_value("anthropic_key", &request.credentials.anthropic_key)?,
            );
            headers.insert(
                "anthropic-version",
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
            let body = MessagesRequest {
                model,
                max_tokens: ANTHROPIC_MAX_TOKENS,
                system: non_empty(&request.system_prompt),
                messages: vec![ChatMessage {
                    role: "user",
                    content: &request.prompt,
                }],
                stream: streaming,
            };
            (ANTHROPIC_URL.to_string(), encode(&body)?)
        }
        Provider::Google => {
            let action = if streaming {
                "streamGenerateContent"
            } else {
                "generateContent"
            };
            let mut url = reqwest::Url::parse(&format!("{GOOGLE_BASE_URL}/{model}:{action}"))
                .map_err(|e| {
                    GatewayError::Config(ConfigError::InvalidValue {
                        key: "model".into(),
                        message: format!("cannot form Gemini URL: {e}"),
                    })
                })?;
            url.query_pairs_mut()
                .append_pair("key", &request.credentials.google_key);
            if streaming {
                url.query_pairs_mut().append_pair("alt", "sse");
            }

            // Single user turn: system prompt and user prompt as two parts.
            let mut parts = Vec::new();
            if let Some(system) = non_empty(&request.system_prompt) {
                parts.push(Part {
                    text: Some(system.to_string()),
                });
            }
            parts.push(Part {
                text: Some(request.prompt.clone()),
            });
            let body = GenerateContentRequest {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts,
                }],
            };
            (url.to_string(), encode(&body)?)
        }
        Provider::Azure => {
            headers.insert(
                "api-key",
                header_value("azure_api_key", &request.credentials.azure.api_key)?,
            );
            let azure = &request.credentials.azure;
            let url = format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                azure.endpoint.trim_end_matches('/'),
                azure.deployment,
                azure.api_version,
            );
            let body = ChatRequest {
                model: None,
                messages: chat_messages(request),
                temperature: CHAT_TEMPERATURE,
                stream: streaming,
            };
            (url, encode(&body)?)
        }
    };

    Ok(WireRequest { url, headers, body })
}

fn chat_messages(request: &ProviderRequest) -> Vec<ChatMessage<'_>> {
    let mut messages = Vec::new();
    if let Some(system) = non_empty(&request.system_prompt) {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });
    messages
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

fn encode<T: Serialize>(body: &T) -> Result<String, GatewayError> {
    serde_json::to_string(body)
        .map_err(|e| GatewayError::Network(format!("failed to encode request body: {e}")))
}

fn bearer_value(key_name: &str, key: &str) -> Result<HeaderValue, GatewayError> {
    header_value(key_name, &format!("Bearer {key}"))
}

fn header_value(key_name: &str, value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value).map_err(|_| {
        GatewayError::Config(ConfigError::InvalidValue {
            key: key_name.into(),
            message: "contains characters not allowed in an HTTP header".into(),
        })
    })
}

// ---------------------------------------------------------------------------
// Response extraction
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Default)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatContent>,
    #[serde(default)]
    delta: Option<ChatContent>,
}

#[derive(Deserialize, Default)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<TextBlock>,
}

#[derive(Deserialize, Default)]
struct TextBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic SSE payload: text arrives in `delta.text` for
/// `content_block_delta` events or `content_block.text` at block start.
#[derive(Deserialize, Default)]
struct AnthropicStreamPayload {
    #[serde(default)]
    delta: Option<TextBlock>,
    #[serde(default)]
    content_block: Option<TextBlock>,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Pull the single text payload out of a non-streaming response body.
/// A missing or empty payload normalizes to the empty string.
pub(crate) fn extract_full_text(provider: Provider, body: &str) -> String {
    match provider {
        Provider::OpenAi | Provider::DeepSeek | Provider::Azure => {
            serde_json::from_str::<ChatResponse>(body)
                .ok()
                .and_then(|r| r.choices.into_iter().next())
                .and_then(|c| c.message)
                .and_then(|m| m.content)
                .unwrap_or_default()
        }
        Provider::Anthropic => serde_json::from_str::<MessagesResponse>(body)
            .map(|r| join_text_blocks(&r.content))
            .unwrap_or_default(),
        Provider::Google => serde_json::from_str::<GenerateContentResponse>(body)
            .map(|r| join_candidate_parts(&r))
            .unwrap_or_default(),
    }
}

/// Pull the incremental text fragment out of one SSE record payload.
///
/// `None` means the record carried no text for us: either a field we
/// don't address, or JSON that failed to parse (keepalives, comments),
/// which must never abort the stream.
pub(crate) fn extract_delta(provider: Provider, data: &str) -> Option<String> {
    let fragment = match provider {
        Provider::OpenAi | Provider::DeepSeek | Provider::Azure => {
            match serde_json::from_str::<ChatResponse>(data) {
                Ok(r) => r
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta)
                    .and_then(|d| d.content),
                Err(e) => return skip_record(provider, e),
            }
        }
        Provider::Anthropic => match serde_json::from_str::<AnthropicStreamPayload>(data) {
            Ok(p) => p
                .delta
                .and_then(|d| d.text)
                .or_else(|| p.content_block.and_then(|b| b.text)),
            Err(e) => return skip_record(provider, e),
        },
        Provider::Google => match serde_json::from_str::<GenerateContentResponse>(data) {
            Ok(r) => Some(join_candidate_parts(&r)),
            Err(e) => return skip_record(provider, e),
        },
    };
    fragment.filter(|t| !t.is_empty())
}

fn skip_record(provider: Provider, e: serde_json::Error) -> Option<String> {
    tracing::debug!("skipping unparsable {provider} stream record: {e}");
    None
}

fn join_text_blocks(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

fn join_candidate_parts(response: &GenerateContentResponse) -> String {
    let Some(content) = response.candidates.first().and_then(|c| c.content.as_ref()) else {
        return String::new();
    };
    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}
