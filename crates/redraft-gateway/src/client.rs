//! HTTP client dispatching requests to the configured provider.

use crate::stream::TextStream;
use crate::wire;
use redraft_types::{
    Gateway, GatewayError, ProviderRequest, gateway::EventStream, truncate_str,
};
use std::future::Future;
use std::pin::Pin;

/// Longest raw error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Client for all supported provider APIs.
///
/// Stateless apart from the connection pool; credentials travel with
/// each [`ProviderRequest`].
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new() -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self { http })
    }

    /// Send a non-streaming request and return the generated text.
    pub async fn complete(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        let response = self.dispatch(request, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(wire::extract_full_text(request.provider, &body))
    }

    /// Send a streaming request and return the normalized event stream.
    pub async fn stream_text(&self, request: &ProviderRequest) -> Result<TextStream, GatewayError> {
        let response = self.dispatch(request, true).await?;
        Ok(TextStream::new(request.provider, response.bytes_stream()))
    }

    /// Validate, build, and POST the wire request; normalize non-2xx
    /// responses into [`GatewayError::Http`] before any body is streamed.
    async fn dispatch(
        &self,
        request: &ProviderRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        request.credentials.validate(request.provider)?;
        let wire = wire::build(request, streaming)?;

        tracing::debug!(
            provider = %request.provider,
            model = request.resolved_model(),
            streaming,
            "dispatching generation request"
        );

        let response = self
            .http
            .post(&wire.url)
            .headers(wire.headers)
            .body(wire.body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(request, status.as_u16(), &body));
        }
        Ok(response)
    }
}

impl Gateway for GatewayClient {
    fn stream_text<'a>(
        &'a self,
        request: &'a ProviderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let stream = self.stream_text(request).await?;
            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Build the error for a non-2xx response.
///
/// Tries the nested `error.message` field, then a top-level `message`,
/// and falls back to the raw body capped at 200 bytes.
fn http_error(request: &ProviderRequest, status: u16, body: &str) -> GatewayError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
        message: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let message = parsed
        .and_then(|b| b.error.and_then(|e| e.message).or(b.message))
        .unwrap_or_else(|| truncate_str(body, MAX_ERROR_BODY).to_string());

    GatewayError::Http {
        provider: request.provider,
        status,
        message,
    }
}
