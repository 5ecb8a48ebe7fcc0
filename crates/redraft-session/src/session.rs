//! The request-lifecycle state machine.
//!
//! One `RequestSession` drives one generation at a time: validation,
//! prompt construction, streaming relay, cancellation, and history
//! recording on success.

use crate::error::SessionError;
use crate::history::ResponseHistory;
use crate::kind::{TransformKind, build_prompt};
use futures_util::StreamExt;
use redraft_types::{Credentials, Gateway, GatewayError, Provider, ProviderRequest, StreamEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Minimum spacing between allowed requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Preparing,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

/// Owns the lifecycle of generation requests against one provider.
///
/// `run` takes `&mut self`, so at most one request is ever in flight;
/// the status guard rejects a re-entrant call with [`SessionError::Busy`]
/// as a second line of defense.
pub struct RequestSession {
    gateway: Arc<dyn Gateway>,
    provider: Provider,
    credentials: Credentials,
    model: Option<String>,
    system_prompt: String,
    context: String,
    status: SessionStatus,
    original_text: String,
    accumulated: String,
    last_request: Option<Instant>,
    history: ResponseHistory,
}

impl RequestSession {
    pub fn new(gateway: Arc<dyn Gateway>, provider: Provider, credentials: Credentials) -> Self {
        Self {
            gateway,
            provider,
            credentials,
            model: None,
            system_prompt: String::new(),
            context: String::new(),
            status: SessionStatus::Idle,
            original_text: String::new(),
            accumulated: String::new(),
            last_request: None,
            history: ResponseHistory::new(),
        }
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    pub fn set_system_prompt(&mut self, prompt: String) {
        self.system_prompt = prompt;
    }

    /// Email context prefixed ahead of the transform instruction.
    pub fn set_context(&mut self, context: String) {
        self.context = context;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The input text of the most recent request, kept for diffing.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn history(&self) -> &ResponseHistory {
        &self.history
    }

    /// Move the history cursor (-1 older, +1 newer).
    pub fn navigate_history(&mut self, direction: i32) -> Option<&str> {
        self.history.navigate(direction);
        self.history.current()
    }

    /// Run one transform request to completion.
    ///
    /// Relays every [`StreamEvent`] to `on_event` in arrival order and
    /// returns the final text. Cancelling `cancel` mid-flight tears
    /// down the transport; deltas already relayed stand, nothing more
    /// is delivered, and nothing is written to history.
    pub async fn run<F>(
        &mut self,
        kind: &str,
        input: &str,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<String, SessionError>
    where
        F: FnMut(StreamEvent),
    {
        if matches!(
            self.status,
            SessionStatus::Preparing | SessionStatus::Streaming
        ) {
            return Err(SessionError::Busy);
        }

        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                return Err(SessionError::RateLimited {
                    wait_ms: (MIN_REQUEST_INTERVAL - elapsed).as_millis() as u64,
                });
            }
        }

        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.credentials.validate(self.provider)?;

        // The rate-limit clock advances only for calls allowed through;
        // a rejected call must not consume the window.
        self.last_request = Some(Instant::now());

        self.status = SessionStatus::Preparing;
        self.original_text = input.to_string();
        self.accumulated.clear();

        let request = ProviderRequest {
            provider: self.provider,
            model: self.model.clone(),
            prompt: build_prompt(TransformKind::parse(kind), &self.context, input),
            system_prompt: self.system_prompt.clone(),
            credentials: self.credentials.clone(),
        };

        tracing::debug!(provider = %self.provider, kind, "starting transform request");

        let mut stream = match self.gateway.stream_text(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                self.status = SessionStatus::Failed;
                return Err(e.into());
            }
        };
        self.status = SessionStatus::Streaming;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.status = SessionStatus::Cancelled;
                    self.accumulated.clear();
                    return Err(SessionError::Cancelled);
                }
                event = stream.next() => {
                    match event {
                        Some(StreamEvent::Delta { text }) => {
                            self.accumulated.push_str(&text);
                            on_event(StreamEvent::Delta { text });
                        }
                        Some(StreamEvent::Done { full_text }) => {
                            // Prefer the provider-reported text when non-empty,
                            // else the delta accumulation.
                            let final_text = if full_text.is_empty() {
                                std::mem::take(&mut self.accumulated)
                            } else {
                                self.accumulated.clear();
                                full_text
                            };
                            self.status = SessionStatus::Completed;
                            self.history.push(final_text.clone());
                            on_event(StreamEvent::Done {
                                full_text: final_text.clone(),
                            });
                            return Ok(final_text);
                        }
                        Some(StreamEvent::Error { message }) => {
                            self.status = SessionStatus::Failed;
                            self.accumulated.clear();
                            on_event(StreamEvent::Error {
                                message: message.clone(),
                            });
                            return Err(GatewayError::Network(message).into());
                        }
                        None => {
                            // A stream that closes without a terminal event
                            // finalizes with whatever accumulated.
                            let final_text = std::mem::take(&mut self.accumulated);
                            self.status = SessionStatus::Completed;
                            self.history.push(final_text.clone());
                            on_event(StreamEvent::Done {
                                full_text: final_text.clone(),
                            });
                            return Ok(final_text);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_types::gateway::EventStream;
    use std::future::Future;
    use std::pin::Pin;

    /// Yields a fixed event sequence.
    struct StaticGateway {
        events: Vec<StreamEvent>,
    }

    impl StaticGateway {
        fn events(events: Vec<StreamEvent>) -> Arc<dyn Gateway> {
            Arc::new(Self { events })
        }
    }

    impl Gateway for StaticGateway {
        fn stream_text<'a>(
            &'a self,
            _request: &'a ProviderRequest,
        ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>> {
            let events = self.events.clone();
            Box::pin(async move { Ok(Box::pin(futures_util::stream::iter(events)) as EventStream) })
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    /// Always fails to open a stream.
    struct RefusingGateway;

    impl Gateway for RefusingGateway {
        fn stream_text<'a>(
            &'a self,
            request: &'a ProviderRequest,
        ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>> {
            let provider = request.provider;
            Box::pin(async move {
                Err(GatewayError::Http {
                    provider,
                    status: 429,
                    message: "rate limited".into(),
                })
            })
        }

        fn name(&self) -> &str {
            "refusing"
        }
    }

    fn configured_creds() -> Credentials {
        Credentials {
            openai_key: "sk-test".into(),
            ..Credentials::default()
        }
    }

    fn session(events: Vec<StreamEvent>) -> RequestSession {
        RequestSession::new(
            StaticGateway::events(events),
            Provider::OpenAi,
            configured_creds(),
        )
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta { text: text.into() }
    }

    fn done(full_text: &str) -> StreamEvent {
        StreamEvent::Done {
            full_text: full_text.into(),
        }
    }

    #[tokio::test]
    async fn successful_run_relays_and_records() {
        let mut s = session(vec![delta("Hello"), delta(" world"), done("Hello world")]);
        let mut seen = Vec::new();
        let result = s
            .run("revise", "hi", CancellationToken::new(), |e| seen.push(e))
            .await
            .unwrap();

        assert_eq!(result, "Hello world");
        assert_eq!(s.status(), SessionStatus::Completed);
        assert_eq!(s.original_text(), "hi");
        assert_eq!(s.history().entries(), ["Hello world"]);
        assert_eq!(s.history().cursor(), 0);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], delta("Hello"));
        assert_eq!(seen[2], done("Hello world"));
    }

    #[tokio::test]
    async fn empty_done_text_falls_back_to_accumulation() {
        let mut s = session(vec![delta("a"), delta("b"), done("")]);
        let result = s
            .run("revise", "hi", CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(result, "ab");
        assert_eq!(s.history().current(), Some("ab"));
    }

    #[tokio::test]
    async fn empty_input_rejected() {
        let mut s = session(vec![done("x")]);
        let err = s
            .run("revise", "   \n", CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptyInput));
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn unconfigured_provider_rejected_without_network() {
        let mut s = RequestSession::new(
            StaticGateway::events(vec![done("x")]),
            Provider::Anthropic,
            configured_creds(), // openai key only
        );
        let err = s
            .run("revise", "hi", CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)), "got {err:?}");
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn second_run_within_window_rate_limited() {
        let mut s = session(vec![done("first")]);
        s.run("revise", "hi", CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let err = s
            .run("revise", "again", CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::RateLimited { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn rejected_call_does_not_consume_rate_window() {
        let mut s = session(vec![done("first")]);
        // Rejected for empty input: must not advance the clock
        let _ = s.run("revise", "", CancellationToken::new(), |_| {}).await;

        let result = s
            .run("revise", "hi", CancellationToken::new(), |_| {})
            .await;
        assert!(result.is_ok(), "got {result:?}");
    }

    #[tokio::test]
    async fn gateway_refusal_fails_the_session() {
        let mut s = RequestSession::new(
            Arc::new(RefusingGateway),
            Provider::OpenAi,
            configured_creds(),
        );
        let err = s
            .run("revise", "hi", CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "openai API error 429: rate limited"
        );
        assert_eq!(s.status(), SessionStatus::Failed);
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn stream_error_fails_without_history_entry() {
        let mut s = session(vec![delta("partial"), StreamEvent::Error {
            message: "connection reset".into(),
        }]);
        let mut seen = Vec::new();
        let err = s
            .run("revise", "hi", CancellationToken::new(), |e| seen.push(e))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Gateway(_)), "got {err:?}");
        assert_eq!(s.status(), SessionStatus::Failed);
        assert!(s.history().is_empty());
        assert!(matches!(seen.last(), Some(StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn unknown_kind_passes_raw_text() {
        // Passthrough behavior is covered in kind.rs; here we only
        // confirm the session accepts an unknown kind.
        let mut s = session(vec![done("out")]);
        let result = s
            .run("translate", "hi", CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(result, "out");
    }

    #[tokio::test]
    async fn history_caps_at_ten_entries() {
        let mut s = session(vec![done("resp")]);
        // Drive the history directly; run-level eviction is the same path.
        for i in 1..=11 {
            s.history.push(format!("r{i}"));
        }
        assert_eq!(s.history().len(), 10);
        assert_eq!(s.history().entries()[0], "r2");
    }

    #[tokio::test]
    async fn navigate_history_walks_entries() {
        let mut s = session(vec![]);
        s.history.push("one".into());
        s.history.push("two".into());
        assert_eq!(s.navigate_history(-1), Some("one"));
        assert_eq!(s.navigate_history(1), Some("two"));
        assert_eq!(s.navigate_history(1), Some("two"));
    }
}
