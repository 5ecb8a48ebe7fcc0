//! Async stream that normalizes provider SSE bytes into [`StreamEvent`]s.

use crate::sse::SseRecords;
use crate::wire;
use futures_core::Stream;
use pin_project_lite::pin_project;
use redraft_types::{Provider, StreamEvent};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The OpenAI-style end-of-stream sentinel; a no-op, not a delta.
const DONE_SENTINEL: &str = "[DONE]";

pin_project! {
    /// A lazy, finite stream of [`StreamEvent`]s over one provider response.
    ///
    /// Yields zero or more `Delta`s in arrival order, then exactly one
    /// terminal event; polling past the terminal event yields `None`.
    pub struct TextStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
        provider: Provider,
        records: SseRecords,
        pending: VecDeque<String>,
        full_text: String,
        // The transport reported end-of-stream; never poll `inner` again.
        closed: bool,
        // The terminal event was emitted; the stream is spent.
        finished: bool,
    }
}

impl std::fmt::Debug for TextStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStream")
            .field("provider", &self.provider)
            .field("pending", &self.pending)
            .field("full_text", &self.full_text)
            .field("closed", &self.closed)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl TextStream {
    /// Wrap a raw byte stream (e.g. `Response::bytes_stream()`).
    pub fn new(
        provider: Provider,
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            provider,
            records: SseRecords::new(),
            pending: VecDeque::new(),
            full_text: String::new(),
            closed: false,
            finished: false,
        }
    }
}

impl Stream for TextStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            if let Some(text) = this.pending.pop_front() {
                return Poll::Ready(Some(StreamEvent::Delta { text }));
            }

            if *this.closed {
                *this.finished = true;
                return Poll::Ready(Some(StreamEvent::Done {
                    full_text: std::mem::take(this.full_text),
                }));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    for data in this.records.feed(&bytes) {
                        queue_delta(*this.provider, &data, this.pending, this.full_text);
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(StreamEvent::Error {
                        message: e.to_string(),
                    }));
                }
                Poll::Ready(None) => {
                    *this.closed = true;
                    // Flush an unterminated final record, if any.
                    if let Some(data) = this.records.finish() {
                        queue_delta(*this.provider, &data, this.pending, this.full_text);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn queue_delta(
    provider: Provider,
    data: &str,
    pending: &mut VecDeque<String>,
    full_text: &mut String,
) {
    if data.trim() == DONE_SENTINEL {
        return;
    }
    if let Some(text) = wire::extract_delta(provider, data) {
        full_text.push_str(&text);
        pending.push_back(text);
    }
}
