//! Gateway trait for streaming LLM providers.

use crate::{GatewayError, ProviderRequest, StreamEvent};
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;

/// A boxed, finite, non-restartable stream of generation events.
///
/// Yields zero or more `Delta`s, then exactly one `Done` or `Error`.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// A component that turns a [`ProviderRequest`] into a live event stream.
///
/// Dyn-compatible so the session works with `Arc<dyn Gateway>`; tests
/// substitute mock implementations.
pub trait Gateway: Send + Sync {
    /// Issue a streaming generation request.
    ///
    /// Errors returned here happened before any event was produced
    /// (bad credentials, connection failure, non-2xx status). Failures
    /// after that surface as a terminal `StreamEvent::Error`.
    fn stream_text<'a>(
        &'a self,
        request: &'a ProviderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, GatewayError>> + Send + 'a>>;

    /// Gateway name for logging/display.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn gateway_is_dyn_compatible() {
        // Compile-time check: Gateway can be used as a trait object.
        fn _accept(_g: &dyn Gateway) {}
    }

    #[test]
    fn arc_gateway_is_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn Gateway>>();
    }
}
