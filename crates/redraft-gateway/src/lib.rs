//! Multi-provider streaming LLM gateway for Redraft.
//!
//! Normalizes the OpenAI chat-completions, Anthropic Messages, and
//! Google Gemini generateContent wire formats, including their SSE
//! streaming variants, into one `StreamEvent` contract.

mod client;
mod sse;
mod stream;
mod wire;

pub use client::GatewayClient;
pub use stream::TextStream;
