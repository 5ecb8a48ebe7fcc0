//! Request lifecycle and response history for Redraft.

pub mod error;
pub mod history;
pub mod kind;
pub mod session;

pub use error::SessionError;
pub use history::ResponseHistory;
pub use kind::{TransformKind, build_prompt};
pub use session::{MIN_REQUEST_INTERVAL, RequestSession, SessionStatus};
