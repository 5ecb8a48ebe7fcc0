//! Shared types and error hierarchy for Redraft.

pub mod error;
pub mod event;
pub mod gateway;
pub mod provider;
pub mod util;

pub use error::{ConfigError, GatewayError};
pub use event::{ProviderRequest, StreamEvent};
pub use gateway::{EventStream, Gateway};
pub use provider::{AzureCredentials, Credentials, Provider};
pub use util::truncate_str;
