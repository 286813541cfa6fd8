// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod stream;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{Assistant, AssistantClient, EventStream};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
