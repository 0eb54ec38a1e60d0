//! yak-ai: Completion provider layer
//!
//! Message types, the `CompletionProvider` abstraction, and a concrete
//! OpenAI Chat Completions client.

pub mod error;
pub mod provider;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use provider::CompletionProvider;
pub use types::{Completion, Message, Role};
