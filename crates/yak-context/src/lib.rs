//! yak-context: Bounded conversation context management
//!
//! This crate owns an ordered conversation history headed by a persona
//! message, compacts older turns into a cumulative summary when the history
//! outgrows its bound, and keeps the persona live-updatable without
//! corrupting in-flight history.

pub mod context;
pub mod error;
pub mod prompt;
pub mod title;

pub use context::{ContextConfig, ContextManager, Summary};
pub use error::{Error, Result};
pub use prompt::PromptSource;
pub use title::summarize_topic;
