//! Completion provider abstraction

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Completion, Message},
};

/// A service that turns an ordered message list into one generated reply.
///
/// Message order must be sent to the backing API verbatim; it is the
/// caller's conversation order.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a single completion for `messages`, capped at `max_tokens`.
    ///
    /// An absent or empty content field in the provider's response is a
    /// valid empty completion, not an error.
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> Result<Completion>;
}
