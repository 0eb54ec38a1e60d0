//! Injected persona-update source
//!
//! A settings subsystem owns a `PromptSource` and hands receivers to
//! whichever components need live persona text. This replaces a
//! process-wide shared prompt holder: the handle is passed in explicitly,
//! there is no ambient global.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared handle publishing persona text updates.
///
/// Cloning is cheap; all clones publish to the same stream. Receivers see
/// only the most recent value (watch semantics), which matches the
/// apply-latest contract of [`crate::ContextManager::attach_prompt_stream`].
#[derive(Debug, Clone)]
pub struct PromptSource {
    tx: Arc<watch::Sender<String>>,
}

impl PromptSource {
    /// Create a source seeded with the initial persona text
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new persona text
    pub fn update(&self, prompt: impl Into<String>) {
        self.tx.send_replace(prompt.into());
    }

    /// Current persona text
    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Subscribe to future persona updates
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_replaces_current() {
        let source = PromptSource::new("a");
        assert_eq!(source.current(), "a");
        source.update("b");
        assert_eq!(source.current(), "b");
    }

    #[test]
    fn test_clones_share_state() {
        let source = PromptSource::new("a");
        let clone = source.clone();
        clone.update("b");
        assert_eq!(source.current(), "b");
    }

    #[tokio::test]
    async fn test_subscriber_observes_latest_only() {
        let source = PromptSource::new("a");
        let mut rx = source.subscribe();

        source.update("b");
        source.update("c");

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "c");
    }

    #[test]
    fn test_update_without_subscribers_is_fine() {
        let source = PromptSource::new("a");
        source.update("b");
        assert_eq!(source.current(), "b");
    }
}
