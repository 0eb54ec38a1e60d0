//! Bounded conversation context with automatic compaction
//!
//! The context manager keeps a rolling message history whose first entry is
//! always the persona (system prompt) message. When the history grows past
//! its configured bound, every turn after the persona and any prior summary
//! is folded into a single cumulative summary message, so the context sent
//! to the provider stays small while older information degrades gradually
//! instead of being dropped wholesale.

use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use yak_ai::{CompletionProvider, Message, Role};

use crate::error::{Error, Result};

/// Instruction for the compaction summarization call
const SUMMARIZE_INSTRUCTION: &str = "Produce a concise summary of the following \
exchange, preserving all important content.";

/// Configuration for a conversation context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Initial persona text, held as the first history message
    pub system_prompt: String,
    /// History length that triggers compaction when exceeded
    pub max_history_messages: usize,
    /// Token budget for assistant replies
    pub reply_max_tokens: u32,
    /// Token budget for compaction summaries
    pub summary_max_tokens: u32,
}

impl ContextConfig {
    /// Create a config with the default bounds
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_history_messages: 12,
            reply_max_tokens: 2000,
            summary_max_tokens: 200,
        }
    }

    /// Override the history bound
    pub fn with_max_history_messages(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }

    /// Override the reply token budget
    pub fn with_reply_max_tokens(mut self, max_tokens: u32) -> Self {
        self.reply_max_tokens = max_tokens;
        self
    }

    /// Override the summary token budget
    pub fn with_summary_max_tokens(mut self, max_tokens: u32) -> Self {
        self.summary_max_tokens = max_tokens;
        self
    }
}

/// Cumulative compaction summary state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// No compaction has happened yet
    None,
    /// Cumulative summary text covering all compacted turns
    Cumulative(String),
}

impl Summary {
    /// Text of the summary, empty when none exists
    pub fn text(&self) -> &str {
        match self {
            Summary::None => "",
            Summary::Cumulative(text) => text,
        }
    }
}

/// Conversation state: persona text, ordered history, and summary.
///
/// Invariants: `history[0]` is always the persona (System) message; when a
/// summary exists it sits at `history[1]` as a System message whose content
/// equals the summary text.
#[derive(Debug)]
struct ConversationState {
    /// Authoritative persona text, mirrored into `history[0]`
    system_prompt: String,
    history: Vec<Message>,
    summary: Summary,
}

impl ConversationState {
    fn new(system_prompt: String) -> Self {
        let history = vec![Message::system(system_prompt.clone())];
        Self {
            system_prompt,
            history,
            summary: Summary::None,
        }
    }

    /// Clear all turns and the summary, keeping the current persona.
    fn reset(&mut self) {
        self.history.clear();
        self.history.push(Message::system(self.system_prompt.clone()));
        self.summary = Summary::None;
    }

    fn set_system_prompt(&mut self, new_prompt: String, preserve_history: bool) {
        self.system_prompt = new_prompt;
        if self.history.is_empty() {
            // Should not occur while the head invariant holds; recover anyway.
            self.history.push(Message::system(self.system_prompt.clone()));
            return;
        }
        if preserve_history {
            if self.history[0].role == Role::System {
                self.history[0] = Message::system(self.system_prompt.clone());
            } else {
                // Unexpected head: something upstream broke the invariant.
                tracing::warn!("history head is not a system message, inserting persona");
                self.history
                    .insert(0, Message::system(self.system_prompt.clone()));
            }
            // The summary message, when present, stays in place and keeps
            // serving requests.
        } else {
            self.reset();
        }
    }
}

/// Bounded-memory conversational context with live persona updates.
///
/// Cloning yields another handle to the same conversation; all fields are
/// `Arc`-wrapped. Calls to [`ContextManager::get_response`] against the same
/// conversation are serialized: a second call while one is in flight waits.
#[derive(Clone)]
pub struct ContextManager {
    provider: Arc<dyn CompletionProvider>,
    config: Arc<ContextConfig>,
    state: Arc<Mutex<ConversationState>>,
    listener: Arc<SyncMutex<Option<CancellationToken>>>,
}

impl ContextManager {
    /// Create a context manager for a new conversation session
    pub fn new(provider: Arc<dyn CompletionProvider>, config: ContextConfig) -> Self {
        let state = ConversationState::new(config.system_prompt.clone());
        Self {
            provider,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            listener: Arc::new(SyncMutex::new(None)),
        }
    }

    /// Append a user turn, compact if the history outgrew its bound, and
    /// generate the assistant reply.
    ///
    /// On provider failure the user turn stays appended (so the caller can
    /// retry without resubmitting) and the error is surfaced. An empty reply
    /// from the provider is valid: it is appended and returned as `""`.
    pub async fn get_response(&self, user_text: impl Into<String>) -> Result<String> {
        // Hold the state lock for the whole exchange so concurrent calls
        // against the same conversation serialize instead of interleaving
        // appends and compactions.
        let mut state = self.state.lock().await;

        state.history.push(Message::user(user_text));

        if state.history.len() > self.config.max_history_messages {
            self.compact(&mut state).await?;
        }

        tracing::debug!(history_len = state.history.len(), "requesting assistant reply");

        let completion = self
            .provider
            .complete(&state.history, self.config.reply_max_tokens)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "completion provider failed");
                Error::Provider(e)
            })?;

        state.history.push(Message::assistant(completion.content.clone()));
        Ok(completion.content)
    }

    /// Fold every turn after the persona (and any prior summary) into a new
    /// cumulative summary, then shrink the history to persona + summary.
    ///
    /// The just-appended user turn is summarized along with everything else;
    /// the reply is then generated from the compacted context.
    async fn compact(&self, state: &mut ConversationState) -> Result<()> {
        let start = match state.summary {
            Summary::None => 1,
            Summary::Cumulative(_) => 2,
        };

        tracing::info!(
            history_len = state.history.len(),
            summarized = state.history.len() - start,
            "compacting conversation history"
        );

        let mut request = Vec::with_capacity(state.history.len() - start + 1);
        request.push(Message::system(SUMMARIZE_INSTRUCTION));
        request.extend_from_slice(&state.history[start..]);

        let completion = self
            .provider
            .complete(&request, self.config.summary_max_tokens)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "summarization call failed");
                Error::Compaction(e)
            })?;

        // Fold the previous summary into the new one instead of discarding it.
        let merged = format!(
            "Previous conversation summary:\n{previous}\nRecent messages summary:\n{recent}",
            previous = state.summary.text(),
            recent = completion.content,
        );

        let persona = state.history[0].clone();
        state.history.clear();
        state.history.push(persona);
        state.history.push(Message::system(merged.clone()));
        state.summary = Summary::Cumulative(merged);

        tracing::info!("compaction complete");
        Ok(())
    }

    /// Replace the persona text.
    ///
    /// With `preserve_history` the persona message is swapped in place and
    /// all turns (including any summary) survive. Without it the
    /// conversation is reset to just the new persona message.
    pub async fn update_system_prompt(&self, new_prompt: impl Into<String>, preserve_history: bool) {
        let mut state = self.state.lock().await;
        state.set_system_prompt(new_prompt.into(), preserve_history);
    }

    /// Clear all turns and the summary, keeping the current persona.
    pub async fn reset_history(&self) {
        let mut state = self.state.lock().await;
        state.reset();
    }

    /// Attach a stream of persona updates.
    ///
    /// A listener task applies each observed value with history preserved;
    /// when updates outpace processing only the most recent value is applied
    /// (the watch channel drops intermediates). Replaces any existing
    /// listener; detach with [`ContextManager::detach_prompt_stream`].
    pub fn attach_prompt_stream(&self, mut updates: watch::Receiver<String>) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let manager = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // On detach, stop without applying a pending value.
                    biased;
                    _ = token.cancelled() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            // Sender dropped, nothing more to observe.
                            break;
                        }
                        let prompt = updates.borrow_and_update().clone();
                        tracing::debug!("applying persona update from stream");
                        manager.update_system_prompt(prompt, true).await;
                    }
                }
            }
        });

        if let Some(previous) = self.listener.lock().replace(cancel) {
            previous.cancel();
        }
    }

    /// Stop the persona-update listener, if one is attached.
    pub fn detach_prompt_stream(&self) {
        if let Some(cancel) = self.listener.lock().take() {
            cancel.cancel();
        }
    }

    /// Snapshot of the current history, persona message first
    pub async fn history(&self) -> Vec<Message> {
        self.state.lock().await.history.clone()
    }

    /// Current persona text
    pub async fn system_prompt(&self) -> String {
        self.state.lock().await.system_prompt.clone()
    }

    /// Current compaction summary state
    pub async fn summary(&self) -> Summary {
        self.state.lock().await.summary.clone()
    }
}
