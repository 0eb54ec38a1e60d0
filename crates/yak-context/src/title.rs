//! Topic labeling for new conversations
//!
//! Given a conversation's first user message, produce a short topic label.
//! Stateless; reuses the summarization call shape of the context manager.

use yak_ai::{CompletionProvider, Message};

use crate::error::Result;

const TOPIC_INSTRUCTION: &str = "You are an expert summarizer that distills \
the topic of a conversation from the given content.";

/// Reply budget for topic labels; generous, the model stops early.
const TOPIC_MAX_TOKENS: u32 = 2000;

/// Produce a short topic label from a conversation's first user message.
///
/// Returns the label text, or an empty string when the provider returned no
/// content.
pub async fn summarize_topic(
    provider: &dyn CompletionProvider,
    first_message: &str,
) -> Result<String> {
    let request = vec![
        Message::system(TOPIC_INSTRUCTION),
        Message::user(format!(
            "Briefly summarize the topic of the following content:\n{first_message}"
        )),
    ];
    let completion = provider.complete(&request, TOPIC_MAX_TOKENS).await?;
    Ok(completion.content)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use yak_ai::{Completion, Role};

    use super::*;

    struct FixedProvider {
        reply: String,
        requests: Arc<Mutex<Vec<(Vec<Message>, u32)>>>,
    }

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            messages: &[Message],
            max_tokens: u32,
        ) -> yak_ai::Result<Completion> {
            self.requests.lock().push((messages.to_vec(), max_tokens));
            Ok(Completion::new(self.reply.clone()))
        }
    }

    #[tokio::test]
    async fn test_request_shape_and_label() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let provider = FixedProvider {
            reply: "Travel plans".to_string(),
            requests: requests.clone(),
        };

        let label = summarize_topic(&provider, "I want to visit Iceland in March")
            .await
            .unwrap();
        assert_eq!(label, "Travel plans");

        let recorded = requests.lock();
        assert_eq!(recorded.len(), 1);
        let (messages, max_tokens) = &recorded[0];
        assert_eq!(*max_tokens, TOPIC_MAX_TOKENS);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("I want to visit Iceland in March"));
    }

    #[tokio::test]
    async fn test_empty_content_yields_empty_label() {
        let provider = FixedProvider {
            reply: String::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let label = summarize_topic(&provider, "hello").await.unwrap();
        assert_eq!(label, "");
    }
}
