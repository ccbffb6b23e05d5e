//! Conversation controller: one request/response cycle per send.

use crate::ai::Generator;
use crate::conversation::Conversation;
use crate::error::{ChatError, ChatResult};
use crate::types::Message;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FALLBACK_REPLY: &str = "AI couldn't generate a reply.";
pub const ATTACHMENT_MARKER: &str = "[Attached Document Content]";

/// Combines typed text and pending document text into the outbound prompt.
///
/// Returns `None` when there is nothing to send.
pub fn compose_prompt(input: &str, document: Option<&str>) -> Option<String> {
    let document = document.filter(|text| !text.is_empty());
    match (input.is_empty(), document) {
        (false, Some(doc)) => Some(format!("{input}\n\n{ATTACHMENT_MARKER}\n{doc}")),
        (false, None) => Some(input.to_string()),
        (true, Some(doc)) => Some(doc.to_string()),
        (true, None) => None,
    }
}

#[derive(Clone)]
pub struct ChatController {
    conversation: Conversation,
    generator: Arc<dyn Generator>,
}

impl ChatController {
    pub fn new(conversation: Conversation, generator: Arc<dyn Generator>) -> Self {
        Self {
            conversation,
            generator,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Send typed input, with any pending document attached.
    ///
    /// Returns the assistant reply. `EmptyInput` leaves the session untouched;
    /// `GenerationRequest` has already been posted to the log as a system notice
    /// and keeps the pending document for the next send.
    pub async fn send(&self, input: &str) -> ChatResult<Message> {
        let trimmed = input.trim();
        let pending = self.conversation.pending_text();
        let Some(prompt) = compose_prompt(trimmed, pending.as_deref()) else {
            debug!("ignoring empty send");
            return Err(ChatError::EmptyInput);
        };

        if !trimmed.is_empty() {
            self.conversation.push(Message::user(trimmed));
        }

        let _composing = self.conversation.begin_composing();
        info!(
            prompt_len = prompt.len(),
            with_document = pending.is_some(),
            "dispatching generation request"
        );

        match self.generator.generate(&prompt).await {
            Ok(reply) => {
                let text = reply.unwrap_or_else(|| {
                    warn!("generation returned no usable text");
                    FALLBACK_REPLY.to_string()
                });
                let message = self.conversation.push(Message::assistant(text));
                self.conversation.clear_pending();
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "generation request failed");
                let err = ChatError::GenerationRequest(e.to_string());
                if let Some(notice) = err.notice() {
                    self.conversation.push_system(notice);
                }
                Err(err)
            }
        }
    }
}
