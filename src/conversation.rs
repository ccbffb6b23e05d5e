//! Shared session state for one chat session.
//!
//! The controller and the ingestor each hold a [`Conversation`] handle and
//! mutate it between suspension points. Locks are never held across an
//! `.await`, so in-flight sends and ingestions interleave freely while the
//! log stays append-only and the pending document stays a single slot.

use crate::types::{Message, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 256;

/// Progress of the most recent ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IngestState {
    #[default]
    Idle,
    Reading,
    Decoding,
    Ready,
    Failed,
}

/// Notifications for renderers.
#[derive(Clone, Debug, PartialEq)]
pub enum ConversationEvent {
    MessageAppended(Message),
    ComposingChanged(bool),
    AttachmentChanged(Option<String>),
}

/// Identifies one ingestion. Only the latest ticket may write the pending slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct IngestTicket(u64);

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    pending: Option<String>,
    attachment: Option<String>,
    in_flight_sends: usize,
    latest_ticket: u64,
    ingest_state: IngestState,
}

#[derive(Clone)]
pub struct Conversation {
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<ConversationEvent>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Callers hold the state lock so events go out in log order.
    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine; the log is the source of truth.
        let _ = self.events.send(event);
    }

    // ============================================
    // Message Log
    // ============================================

    pub fn push(&self, message: Message) -> Message {
        let mut state = self.lock();
        state.messages.push(message.clone());
        debug!(sender = ?message.sender(), id = %message.id(), "message appended");
        self.emit(ConversationEvent::MessageAppended(message.clone()));
        message
    }

    pub fn push_system(&self, text: impl Into<String>) -> Message {
        self.push(Message::system(text))
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    /// User and assistant messages only, in log order.
    pub fn history(&self) -> Vec<Message> {
        self.lock()
            .messages
            .iter()
            .filter(|msg| matches!(msg.sender(), Sender::User | Sender::Assistant))
            .cloned()
            .collect()
    }

    // ============================================
    // Composing State
    // ============================================

    pub fn is_composing(&self) -> bool {
        self.lock().in_flight_sends > 0
    }

    /// Marks a send as in flight until the returned guard is dropped.
    pub fn begin_composing(&self) -> ComposingGuard {
        {
            let mut state = self.lock();
            state.in_flight_sends += 1;
            if state.in_flight_sends == 1 {
                self.emit(ConversationEvent::ComposingChanged(true));
            }
        }
        ComposingGuard {
            conversation: self.clone(),
        }
    }

    fn end_composing(&self) {
        let mut state = self.lock();
        state.in_flight_sends = state.in_flight_sends.saturating_sub(1);
        if state.in_flight_sends == 0 {
            self.emit(ConversationEvent::ComposingChanged(false));
        }
    }

    // ============================================
    // Pending Document & Attachment Label
    // ============================================

    pub fn pending_text(&self) -> Option<String> {
        self.lock()
            .pending
            .clone()
            .filter(|text| !text.is_empty())
    }

    pub fn attachment(&self) -> Option<String> {
        self.lock().attachment.clone()
    }

    pub fn set_attachment(&self, file_name: impl Into<String>) {
        let file_name = file_name.into();
        let mut state = self.lock();
        state.attachment = Some(file_name.clone());
        self.emit(ConversationEvent::AttachmentChanged(Some(file_name)));
    }

    /// Empties the pending slot and the attachment label.
    pub fn clear_pending(&self) {
        let mut state = self.lock();
        state.pending = None;
        if state.attachment.take().is_some() {
            self.emit(ConversationEvent::AttachmentChanged(None));
        }
    }

    // ============================================
    // Ingestion Tracking
    // ============================================

    pub fn ingest_state(&self) -> IngestState {
        self.lock().ingest_state
    }

    /// Starts a fresh ingestion; any earlier ticket is superseded.
    ///
    /// Text from an earlier upload is discarded here, so nothing is attached
    /// under the new label until this ingestion stores its own text. The
    /// attachment label is left alone.
    pub fn begin_ingest(&self) -> IngestTicket {
        let mut state = self.lock();
        state.pending = None;
        state.latest_ticket += 1;
        state.ingest_state = IngestState::Reading;
        IngestTicket(state.latest_ticket)
    }

    /// Records progress for `ticket`. Returns false if the ticket was superseded.
    pub fn advance_ingest(&self, ticket: IngestTicket, next: IngestState) -> bool {
        let mut state = self.lock();
        if state.latest_ticket != ticket.0 {
            return false;
        }
        state.ingest_state = next;
        true
    }

    /// Stores extracted text if `ticket` is still the latest ingestion.
    pub fn store_pending(&self, ticket: IngestTicket, text: String) -> bool {
        let mut state = self.lock();
        if state.latest_ticket != ticket.0 {
            debug!(?ticket, "discarding text from superseded ingestion");
            return false;
        }
        state.pending = Some(text);
        state.ingest_state = IngestState::Ready;
        true
    }
}

/// Releases the composing state on drop, on every exit path.
pub struct ComposingGuard {
    conversation: Conversation,
}

impl Drop for ComposingGuard {
    fn drop(&mut self) {
        self.conversation.end_composing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_insertion_order() {
        let conversation = Conversation::new();
        conversation.push(Message::user("one"));
        conversation.push_system("two");
        conversation.push(Message::assistant("three"));

        let texts: Vec<_> = conversation
            .messages()
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_history_excludes_system_messages() {
        let conversation = Conversation::new();
        conversation.push_system("📄 1 file uploaded: a.pdf");
        conversation.push(Message::user("hi"));
        conversation.push(Message::assistant("hello"));
        conversation.push_system("Error fetching response.");

        let history = conversation.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender(), Sender::User);
        assert_eq!(history[1].sender(), Sender::Assistant);
    }

    #[test]
    fn test_composing_guard_counts_overlapping_sends() {
        let conversation = Conversation::new();
        assert!(!conversation.is_composing());

        let first = conversation.begin_composing();
        let second = conversation.begin_composing();
        drop(first);
        assert!(conversation.is_composing());
        drop(second);
        assert!(!conversation.is_composing());
    }

    #[test]
    fn test_superseded_ticket_cannot_store() {
        let conversation = Conversation::new();
        let old = conversation.begin_ingest();
        let new = conversation.begin_ingest();

        assert!(!conversation.store_pending(old, "stale".into()));
        assert_eq!(conversation.pending_text(), None);

        assert!(conversation.store_pending(new, "fresh".into()));
        assert_eq!(conversation.pending_text().as_deref(), Some("fresh"));
        assert_eq!(conversation.ingest_state(), IngestState::Ready);
    }

    #[test]
    fn test_begin_ingest_discards_earlier_text_but_keeps_label() {
        let conversation = Conversation::new();
        let first = conversation.begin_ingest();
        conversation.store_pending(first, "earlier".into());
        conversation.set_attachment("next.pdf");

        let _second = conversation.begin_ingest();

        assert_eq!(conversation.pending_text(), None);
        assert_eq!(conversation.attachment().as_deref(), Some("next.pdf"));
        assert_eq!(conversation.ingest_state(), IngestState::Reading);
    }

    #[test]
    fn test_clear_pending_drops_label() {
        let conversation = Conversation::new();
        conversation.set_attachment("report.pdf");
        let ticket = conversation.begin_ingest();
        conversation.store_pending(ticket, "text".into());

        conversation.clear_pending();
        assert_eq!(conversation.pending_text(), None);
        assert_eq!(conversation.attachment(), None);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let conversation = Conversation::new();
        let mut rx = conversation.subscribe();

        let guard = conversation.begin_composing();
        conversation.push(Message::user("ping"));
        drop(guard);

        assert_eq!(
            rx.recv().await.unwrap(),
            ConversationEvent::ComposingChanged(true)
        );
        match rx.recv().await.unwrap() {
            ConversationEvent::MessageAppended(msg) => assert_eq!(msg.text(), "ping"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            ConversationEvent::ComposingChanged(false)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_events_follow_log_order_across_threads() {
        let conversation = Conversation::new();
        let mut rx = conversation.subscribe();

        // 80 messages plus at most 160 composing events stay under EVENT_CAPACITY
        let tasks: Vec<_> = (0..4)
            .map(|worker| {
                let conversation = conversation.clone();
                tokio::spawn(async move {
                    for i in 0..20 {
                        let _guard = conversation.begin_composing();
                        conversation.push(Message::user(format!("{worker}-{i}")));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut appended = Vec::new();
        let mut toggles = 0usize;
        let mut composing = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ConversationEvent::MessageAppended(msg) => appended.push(msg.id()),
                ConversationEvent::ComposingChanged(flag) => {
                    // Composing notifications alternate strictly
                    assert_ne!(flag, composing);
                    composing = flag;
                    toggles += 1;
                }
                ConversationEvent::AttachmentChanged(_) => {}
            }
        }
        assert!(!composing);
        assert!(toggles >= 2);

        let logged: Vec<_> = conversation.messages().iter().map(|m| m.id()).collect();
        assert_eq!(appended, logged);
    }
}
