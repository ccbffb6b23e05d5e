pub mod ai;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
pub mod types;

pub use chat::ChatController;
pub use conversation::{Conversation, ConversationEvent, IngestState};
pub use document::DocumentIngestor;
pub use error::{ChatError, ChatResult};
pub use types::{Message, Page, Sender, TextFragment};
