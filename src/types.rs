use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use uuid::Uuid;

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
            Sender::System => "System",
        }
    }
}

/// One entry of the conversation log. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    id: Uuid,
    sender: Sender,
    text: String,
    created_at: OffsetDateTime,
    timestamp: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        let created_at = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            created_at,
            timestamp: format_message_timestamp(created_at),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Display-formatted creation time, e.g. `03:07 PM`.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

fn format_message_timestamp(timestamp: OffsetDateTime) -> String {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).unwrap_or_default()
}

// ============================================
// Decoder Contract
// ============================================

/// A run of text on a page, in physical layout order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextFragment {
    pub content: String,
}

impl TextFragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub fragments: Vec<TextFragment>,
}

impl Page {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn from_strs(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().copied().map(TextFragment::new).collect(),
        }
    }

    /// Fragments joined with single spaces, no other normalization.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| fragment.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
