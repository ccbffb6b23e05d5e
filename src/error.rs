//! Error types surfaced by the chat controller and document ingestor.

use thiserror::Error;

pub const GENERATION_ERROR_NOTICE: &str = "Error fetching response.";
pub const EMPTY_FILE_NOTICE: &str = "Error: Empty file data.";
pub const DECODE_ERROR_NOTICE: &str = "Error parsing PDF file.";
pub const FILE_READ_NOTICE: &str = "Error reading file.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Nothing to send. Never shown to the user.
    #[error("nothing to send")]
    EmptyInput,

    #[error("uploaded file is empty")]
    EmptyFile,

    #[error("failed to read file: {0}")]
    FileRead(String),

    #[error("failed to decode document: {0}")]
    DocumentDecode(String),

    #[error("generation request failed: {0}")]
    GenerationRequest(String),
}

impl ChatError {
    /// Fixed, non-diagnostic text appended to the conversation for this error.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ChatError::EmptyInput => None,
            ChatError::EmptyFile => Some(EMPTY_FILE_NOTICE),
            ChatError::FileRead(_) => Some(FILE_READ_NOTICE),
            ChatError::DocumentDecode(_) => Some(DECODE_ERROR_NOTICE),
            ChatError::GenerationRequest(_) => Some(GENERATION_ERROR_NOTICE),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_hide_detail() {
        let err = ChatError::GenerationRequest("connection reset by peer".into());
        assert_eq!(err.notice(), Some("Error fetching response."));

        let err = ChatError::DocumentDecode("xref table missing".into());
        assert_eq!(err.notice(), Some("Error parsing PDF file."));
    }

    #[test]
    fn test_empty_input_is_silent() {
        assert_eq!(ChatError::EmptyInput.notice(), None);
    }
}
