//! Document ingestion: uploaded file → flattened prompt text.
//!
//! An ingestion moves through `Reading → Decoding → {Ready | Failed}`. Each
//! upload gets a fresh [`IngestTicket`] and empties the pending slot; a
//! slower, superseded ingestion may still finish but can no longer touch it.

pub mod pdf;

use crate::conversation::{Conversation, IngestState, IngestTicket};
use crate::error::{ChatError, ChatResult};
use crate::types::Page;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use pdf::PdfiumDecoder;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Turns raw file bytes into ordered pages of text fragments.
#[async_trait]
pub trait DocumentDecoder: Send + Sync {
    async fn decode(&self, bytes: Vec<u8>) -> Result<Vec<Page>, DecodeError>;
}

/// Concatenates pages as `"\n\nPage <N>:\n<text>"`, N starting at 1.
pub fn flatten_pages(pages: &[Page]) -> String {
    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        let _ = write!(text, "\n\nPage {}:\n{}", index + 1, page.text());
    }
    text
}

/// Whether `path` names a PDF file. Other uploads are ignored by the front-end.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

pub fn upload_notice(file_name: &str) -> String {
    format!("📄 1 file uploaded: {file_name}")
}

/// Result of a successful ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedDocument {
    pub file_name: String,
    pub page_count: usize,
    pub text: String,
    /// False if a newer upload started before this one finished.
    pub stored: bool,
}

#[derive(Clone)]
pub struct DocumentIngestor {
    conversation: Conversation,
    decoder: Arc<dyn DocumentDecoder>,
}

impl DocumentIngestor {
    pub fn new(conversation: Conversation, decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self {
            conversation,
            decoder,
        }
    }

    /// Ingest an upload whose bytes are already in memory.
    pub async fn ingest(&self, file_name: &str, bytes: Vec<u8>) -> ChatResult<IngestedDocument> {
        let ticket = self.dispatch(file_name);
        self.decode_into_pending(ticket, file_name, bytes).await
    }

    /// Ingest a file from disk. The acknowledgement is posted before the read.
    pub async fn ingest_file(&self, path: &Path) -> ChatResult<IngestedDocument> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let ticket = self.dispatch(&file_name);

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read upload");
                return Err(self.fail(ticket, ChatError::FileRead(e.to_string())));
            }
        };
        self.decode_into_pending(ticket, &file_name, bytes).await
    }

    fn dispatch(&self, file_name: &str) -> IngestTicket {
        info!(file = file_name, "upload received");
        self.conversation.set_attachment(file_name);
        self.conversation.push_system(upload_notice(file_name));
        self.conversation.begin_ingest()
    }

    async fn decode_into_pending(
        &self,
        ticket: IngestTicket,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ChatResult<IngestedDocument> {
        debug!(file = file_name, len = bytes.len(), "read upload bytes");
        if bytes.is_empty() {
            warn!(file = file_name, "upload is empty");
            return Err(self.fail(ticket, ChatError::EmptyFile));
        }

        self.conversation.advance_ingest(ticket, IngestState::Decoding);
        let pages = match self.decoder.decode(bytes).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(file = file_name, error = %e, "failed to decode document");
                return Err(self.fail(ticket, ChatError::DocumentDecode(e.0)));
            }
        };

        let text = flatten_pages(&pages);
        let stored = self.conversation.store_pending(ticket, text.clone());
        info!(file = file_name, pages = pages.len(), stored, "document text extracted");

        Ok(IngestedDocument {
            file_name: file_name.to_string(),
            page_count: pages.len(),
            text,
            stored,
        })
    }

    /// Posts the error notice and marks the ingestion failed. The pending slot is untouched.
    fn fail(&self, ticket: IngestTicket, err: ChatError) -> ChatError {
        self.conversation.advance_ingest(ticket, IngestState::Failed);
        if let Some(notice) = err.notice() {
            self.conversation.push_system(notice);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_two_pages() {
        let pages = vec![Page::from_strs(&["Hello", "world"]), Page::from_strs(&["Bye"])];
        assert_eq!(
            flatten_pages(&pages),
            "\n\nPage 1:\nHello world\n\nPage 2:\nBye"
        );
    }

    #[test]
    fn test_flatten_keeps_header_for_empty_page() {
        let pages = vec![Page::default(), Page::from_strs(&["tail"]), Page::default()];
        assert_eq!(
            flatten_pages(&pages),
            "\n\nPage 1:\n\n\nPage 2:\ntail\n\nPage 3:\n"
        );
    }

    #[test]
    fn test_flatten_headers_in_order() {
        let pages: Vec<Page> = (0..12)
            .map(|i| Page::from_strs(&[format!("p{i}").as_str()]))
            .collect();
        let text = flatten_pages(&pages);

        let mut cursor = 0;
        for k in 1..=12 {
            let header = format!("Page {k}:");
            let found = text[cursor..].find(&header).expect("header missing");
            cursor += found + header.len();
        }
        assert_eq!(text.matches("Page ").count(), 12);
    }

    #[test]
    fn test_flatten_no_pages() {
        assert_eq!(flatten_pages(&[]), "");
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("report.pdf")));
        assert!(is_pdf(Path::new("/tmp/REPORT.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_upload_notice() {
        assert_eq!(upload_notice("a.pdf"), "📄 1 file uploaded: a.pdf");
    }
}
