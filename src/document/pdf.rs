use super::{DecodeError, DocumentDecoder};
use crate::types::{Page, TextFragment};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;

impl From<PdfiumError> for DecodeError {
    fn from(err: PdfiumError) -> Self {
        DecodeError(format!("{:?}", err))
    }
}

/// PDF decoder backed by the pdfium library.
///
/// The library is bound on every decode, from `library_dir` when set and the
/// system search path otherwise. Decoding runs on the blocking pool since
/// pdfium is neither async-aware nor `Send`.
#[derive(Clone, Debug, Default)]
pub struct PdfiumDecoder {
    library_dir: Option<PathBuf>,
}

impl PdfiumDecoder {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, DecodeError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                let lib_path = dir.join(Pdfium::pdfium_platform_library_name());
                Pdfium::bind_to_library(&lib_path).or_else(|_| Pdfium::bind_to_system_library())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| DecodeError(format!("Failed to bind pdfium: {:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, DecodeError> {
        let pdfium = self.bind()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None)?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let text = page.text()?;
            let fragments = text
                .segments()
                .iter()
                .map(|segment| TextFragment::new(segment.text()))
                .collect();
            pages.push(Page::new(fragments));
        }
        Ok(pages)
    }
}

#[async_trait]
impl DocumentDecoder for PdfiumDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<Vec<Page>, DecodeError> {
        let decoder = self.clone();
        tokio::task::spawn_blocking(move || decoder.extract_pages(&bytes))
            .await
            .map_err(|e| DecodeError(format!("decode task failed: {e}")))?
    }
}
