//! Plain-text extraction with PDFium

use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Produces the flattened text content of a PDF on disk.
///
/// Implementations block; callers run them on the blocking thread pool.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Text extractor backed by the PDFium shared library
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    library_dir: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for the PDFium library in `dir` before the default locations.
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    /// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
    fn create_pdfium(&self) -> Result<Pdfium> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                let dir = dir.to_string_lossy().into_owned();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    dir.as_str(),
                ))
                .or_else(|_| Self::bind_default_locations())
            }
            None => Self::bind_default_locations(),
        }
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

        Ok(Pdfium::new(bindings))
    }

    fn bind_default_locations() -> std::result::Result<Box<dyn PdfiumLibraryBindings>, PdfiumError>
    {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/pdfium/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
    }

    fn map_pdfium_error(err: PdfiumError) -> Error {
        match err {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                Error::InvalidPdf {
                    reason: "PDF is password protected".to_string(),
                }
            }
            _ => Error::InvalidPdf {
                reason: format!("{}", err),
            },
        }
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path).map_err(|e| Error::InvalidPdf {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        check_pdf_header(&data)?;

        let pdfium = self.create_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&data, None)
            .map_err(Self::map_pdfium_error)?;

        let pages = document.pages();
        tracing::debug!(page_count = pages.len(), "Opened PDF");

        concat_pages((0..pages.len()).map(|index| {
            let page = pages.get(index).map_err(|e| Error::Extraction {
                reason: format!("Failed to get page {}: {}", index + 1, e),
            })?;
            let text = page.text().map_err(|e| Error::ReadText {
                reason: format!("Failed to read text of page {}: {}", index + 1, e),
            })?;
            Ok(text.all())
        }))
    }
}

/// Reject data that does not start with the `%PDF` marker.
pub fn check_pdf_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

/// Join page texts in document order. The first failing page aborts.
pub fn concat_pages<I>(pages: I) -> Result<String>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut text = String::new();
    for page in pages {
        text.push_str(&page?);
    }
    Ok(text)
}
