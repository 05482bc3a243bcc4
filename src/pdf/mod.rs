//! PDF processing layer
//!
//! This module turns an uploaded document into flat text using PDFium.

mod reader;

pub use reader::{check_pdf_header, concat_pages, PdfiumTextExtractor, TextExtractor};
