//! Error types for the PDF summarizer

use thiserror::Error;

/// Result type alias for the PDF summarizer
pub type Result<T> = std::result::Result<T, Error>;

/// Handler stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the inbound invocation payload
    Receive,
    WriteBlob,
    Extract,
    Store,
    Summarize,
    Respond,
    /// Configuration and client construction, before any request is served
    Startup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Receive => "receive",
            Stage::WriteBlob => "write_blob",
            Stage::Extract => "extract",
            Stage::Store => "store",
            Stage::Summarize => "summarize",
            Stage::Respond => "respond",
            Stage::Startup => "startup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for the PDF summarizer
#[derive(Error, Debug)]
pub enum Error {
    /// Scratch file could not be created
    #[error("Failed to create scratch file: {0}")]
    ScratchCreate(#[source] std::io::Error),

    /// Scratch file could not be written or synced
    #[error("Failed to write scratch file: {0}")]
    ScratchWrite(#[source] std::io::Error),

    /// Uploaded document is not a readable PDF
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDFium library error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Page content could not be obtained
    #[error("Text extraction failed: {reason}")]
    Extraction { reason: String },

    /// Page text could not be read
    #[error("Failed to read page text: {reason}")]
    ReadText { reason: String },

    /// Durable store write failed
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Completion provider answered with an error envelope or a failure status
    #[error("Completion provider error (status {status}): {message}")]
    CompletionProvider { status: u16, message: String },

    /// Completion response did not carry `choices[0].text`
    #[error("Unexpected completion response shape: {reason}")]
    UnexpectedResponseShape { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Proxy event body is not a valid event document
    #[error("Invalid proxy event: {reason}")]
    InvalidEvent { reason: String },

    /// Invalid or missing configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl Error {
    /// The handler stage this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            Error::ScratchCreate(_) | Error::ScratchWrite(_) => Stage::WriteBlob,
            Error::InvalidPdf { .. }
            | Error::Pdfium { .. }
            | Error::Extraction { .. }
            | Error::ReadText { .. } => Stage::Extract,
            Error::Storage { .. } => Stage::Store,
            Error::HttpRequest(_)
            | Error::CompletionProvider { .. }
            | Error::UnexpectedResponseShape { .. } => Stage::Summarize,
            Error::Serialization(_) => Stage::Respond,
            Error::Base64Decode(_) | Error::InvalidEvent { .. } => Stage::Receive,
            Error::Config { .. } => Stage::Startup,
        }
    }

    /// True when the caller sent an undecodable request rather than a
    /// document the pipeline failed on.
    pub fn is_bad_request(&self) -> bool {
        self.stage() == Stage::Receive
    }

    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors, provider payloads) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> &'static str {
        match self {
            Error::ScratchCreate(_) => "Failed to create file.",
            Error::ScratchWrite(_) => "Failed to write to file.",
            Error::InvalidPdf { .. } | Error::Pdfium { .. } => "Failed to open PDF.",
            Error::Extraction { .. } => "Failed to extract text from PDF.",
            Error::ReadText { .. } => "Failed to read text from PDF.",
            Error::Storage { .. } => "Failed to store text in DynamoDB.",
            Error::HttpRequest(_)
            | Error::CompletionProvider { .. }
            | Error::UnexpectedResponseShape { .. } => "Failed to generate summary.",
            Error::Serialization(_) => "Failed to marshal response.",
            Error::Base64Decode(_) | Error::InvalidEvent { .. } => {
                "Failed to decode request body."
            }
            Error::Config { .. } => "Invalid configuration.",
        }
    }
}
