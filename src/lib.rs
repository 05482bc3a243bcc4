//! PDF Summarizer Library
//!
//! This crate handles one uploaded PDF per request:
//! - writes the upload to a scratch file
//! - extracts its plain text with PDFium
//! - stores the text in DynamoDB under a generated id
//! - asks a completion endpoint for a summary and returns text and summary

pub mod config;
pub mod error;
pub mod handler;
pub mod pdf;
pub mod server;
pub mod source;
pub mod store;
pub mod summary;

pub use config::{AppConfig, Args, IdConfig, IdPolicy, StoreBackend};
pub use error::{Error, Result, Stage};
pub use handler::{content_hash, InvocationResponse, SummarizeHandler, SummaryResponse};
pub use server::{build_router, run_server};
