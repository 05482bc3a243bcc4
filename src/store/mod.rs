//! Durable storage of extracted text

mod dynamodb;
mod memory;

pub use dynamodb::DynamoDbTextStore;
pub use memory::InMemoryTextStore;

use crate::error::Result;
use async_trait::async_trait;

/// Attribute holding the document identifier
pub const ID_ATTRIBUTE: &str = "PaperID";
/// Attribute holding the extracted text
pub const TEXT_ATTRIBUTE: &str = "Text";

/// One stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTextRecord {
    pub id: String,
    pub text: String,
}

/// Write-only key/value store for extracted text.
///
/// `put_text` overwrites any record already stored under the same id.
#[async_trait]
pub trait TextStore: Send + Sync {
    async fn put_text(&self, record: &DocumentTextRecord) -> Result<()>;
}
