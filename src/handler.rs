//! Request handler
//!
//! One invocation runs `WriteBlob -> Extract -> Store -> Summarize -> Respond`
//! in order. The first failing stage ends the request; earlier side effects
//! (a stored record) are left in place.

use crate::config::{AppConfig, IdConfig, IdPolicy, StoreBackend};
use crate::error::{Error, Result};
use crate::pdf::{PdfiumTextExtractor, TextExtractor};
use crate::source::{InvocationRequest, ProxyRequest, ProxyResponse, ScratchFile};
use crate::store::{DocumentTextRecord, DynamoDbTextStore, InMemoryTextStore, TextStore};
use crate::summary::{OpenAiCompletionClient, Summarizer};
use axum::http::StatusCode;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Body returned to the caller on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResponse {
    pub text: String,
    pub summary: String,
}

/// Status, content type and body handed back to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl InvocationResponse {
    fn json(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: JSON_CONTENT_TYPE,
            body,
        }
    }

    fn failure(error: &Error) -> Self {
        let status = if error.is_bad_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE,
            body: error.client_message().to_string(),
        }
    }

    pub fn into_proxy_response(self) -> ProxyResponse {
        ProxyResponse {
            status_code: self.status.as_u16(),
            headers: HashMap::from([("Content-Type".to_string(), self.content_type.to_string())]),
            body: self.body,
            is_base64_encoded: false,
        }
    }
}

/// Hex SHA-256 of the uploaded bytes
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Orchestrates extraction, storage and summarization for one upload
pub struct SummarizeHandler {
    extractor: Arc<dyn TextExtractor>,
    store: Arc<dyn TextStore>,
    summarizer: Arc<dyn Summarizer>,
    ids: IdConfig,
    scratch_dir: PathBuf,
}

impl SummarizeHandler {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn TextStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            extractor,
            store,
            summarizer,
            ids: IdConfig::default(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_ids(mut self, ids: IdConfig) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Build the production clients described by `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let extractor: Arc<dyn TextExtractor> = match &config.pdfium_lib_dir {
            Some(dir) => Arc::new(PdfiumTextExtractor::with_library_dir(dir.clone())),
            None => Arc::new(PdfiumTextExtractor::new()),
        };

        let store: Arc<dyn TextStore> = match config.store.backend {
            StoreBackend::Dynamodb => {
                tracing::info!(table = %config.store.table_name, "Using DynamoDB text store");
                Arc::new(DynamoDbTextStore::from_config(&config.store).await)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory text store, stored text is lost on exit");
                Arc::new(InMemoryTextStore::new())
            }
        };

        let summarizer = Arc::new(OpenAiCompletionClient::new(config.completion.clone())?);

        Ok(Self::new(extractor, store, summarizer)
            .with_ids(config.ids.clone())
            .with_scratch_dir(config.scratch_dir.clone()))
    }

    /// Key the request's text is stored under
    pub fn document_id(&self, request: &InvocationRequest) -> String {
        match self.ids.policy {
            IdPolicy::ContentHash => content_hash(&request.body),
            IdPolicy::RequestId => request
                .request_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            IdPolicy::Fixed => self.ids.fixed_id.clone(),
        }
    }

    /// Run every stage and return the response record, or the first error.
    pub async fn process(&self, request: InvocationRequest) -> Result<SummaryResponse> {
        let id = self.document_id(&request);
        tracing::info!(id = %id, bytes = request.body.len(), "Processing upload");

        let scratch = ScratchFile::write(&self.scratch_dir, &request.body)?;

        // Move CPU-heavy PDF work to blocking thread pool
        let extractor = Arc::clone(&self.extractor);
        let path = scratch.path().to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&path))
            .await
            .map_err(|e| Error::Extraction {
                reason: format!("Task join error: {}", e),
            })??;
        drop(scratch);
        tracing::info!(id = %id, bytes = text.len(), "Extracted text");

        let record = DocumentTextRecord {
            id: id.clone(),
            text,
        };
        self.store.put_text(&record).await?;
        tracing::info!(id = %id, "Stored text");

        let summary = self.summarizer.summarize(&record.text).await?;
        tracing::info!(id = %id, bytes = summary.len(), "Generated summary");

        Ok(SummaryResponse {
            text: record.text,
            summary,
        })
    }

    /// Run the request and turn the outcome into a response.
    ///
    /// Failures are logged with their stage and full cause; the caller only
    /// receives the stage's static message.
    pub async fn handle(&self, request: InvocationRequest) -> InvocationResponse {
        let outcome = match self.process(request).await {
            Ok(response) => serde_json::to_string(&response).map_err(Error::from),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(body) => InvocationResponse::json(body),
            Err(error) => {
                tracing::error!(stage = %error.stage(), error = %error, "Request failed");
                InvocationResponse::failure(&error)
            }
        }
    }

    /// Handle a proxy-integration event.
    pub async fn handle_proxy(&self, event: ProxyRequest) -> ProxyResponse {
        let response = match event.into_invocation() {
            Ok(request) => self.handle(request).await,
            Err(error) => {
                tracing::warn!(stage = %error.stage(), error = %error, "Rejected proxy event");
                InvocationResponse::failure(&error)
            }
        };
        response.into_proxy_response()
    }

    /// Handle a raw proxy-integration event body.
    ///
    /// A body that is not an event document still gets a proxy response.
    pub async fn handle_proxy_body(&self, body: &[u8]) -> ProxyResponse {
        match ProxyRequest::from_slice(body) {
            Ok(event) => self.handle_proxy(event).await,
            Err(error) => {
                tracing::warn!(stage = %error.stage(), error = %error, "Rejected proxy event");
                InvocationResponse::failure(&error).into_proxy_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    enum Extraction {
        Text(&'static str),
        OpenFailure,
        ReadFailure,
    }

    struct FakeExtractor {
        outcome: Extraction,
        log: CallLog,
        /// Path and file contents observed during extraction
        seen: Mutex<Option<(PathBuf, Vec<u8>)>>,
    }

    impl TextExtractor for FakeExtractor {
        fn extract_text(&self, path: &Path) -> Result<String> {
            self.log.lock().push("extract");
            let contents = std::fs::read(path).unwrap_or_default();
            *self.seen.lock() = Some((path.to_path_buf(), contents));
            match self.outcome {
                Extraction::Text(text) => Ok(text.to_string()),
                Extraction::OpenFailure => Err(Error::InvalidPdf {
                    reason: "Not a valid PDF file".to_string(),
                }),
                Extraction::ReadFailure => Err(Error::ReadText {
                    reason: "page 1".to_string(),
                }),
            }
        }
    }

    struct RecordingStore {
        fail: bool,
        log: CallLog,
        records: Mutex<Vec<DocumentTextRecord>>,
    }

    #[async_trait]
    impl TextStore for RecordingStore {
        async fn put_text(&self, record: &DocumentTextRecord) -> Result<()> {
            self.log.lock().push("store");
            if self.fail {
                return Err(Error::Storage {
                    reason: "AccessDeniedException".to_string(),
                });
            }
            self.records.lock().push(record.clone());
            Ok(())
        }
    }

    struct RecordingSummarizer {
        reply: Option<&'static str>,
        log: CallLog,
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, text: &str) -> Result<String> {
            self.log.lock().push("summarize");
            self.texts.lock().push(text.to_string());
            match self.reply {
                Some(summary) => Ok(summary.to_string()),
                None => Err(Error::UnexpectedResponseShape {
                    reason: "`choices` is empty".to_string(),
                }),
            }
        }
    }

    struct Harness {
        handler: SummarizeHandler,
        extractor: Arc<FakeExtractor>,
        store: Arc<RecordingStore>,
        summarizer: Arc<RecordingSummarizer>,
        log: CallLog,
        scratch_dir: tempfile::TempDir,
    }

    fn harness(outcome: Extraction, store_fails: bool, reply: Option<&'static str>) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let extractor = Arc::new(FakeExtractor {
            outcome,
            log: log.clone(),
            seen: Mutex::new(None),
        });
        let store = Arc::new(RecordingStore {
            fail: store_fails,
            log: log.clone(),
            records: Mutex::new(Vec::new()),
        });
        let summarizer = Arc::new(RecordingSummarizer {
            reply,
            log: log.clone(),
            texts: Mutex::new(Vec::new()),
        });
        let scratch = tempfile::tempdir().unwrap();
        let handler = SummarizeHandler::new(extractor.clone(), store.clone(), summarizer.clone())
            .with_scratch_dir(scratch.path());
        Harness {
            handler,
            extractor,
            store,
            summarizer,
            log,
            scratch_dir: scratch,
        }
    }

    #[tokio::test]
    async fn test_hello_world_scenario() {
        let h = harness(Extraction::Text("Hello world."), false, Some(" A greeting."));
        let body = b"%PDF-1.4 hello".to_vec();

        let response = h.handler.handle(InvocationRequest::new(body.clone())).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(
            response.body,
            r#"{"text":"Hello world.","summary":" A greeting."}"#
        );
        assert_eq!(
            *h.store.records.lock(),
            vec![DocumentTextRecord {
                id: content_hash(&body),
                text: "Hello world.".to_string(),
            }]
        );
        assert_eq!(*h.summarizer.texts.lock(), vec!["Hello world.".to_string()]);
        assert_eq!(*h.log.lock(), vec!["extract", "store", "summarize"]);
    }

    #[tokio::test]
    async fn test_scratch_file_holds_body_and_is_removed() {
        let h = harness(Extraction::Text("text"), false, Some("summary"));
        h.handler
            .process(InvocationRequest::new(b"%PDF-1.7 bytes".to_vec()))
            .await
            .unwrap();

        let (path, contents) = h.extractor.seen.lock().clone().unwrap();
        assert_eq!(contents, b"%PDF-1.7 bytes");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_scratch_file_removed_on_failure() {
        let h = harness(Extraction::OpenFailure, false, Some("summary"));
        let result = h.handler.process(InvocationRequest::new(b"junk".to_vec())).await;
        assert!(result.is_err());

        let (path, _) = h.extractor.seen.lock().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_pdf_short_circuits() {
        let h = harness(Extraction::OpenFailure, false, Some("summary"));

        let error = h
            .handler
            .process(InvocationRequest::new(b"not a pdf".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidPdf { .. }));
        assert_eq!(*h.log.lock(), vec!["extract"]);

        let response = h
            .handler
            .handle(InvocationRequest::new(b"not a pdf".to_vec()))
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "Failed to open PDF.");
        assert!(h.store.records.lock().is_empty());
        assert!(h.summarizer.texts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_message() {
        let h = harness(Extraction::ReadFailure, false, Some("summary"));
        let response = h.handler.handle(InvocationRequest::new(b"%PDF".to_vec())).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "Failed to read text from PDF.");
        assert_eq!(*h.log.lock(), vec!["extract"]);
    }

    #[tokio::test]
    async fn test_store_failure_skips_summary() {
        let h = harness(Extraction::Text("text"), true, Some("summary"));

        let response = h.handler.handle(InvocationRequest::new(b"%PDF".to_vec())).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "Failed to store text in DynamoDB.");
        assert_eq!(*h.log.lock(), vec!["extract", "store"]);
        assert!(h.summarizer.texts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_stored_record() {
        let h = harness(Extraction::Text("stored anyway"), false, None);

        let error = h
            .handler
            .process(InvocationRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::UnexpectedResponseShape { .. }));
        assert_eq!(h.store.records.lock().len(), 1);
        assert_eq!(h.store.records.lock()[0].text, "stored anyway");
    }

    #[tokio::test]
    async fn test_missing_scratch_dir_fails_before_extraction() {
        let h = harness(Extraction::Text("text"), false, Some("summary"));
        let missing = h.scratch_dir.path().join("gone");
        let handler = SummarizeHandler::new(
            h.extractor.clone(),
            h.store.clone(),
            h.summarizer.clone(),
        )
        .with_scratch_dir(missing);

        let response = handler.handle(InvocationRequest::new(b"%PDF".to_vec())).await;
        assert_eq!(response.body, "Failed to create file.");
        assert!(h.log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stored_text_matches_returned_text() {
        let h = harness(Extraction::Text("Ünïcödé text\nwith lines"), false, Some("s"));
        let response = h
            .handler
            .process(InvocationRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(h.store.records.lock()[0].text, response.text);
        assert_eq!(h.summarizer.texts.lock()[0], response.text);
    }

    #[tokio::test]
    async fn test_empty_text_is_still_summarized() {
        let h = harness(Extraction::Text(""), false, Some("nothing here"));
        let response = h
            .handler
            .process(InvocationRequest::new(b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.text, "");
        assert_eq!(response.summary, "nothing here");
        assert_eq!(*h.log.lock(), vec!["extract", "store", "summarize"]);
    }

    #[test]
    fn test_document_id_policies() {
        let h = harness(Extraction::Text("t"), false, Some("s"));
        let request = InvocationRequest::new(b"abc".to_vec()).with_request_id("req-42");

        assert_eq!(
            h.handler.document_id(&request),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let by_request = SummarizeHandler::new(
            h.extractor.clone(),
            h.store.clone(),
            h.summarizer.clone(),
        )
        .with_ids(IdConfig {
            policy: IdPolicy::RequestId,
            fixed_id: String::new(),
        });
        assert_eq!(by_request.document_id(&request), "req-42");

        let generated = by_request.document_id(&InvocationRequest::new(b"abc".to_vec()));
        assert!(uuid::Uuid::parse_str(&generated).is_ok());

        let fixed = SummarizeHandler::new(
            h.extractor.clone(),
            h.store.clone(),
            h.summarizer.clone(),
        )
        .with_ids(IdConfig::default().with_policy(IdPolicy::Fixed));
        assert_eq!(fixed.document_id(&request), "some-unique-id");
    }

    #[tokio::test]
    async fn test_same_content_overwrites_same_key() {
        let h = harness(Extraction::Text("same"), false, Some("s"));
        let store = Arc::new(InMemoryTextStore::new());
        let handler = SummarizeHandler::new(h.extractor.clone(), store.clone(), h.summarizer.clone())
            .with_scratch_dir(h.scratch_dir.path());

        for _ in 0..2 {
            handler
                .process(InvocationRequest::new(b"%PDF same".to_vec()))
                .await
                .unwrap();
        }

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&content_hash(b"%PDF same")).as_deref(), Some("same"));
    }

    #[tokio::test]
    async fn test_proxy_event_round_trip() {
        let h = harness(Extraction::Text("Hello world."), false, Some(" A greeting."));
        let event: ProxyRequest = serde_json::from_str(
            r#"{"body": "JVBERi0xLjQ=", "isBase64Encoded": true, "requestContext": {"requestId": "abc"}}"#,
        )
        .unwrap();

        let response = h.handler.handle_proxy(event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(
            response.body,
            r#"{"text":"Hello world.","summary":" A greeting."}"#
        );
        let (_, contents) = h.extractor.seen.lock().clone().unwrap();
        assert_eq!(contents, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_proxy_body_not_json() {
        let h = harness(Extraction::Text("t"), false, Some("s"));

        let response = h.handler.handle_proxy_body(b"not an event").await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.headers["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(response.body, "Failed to decode request body.");
        assert!(h.log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_proxy_body_decodes_event() {
        let h = harness(Extraction::Text("Hello world."), false, Some(" A greeting."));

        let response = h
            .handler
            .handle_proxy_body(br#"{"body": "JVBERi0xLjQ=", "isBase64Encoded": true}"#)
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(*h.log.lock(), vec!["extract", "store", "summarize"]);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_server_error() {
        let h = harness(Extraction::Text("t"), true, Some("s"));
        let response = h.handler.handle(InvocationRequest::new(b"%PDF".to_vec())).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_proxy_event_bad_base64() {
        let h = harness(Extraction::Text("t"), false, Some("s"));
        let event = ProxyRequest {
            body: Some("%%%".to_string()),
            is_base64_encoded: true,
            ..ProxyRequest::default()
        };

        let response = h.handler.handle_proxy(event).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, "Failed to decode request body.");
        assert!(h.log.lock().is_empty());
    }
}
