//! Invocation payloads delivered by the platform
//!
//! The handler itself only sees [`InvocationRequest`]. Raw HTTP bodies map to
//! it directly; API-Gateway-style proxy events are decoded here first.

use crate::error::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One request as seen by the handler
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    /// Raw PDF bytes
    pub body: Vec<u8>,
    /// Request id supplied by the platform, if any
    pub request_id: Option<String>,
}

impl InvocationRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Proxy-integration request event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ProxyRequest {
    /// Parse an event document from a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::InvalidEvent {
            reason: e.to_string(),
        })
    }

    /// Decode the event body into handler input.
    ///
    /// Binary uploads arrive base64 encoded with `isBase64Encoded` set; any
    /// other body is taken as its UTF-8 bytes.
    pub fn into_invocation(self) -> Result<InvocationRequest> {
        let body = self.body.unwrap_or_default();
        let body = if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD.decode(body.trim())?
        } else {
            body.into_bytes()
        };

        let request_id = self
            .request_context
            .and_then(|ctx| ctx.request_id)
            .filter(|id| !id.is_empty());

        Ok(InvocationRequest { body, request_id })
    }
}

/// Proxy-integration response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}
