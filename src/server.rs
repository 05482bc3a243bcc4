//! HTTP boundary using axum

use crate::config::AppConfig;
use crate::handler::{InvocationResponse, SummarizeHandler};
use crate::source::{InvocationRequest, ProxyResponse};
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Header carrying the platform request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Build the router serving `handler`
pub fn build_router(handler: Arc<SummarizeHandler>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", post(summarize_raw))
        .route("/summarize", post(summarize_raw))
        .route("/invoke", post(invoke_proxy))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(handler)
}

/// The request body is the PDF itself.
async fn summarize_raw(
    State(handler): State<Arc<SummarizeHandler>>,
    headers: HeaderMap,
    body: Bytes,
) -> InvocationResponse {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    handler
        .handle(InvocationRequest {
            body: body.to_vec(),
            request_id,
        })
        .await
}

/// The request body is a proxy-integration event; the reply is always a proxy
/// response, whatever the content type or shape of the body.
async fn invoke_proxy(
    State(handler): State<Arc<SummarizeHandler>>,
    body: Bytes,
) -> Json<ProxyResponse> {
    Json(handler.handle_proxy_body(&body).await)
}

async fn health() -> &'static str {
    "ok"
}

/// Build the handler from `config` and serve until Ctrl-C
pub async fn run_server(config: AppConfig) -> Result<()> {
    let handler = Arc::new(SummarizeHandler::from_config(&config).await?);
    let router = build_router(handler, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "PDF summarizer ready, waiting for requests..."
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("PDF summarizer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_invocation_response_into_response() {
        let response = InvocationResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: "text/plain; charset=utf-8",
            body: "Failed to open PDF.".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Failed to open PDF.");
    }
}
