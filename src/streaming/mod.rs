//! Streaming analysis consumer.
//!
//! The AI analysis endpoint answers with newline-delimited JSON produced
//! incrementally, so it cannot go through the buffered post-receive stage.
//! [`StreamingConsumer`] attaches the credential itself, issues the call
//! directly against the base URL, and hands back a [`StreamHandle`] once the
//! status line is known to be 2xx.
//!
//! There is no overall deadline on this path: a stalled stream waits until the
//! underlying connection errors. A mid-stream failure is terminal; recovery
//! means starting a new call.

mod handle;
mod records;

pub use handle::{StreamEvent, StreamHandle};
pub use records::{RecordStream, MAX_RECORD_BYTES};

use crate::auth::{CredentialBinding, TokenRequest};
use crate::request::{OutboundRequest, RequestError, ResponseMode};
use crate::transport::{HttpTransport, TransportError};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const ANALYZE_OPPORTUNITY_STREAM_PATH: &str = "/ai/analyze-opportunity/stream";

#[derive(Debug, thiserror::Error)]
pub enum StreamTransportError {
    #[error("stream request rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream connection failed: {0}")]
    Connect(String),

    #[error("stream interrupted: {0}")]
    Read(String),

    #[error("malformed stream record: {0}")]
    Decode(String),

    #[error("invalid stream request: {0}")]
    Request(#[from] RequestError),
}

impl StreamTransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamTransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for StreamTransportError {
    fn from(e: TransportError) -> Self {
        StreamTransportError::Connect(e.to_string())
    }
}

pub struct StreamingConsumer {
    transport: Arc<HttpTransport>,
    credentials: Arc<CredentialBinding>,
    token_request: TokenRequest,
}

impl StreamingConsumer {
    pub fn new(
        transport: Arc<HttpTransport>,
        credentials: Arc<CredentialBinding>,
        token_request: TokenRequest,
    ) -> Self {
        Self {
            transport,
            credentials,
            token_request,
        }
    }

    /// Start a streaming opportunity analysis for one post.
    pub async fn analyze_stream(
        &self,
        post_id: i64,
        use_cache: bool,
    ) -> Result<StreamHandle, StreamTransportError> {
        let request = OutboundRequest::post(ANALYZE_OPPORTUNITY_STREAM_PATH)
            .json(&json!({ "post_id": post_id, "enable_cache": use_cache }))
            .response_mode(ResponseMode::Stream)
            .build()?;
        self.open(request).await
    }

    /// Open any stream-mode request. Fails fast on a non-2xx status before
    /// any chunk is produced.
    pub async fn open(&self, request: OutboundRequest) -> Result<StreamHandle, StreamTransportError> {
        let request_id = Uuid::new_v4().to_string();
        let token = self.credentials.bearer_token(&self.token_request).await;

        let resp = self
            .transport
            .execute(&request, token.as_deref(), Some(&request_id))
            .await
            .map_err(|e| {
                warn!(path = request.path(), error = %e, "stream connection failed");
                StreamTransportError::from(e)
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                http_status = status,
                path = request.path(),
                request_id = request_id.as_str(),
                "stream request rejected"
            );
            return Err(StreamTransportError::Status { status, body });
        }

        info!(
            http_status = status,
            path = request.path(),
            request_id = request_id.as_str(),
            "stream opened"
        );
        Ok(StreamHandle::from_response(resp))
    }
}
