//! Request pipeline: the single egress point for every backend call.
//!
//! ```text
//! OutboundRequest → pre-send (credential) → transport (30 s) → post-receive (classify) → ApiResponse
//!                        │                                          │
//!                 getter failure: log,                     401: end session
//!                 send unauthenticated                     all failures: log + propagate
//! ```
//!
//! The pipeline performs exactly one attempt per call and never swallows a
//! failure; logging and the forced logout are side effects only.

mod classify;

use crate::auth::{CredentialBinding, TokenRequest};
use crate::request::{OutboundRequest, RequestError, ResponseMode};
use crate::streaming::StreamHandle;
use crate::transport::{HttpTransport, TransportError};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

/// Classified request failure.
///
/// Derived only from the transport outcome and status code. `Clone` so the
/// same value can be stored in hook state and returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    ValidationFailed(Value),

    #[error("server fault (HTTP {status})")]
    ServerFault { status: u16 },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Any other status, an undecodable success body, or a request that
    /// could not be constructed (no status).
    #[error("unexpected response{}: {raw}", format_status(.status))]
    Unknown { status: Option<u16>, raw: String },
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
}

impl PipelineError {
    /// HTTP status this error was derived from, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            PipelineError::Unauthorized => Some(401),
            PipelineError::Forbidden => Some(403),
            PipelineError::NotFound => Some(404),
            PipelineError::ValidationFailed(_) => Some(422),
            PipelineError::ServerFault { status } => Some(*status),
            PipelineError::NetworkUnreachable(_) => None,
            PipelineError::Unknown { status, .. } => *status,
        }
    }

    /// Stable class name used in log fields.
    pub fn class(&self) -> &'static str {
        match self {
            PipelineError::Unauthorized => "unauthorized",
            PipelineError::Forbidden => "forbidden",
            PipelineError::NotFound => "not_found",
            PipelineError::ValidationFailed(_) => "validation_failed",
            PipelineError::ServerFault { .. } => "server_fault",
            PipelineError::NetworkUnreachable(_) => "network_unreachable",
            PipelineError::Unknown { .. } => "unknown",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PipelineError::Unauthorized)
    }
}

impl From<RequestError> for PipelineError {
    fn from(e: RequestError) -> Self {
        PipelineError::Unknown {
            status: None,
            raw: e.to_string(),
        }
    }
}

/// Response body, shaped by the request's [`ResponseMode`].
pub enum ResponseBody {
    Json(Value),
    Blob(Bytes),
    Stream(StreamHandle),
}

impl ResponseBody {
    fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Json(_) => "json",
            ResponseBody::Blob(_) => "blob",
            ResponseBody::Stream(_) => "stream",
        }
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ResponseBody::Blob(b) => f.debug_tuple("Blob").field(&b.len()).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    request_id: String,
    body: ResponseBody,
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Correlation id sent with the request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, PipelineError> {
        let status = self.status;
        match self.body {
            ResponseBody::Json(v) => serde_json::from_value(v).map_err(|e| PipelineError::Unknown {
                status: Some(status),
                raw: format!("response did not match the expected shape: {}", e),
            }),
            other => Err(mode_mismatch(status, "json", &other)),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, PipelineError> {
        let status = self.status;
        match self.body {
            ResponseBody::Blob(b) => Ok(b),
            other => Err(mode_mismatch(status, "blob", &other)),
        }
    }

    pub fn into_stream(self) -> Result<StreamHandle, PipelineError> {
        let status = self.status;
        match self.body {
            ResponseBody::Stream(s) => Ok(s),
            other => Err(mode_mismatch(status, "stream", &other)),
        }
    }
}

fn mode_mismatch(status: u16, wanted: &str, got: &ResponseBody) -> PipelineError {
    PipelineError::Unknown {
        status: Some(status),
        raw: format!("expected a {} body, request produced {}", wanted, got.kind()),
    }
}

pub struct Pipeline {
    transport: Arc<HttpTransport>,
    credentials: Arc<CredentialBinding>,
    token_request: TokenRequest,
    return_to: Url,
}

impl Pipeline {
    pub fn new(
        transport: Arc<HttpTransport>,
        credentials: Arc<CredentialBinding>,
        token_request: TokenRequest,
        return_to: Url,
    ) -> Self {
        Self {
            transport,
            credentials,
            token_request,
            return_to,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialBinding> {
        &self.credentials
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn token_request(&self) -> &TokenRequest {
        &self.token_request
    }

    /// Send one request through all three stages.
    pub async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, PipelineError> {
        let request_id = Uuid::new_v4().to_string();

        let token = self.credentials.bearer_token(&self.token_request).await;

        let start = Instant::now();
        let resp = match self
            .transport
            .execute(&request, token.as_deref(), Some(&request_id))
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Err(self.reject(&request, classify::from_transport(&e), start)),
        };

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.reject(&request, classify::from_status(status, &body), start));
        }

        let headers = resp.headers().clone();
        let body = match request.response_mode() {
            ResponseMode::Json => {
                let bytes = resp.bytes().await.map_err(|e| {
                    self.reject(&request, classify::from_transport(&TransportError::Http(e)), start)
                })?;
                let value = decode_json(status, &bytes)
                    .map_err(|err| self.reject(&request, err, start))?;
                ResponseBody::Json(value)
            }
            ResponseMode::Blob => {
                let bytes = resp.bytes().await.map_err(|e| {
                    self.reject(&request, classify::from_transport(&TransportError::Http(e)), start)
                })?;
                ResponseBody::Blob(bytes)
            }
            ResponseMode::Stream => ResponseBody::Stream(StreamHandle::from_response(resp)),
        };

        debug!(
            http_status = status,
            method = request.method().as_str(),
            path = request.path(),
            request_id = request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "request succeeded"
        );

        Ok(ApiResponse {
            status,
            headers,
            request_id,
            body,
        })
    }

    /// `send` + decode the JSON body.
    pub async fn json<T: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<T, PipelineError> {
        self.send(request).await?.into_json()
    }

    /// `send` a blob-mode request and return the raw payload.
    pub async fn blob(&self, request: OutboundRequest) -> Result<Bytes, PipelineError> {
        self.send(request).await?.into_bytes()
    }

    /// Post-receive side effects for a failure: log, and end the session on 401.
    fn reject(&self, request: &OutboundRequest, err: PipelineError, start: Instant) -> PipelineError {
        let method = request.method().as_str();
        let path = request.path();
        let duration_ms = start.elapsed().as_millis() as u64;

        match &err {
            PipelineError::ValidationFailed(details) => error!(
                http_status = 422,
                method,
                path,
                duration_ms,
                details = %details,
                "validation error"
            ),
            PipelineError::NetworkUnreachable(reason) => error!(
                method,
                path,
                duration_ms,
                reason = reason.as_str(),
                "network error, no response received"
            ),
            other => error!(
                http_status = other.status(),
                error_class = other.class(),
                method,
                path,
                duration_ms,
                "request failed"
            ),
        }

        if err.is_unauthorized() && self.credentials.end_session(&self.return_to) {
            error!(return_to = %self.return_to, "unauthorized; session ended");
        }

        err
    }
}

fn decode_json(status: u16, bytes: &[u8]) -> Result<Value, PipelineError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|_| PipelineError::Unknown {
        status: Some(status),
        raw: String::from_utf8_lossy(bytes).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_success_body_decodes_to_null() {
        assert_eq!(decode_json(204, b"").unwrap(), Value::Null);
        assert_eq!(decode_json(200, b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn malformed_success_body_is_unknown_with_raw_text() {
        assert_eq!(
            decode_json(200, b"<html>").unwrap_err(),
            PipelineError::Unknown {
                status: Some(200),
                raw: "<html>".into()
            }
        );
    }

    #[test]
    fn error_accessors() {
        assert_eq!(PipelineError::Forbidden.status(), Some(403));
        assert_eq!(
            PipelineError::ValidationFailed(json!({})).class(),
            "validation_failed"
        );
        assert_eq!(PipelineError::NetworkUnreachable("x".into()).status(), None);
        assert!(PipelineError::Unauthorized.is_unauthorized());
        assert_eq!(
            PipelineError::Unknown {
                status: Some(418),
                raw: "teapot".into()
            }
            .to_string(),
            "unexpected response (HTTP 418): teapot"
        );
    }

    #[test]
    fn mode_mismatch_is_reported() {
        let resp = ApiResponse {
            status: 200,
            headers: HeaderMap::new(),
            request_id: "r".into(),
            body: ResponseBody::Json(json!([1])),
        };
        let err = resp.into_bytes().unwrap_err();
        assert!(matches!(err, PipelineError::Unknown { status: Some(200), .. }));
    }

    #[test]
    fn into_json_decodes_typed_values() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Company {
            id: i64,
            name: String,
        }
        let resp = ApiResponse {
            status: 200,
            headers: HeaderMap::new(),
            request_id: "r".into(),
            body: ResponseBody::Json(json!([{"id": 1, "name": "Acme Corp"}])),
        };
        let companies: Vec<Company> = resp.into_json().unwrap();
        assert_eq!(
            companies,
            vec![Company {
                id: 1,
                name: "Acme Corp".into()
            }]
        );
    }
}
