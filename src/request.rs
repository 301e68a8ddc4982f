//! Outbound request description.
//!
//! An [`OutboundRequest`] is produced fresh per call and is immutable once
//! built. The response mode is declared up front so the pipeline's
//! post-receive stage branches on a closed set instead of caller context.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether a JSON body may accompany this method.
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How the response body is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseMode {
    /// Fully buffered and parsed as JSON.
    #[default]
    Json,
    /// Fully buffered opaque bytes (file downloads).
    Blob,
    /// Incremental byte stream, handed back unread.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request path must start with '/': {0}")]
    RelativePath(String),

    #[error("request path must not carry a scheme, host or query string: {0}")]
    NotAPath(String),

    #[error("{method} requests cannot carry a body")]
    BodyNotAllowed { method: HttpMethod },

    #[error("failed to serialize request body: {0}")]
    Body(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    response_mode: ResponseMode,
}

impl OutboundRequest {
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> OutboundRequestBuilder {
        OutboundRequestBuilder {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Ok(None),
            response_mode: ResponseMode::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> OutboundRequestBuilder {
        Self::builder(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> OutboundRequestBuilder {
        Self::builder(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> OutboundRequestBuilder {
        Self::builder(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> OutboundRequestBuilder {
        Self::builder(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> OutboundRequestBuilder {
        Self::builder(HttpMethod::Delete, path)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }
}

pub struct OutboundRequestBuilder {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    // Serialization errors are deferred to `build()` so the chain stays fluent.
    body: Result<Option<Value>, String>,
    response_mode: ResponseMode,
}

impl OutboundRequestBuilder {
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = serde_json::to_value(body)
            .map(Some)
            .map_err(|e| e.to_string());
        self
    }

    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }

    pub fn build(self) -> Result<OutboundRequest, RequestError> {
        if !self.path.starts_with('/') {
            return Err(RequestError::RelativePath(self.path));
        }
        if self.path.contains("://") || self.path.contains('?') || self.path.contains('#') {
            return Err(RequestError::NotAPath(self.path));
        }
        let body = self.body.map_err(RequestError::Body)?;
        if body.is_some() && !self.method.allows_body() {
            return Err(RequestError::BodyNotAllowed {
                method: self.method,
            });
        }
        Ok(OutboundRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            body,
            response_mode: self.response_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_get_with_query() {
        let req = OutboundRequest::get("/companies")
            .query("search", "acme")
            .query("limit", 10)
            .build()
            .unwrap();
        assert_eq!(req.method(), HttpMethod::Get);
        assert_eq!(req.path(), "/companies");
        assert_eq!(
            req.query(),
            &[
                ("search".to_string(), "acme".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
        assert_eq!(req.response_mode(), ResponseMode::Json);
        assert!(req.body().is_none());
    }

    #[test]
    fn query_opt_skips_missing_values() {
        let req = OutboundRequest::post("/proposals/generate-ai")
            .query("opportunity_id", 3)
            .query_opt("additional_context", None::<String>)
            .build()
            .unwrap();
        assert_eq!(req.query().len(), 1);
    }

    #[test]
    fn rejects_paths_that_are_not_relative_paths() {
        assert_eq!(
            OutboundRequest::get("companies").build().unwrap_err(),
            RequestError::RelativePath("companies".into())
        );
        assert!(matches!(
            OutboundRequest::get("/companies?search=x").build(),
            Err(RequestError::NotAPath(_))
        ));
        assert!(matches!(
            OutboundRequest::get("/http://evil").build(),
            Err(RequestError::NotAPath(_))
        ));
    }

    #[test]
    fn rejects_body_on_get_and_delete() {
        let err = OutboundRequest::delete("/contacts/1")
            .json(&json!({"x": 1}))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::BodyNotAllowed {
                method: HttpMethod::Delete
            }
        );
    }

    #[test]
    fn stream_mode_is_declared_on_the_request() {
        let req = OutboundRequest::post("/ai/analyze-opportunity/stream")
            .json(&json!({"post_id": 7, "enable_cache": true}))
            .response_mode(ResponseMode::Stream)
            .build()
            .unwrap();
        assert_eq!(req.response_mode(), ResponseMode::Stream);
        assert_eq!(req.body(), Some(&json!({"post_id": 7, "enable_cache": true})));
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("TRACE"), None);
    }
}
