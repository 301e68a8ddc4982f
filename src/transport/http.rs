use crate::request::{OutboundRequest, ResponseMode};
use crate::Result;
use reqwest::header::ACCEPT;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// Header carrying our own per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL without trailing slash; request paths are appended verbatim.
    pub base_url: String,
    /// Ceiling for buffered (json/blob) requests.
    pub timeout: Duration,
}

/// Executes [`OutboundRequest`]s against the configured base URL.
///
/// Two reqwest clients share the same tuning: one bounded by the request
/// timeout for buffered responses, one without an overall deadline for
/// streamed bodies (it only bounds connection establishment).
pub struct HttpTransport {
    client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Self::tuned_builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        let stream_client = Self::tuned_builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            stream_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    fn tuned_builder() -> reqwest::ClientBuilder {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("MMC_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(16),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("MMC_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("MMC_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        builder
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request. No retries; the raw response is returned whatever its status.
    pub async fn execute(
        &self,
        request: &OutboundRequest,
        bearer: Option<&str>,
        request_id: Option<&str>,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        let client = match request.response_mode() {
            ResponseMode::Stream => &self.stream_client,
            ResponseMode::Json | ResponseMode::Blob => &self.client,
        };

        let url = self.url_for(request.path());
        let mut req = client.request(request.method().into(), &url);

        if !request.query().is_empty() {
            req = req.query(request.query());
        }

        // `json` sets the content type; bodiless requests carry none.
        if let Some(body) = request.body() {
            req = req.json(body);
        }

        req = match request.response_mode() {
            ResponseMode::Json => req.header(ACCEPT, "application/json"),
            ResponseMode::Blob => req.header(ACCEPT, "*/*"),
            ResponseMode::Stream => req.header(ACCEPT, "application/x-ndjson, application/json"),
        };

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        if let Some(id) = request_id {
            req = req.header(REQUEST_ID_HEADER, id);
        }

        req.send().await.map_err(TransportError::Http)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// True when no response was received at all (connect failure, timeout, reset).
    pub fn is_no_response(&self) -> bool {
        match self {
            TransportError::Http(e) => !e.is_builder() && e.status().is_none(),
            TransportError::Other(_) => false,
        }
    }
}
