//! Shared fixture: a mockito server plus a client pointed at it.

#![allow(dead_code)]

use async_trait::async_trait;
use mapmyclient_sdk::auth::{AuthError, IdentityProvider, TokenRequest};
use mapmyclient_sdk::{ApiClient, ApiClientBuilder, ClientConfig};
use mockito::{Server, ServerGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const TEST_RETURN_TO: &str = "http://dashboard.test/";

/// Identity provider that hands out a fixed outcome and records logouts.
pub struct RecordingProvider {
    token: Result<String, AuthError>,
    token_calls: AtomicUsize,
    ended: Mutex<Vec<Url>>,
}

impl RecordingProvider {
    pub fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Ok(token.to_string()),
            token_calls: AtomicUsize::new(0),
            ended: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: AuthError) -> Arc<Self> {
        Arc::new(Self {
            token: Err(err),
            token_calls: AtomicUsize::new(0),
            ended: Mutex::new(Vec::new()),
        })
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn ended_sessions(&self) -> Vec<Url> {
        self.ended.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for RecordingProvider {
    async fn get_token(&self, _request: &TokenRequest) -> Result<String, AuthError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }

    fn end_session(&self, return_to: &Url) {
        self.ended.lock().unwrap().push(return_to.clone());
    }
}

/// Test fixture that manages a mock server.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/api", server.url());
        Self { server, base_url }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            return_to: TEST_RETURN_TO.to_string(),
            ..ClientConfig::default()
        }
    }

    /// Client with nothing installed in its credential binding.
    pub fn anonymous_client(&self) -> ApiClient {
        ApiClientBuilder::new()
            .config(self.config())
            .build()
            .expect("client builds")
    }

    pub fn client_with(&self, provider: Arc<RecordingProvider>) -> ApiClient {
        ApiClientBuilder::new()
            .config(self.config())
            .identity_provider(provider)
            .build()
            .expect("client builds")
    }
}

/// Base URL of a port nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}
