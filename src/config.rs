//! Client configuration.
//!
//! Every value here is supplied by the deployment and treated as opaque; the
//! only check performed is that URL-valued settings parse.
//!
//! Sources, highest precedence first: builder overrides, environment
//! variables, an optional YAML file, built-in defaults.

use crate::auth::TokenRequest;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_APP_TITLE: &str = "MapMyClient";
pub const DEFAULT_RETURN_TO: &str = "http://localhost:5173";
pub const DEFAULT_AUDIENCE: &str = "https://api.mapmyclient.com";
pub const DEFAULT_SCOPE: &str = "openid profile email";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Identity provider settings consumed by the pipeline.
///
/// `domain` and `client_id` are carried for the host's login integration; the
/// pipeline itself only uses `audience` and `scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub audience: String,
    pub scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            domain: None,
            client_id: None,
            audience: DEFAULT_AUDIENCE.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every relative request path is appended to (e.g. `https://host/api`).
    pub api_base_url: String,
    pub app_title: String,
    /// Application origin handed to the identity provider when a session is ended.
    pub return_to: String,
    /// Ceiling for ordinary (non-streaming) requests.
    pub timeout_secs: u64,
    pub identity: IdentityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            return_to: DEFAULT_RETURN_TO.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            identity: IdentityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `MMC_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a YAML file, then apply environment overrides on top of it.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let cfg: ClientConfig = serde_yaml::from_str(&raw)?;
        Ok(cfg.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("MMC_API_URL") {
            self.api_base_url = v;
        }
        if let Ok(v) = env::var("MMC_APP_TITLE") {
            self.app_title = v;
        }
        if let Ok(v) = env::var("MMC_RETURN_TO") {
            self.return_to = v;
        }
        if let Some(secs) = env::var("MMC_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.timeout_secs = secs;
        }
        if let Ok(v) = env::var("MMC_AUTH_DOMAIN") {
            self.identity.domain = Some(v);
        }
        if let Ok(v) = env::var("MMC_AUTH_CLIENT_ID") {
            self.identity.client_id = Some(v);
        }
        if let Ok(v) = env::var("MMC_AUTH_AUDIENCE") {
            self.identity.audience = v;
        }
        if let Ok(v) = env::var("MMC_AUTH_SCOPE") {
            self.identity.scope = v;
        }
        self
    }

    /// Parsed base URL with any trailing slash removed, ready for path concatenation.
    pub fn base_url(&self) -> Result<String> {
        parse_url(&self.api_base_url, "api_base_url")?;
        Ok(self.api_base_url.trim_end_matches('/').to_string())
    }

    pub fn return_to_url(&self) -> Result<Url> {
        parse_url(&self.return_to, "return_to")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Audience/scope pair passed to the token getter before every request.
    pub fn token_request(&self) -> TokenRequest {
        TokenRequest::new(&self.identity.audience, &self.identity.scope)
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        self.return_to_url()?;
        Ok(())
    }
}

fn parse_url(raw: &str, field: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL: {}", e),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(raw)
                .with_source("client_config"),
        )
    })
}
