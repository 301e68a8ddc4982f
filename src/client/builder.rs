use crate::auth::{CredentialBinding, IdentityProvider};
use crate::client::core::ApiClient;
use crate::config::ClientConfig;
use crate::pipeline::Pipeline;
use crate::streaming::StreamingConsumer;
use crate::transport::{HttpTransport, TransportConfig};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builder for [`ApiClient`].
///
/// Without an explicit config the client reads `MMC_*` environment variables
/// over the built-in defaults.
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    base_url_override: Option<String>,
    timeout: Option<Duration>,
    credentials: Option<Arc<CredentialBinding>>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            base_url_override: None,
            timeout: None,
            credentials: None,
            identity_provider: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the API base URL (primarily for testing with mock servers).
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Ceiling for buffered requests. Streaming requests only use it as a
    /// connect timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share an existing binding, e.g. one the host's auth layer already holds.
    pub fn credentials(mut self, credentials: Arc<CredentialBinding>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Install a provider into the binding at build time.
    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let mut config = self.config.unwrap_or_else(ClientConfig::from_env);
        if let Some(base_url) = self.base_url_override {
            config.api_base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout.as_secs().max(1);
        }
        config.validate()?;

        let base_url = config.base_url()?;
        let return_to = config.return_to_url()?;
        let timeout = self.timeout.unwrap_or_else(|| config.timeout());
        let token_request = config.token_request();

        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(CredentialBinding::new()));
        if let Some(provider) = self.identity_provider {
            credentials.install(provider);
        }

        let transport = Arc::new(HttpTransport::new(TransportConfig {
            base_url: base_url.clone(),
            timeout,
        })?);
        let pipeline = Arc::new(Pipeline::new(
            transport.clone(),
            credentials.clone(),
            token_request.clone(),
            return_to,
        ));
        let streaming = StreamingConsumer::new(transport.clone(), credentials.clone(), token_request);

        info!(
            base_url = base_url.as_str(),
            timeout_ms = timeout.as_millis() as u64,
            authenticated = credentials.is_installed(),
            "api client ready"
        );

        Ok(ApiClient {
            config,
            credentials,
            transport,
            pipeline,
            streaming,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use crate::Error;

    #[test]
    fn override_replaces_configured_base_url() {
        let client = ApiClientBuilder::new()
            .config(ClientConfig::default())
            .base_url_override("http://127.0.0.1:9/api/")
            .build()
            .unwrap();
        assert_eq!(client.transport().base_url(), "http://127.0.0.1:9/api");
        assert_eq!(client.config().api_base_url, "http://127.0.0.1:9/api/");
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = ApiClientBuilder::new()
            .config(ClientConfig::default())
            .base_url_override("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("api_base_url")
        );
    }

    #[test]
    fn provider_is_installed_into_shared_binding() {
        let binding = Arc::new(CredentialBinding::new());
        let client = ApiClientBuilder::new()
            .config(ClientConfig::default())
            .credentials(binding.clone())
            .identity_provider(Arc::new(StaticTokenProvider::new("t")))
            .build()
            .unwrap();
        assert!(binding.is_installed());
        assert!(Arc::ptr_eq(client.credentials(), &binding));
        assert!(Arc::ptr_eq(client.pipeline().credentials(), &binding));
    }

    #[test]
    fn explicit_timeout_wins() {
        let client = ApiClientBuilder::new()
            .config(ClientConfig::default())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.transport().timeout(), Duration::from_secs(5));
    }
}
