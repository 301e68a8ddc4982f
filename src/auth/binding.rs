use super::{AuthError, FnIdentityProvider, IdentityProvider, TokenRequest};
use arc_swap::ArcSwapOption;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

struct Installed {
    provider: Arc<dyn IdentityProvider>,
    session: u64,
}

/// Late-bound reference to the identity provider of the current session.
///
/// Constructed once at application start and shared (by `Arc`) with the
/// pipeline and the streaming consumer. Single writer (the host's auth
/// integration), many readers: each request takes an instantaneous snapshot,
/// so re-installing mid-flight never affects a request already past its
/// pre-send stage.
pub struct CredentialBinding {
    slot: ArcSwapOption<Installed>,
    sessions: AtomicU64,
}

impl CredentialBinding {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            sessions: AtomicU64::new(0),
        }
    }

    /// Install the provider for a newly authenticated session. Last write wins.
    pub fn install(&self, provider: Arc<dyn IdentityProvider>) {
        let session = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.slot.store(Some(Arc::new(Installed { provider, session })));
        info!(session, "credential provider installed");
    }

    /// Convenience for hosts that hold the two capabilities as plain closures.
    pub fn install_fns<F, Fut, L>(&self, token_getter: F, on_session_expired: L)
    where
        F: Fn(TokenRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AuthError>> + Send + 'static,
        L: Fn(&Url) + Send + Sync + 'static,
    {
        self.install(Arc::new(FnIdentityProvider::new(
            token_getter,
            on_session_expired,
        )));
    }

    /// Drop the installed provider when the host session ends.
    pub fn clear(&self) {
        if self.slot.swap(None).is_some() {
            info!("credential provider cleared");
        }
    }

    pub fn is_installed(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Number of installs so far; `0` means nothing was ever installed.
    pub fn session(&self) -> u64 {
        self.slot.load_full().map(|i| i.session).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Option<Arc<dyn IdentityProvider>> {
        self.slot.load_full().map(|i| i.provider.clone())
    }

    /// Token for the next request, or `None` when unauthenticated.
    ///
    /// Acquisition failures are logged and swallowed: the request is sent
    /// without a credential so public endpoints still succeed.
    pub async fn bearer_token(&self, request: &TokenRequest) -> Option<String> {
        let provider = self.snapshot()?;
        match provider.get_token(request).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, audience = request.audience.as_str(), "failed to get access token; sending request without credential");
                None
            }
        }
    }

    /// Invoke the installed session-termination action. Returns whether one ran.
    pub fn end_session(&self, return_to: &Url) -> bool {
        match self.snapshot() {
            Some(provider) => {
                provider.end_session(return_to);
                true
            }
            None => {
                debug!("no credential provider installed; nothing to end");
                false
            }
        }
    }
}

impl Default for CredentialBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBinding")
            .field("installed", &self.is_installed())
            .field("session", &self.session())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn req() -> TokenRequest {
        TokenRequest::new("aud", "scope")
    }

    #[tokio::test]
    async fn unset_binding_yields_no_token() {
        let binding = CredentialBinding::new();
        assert!(!binding.is_installed());
        assert_eq!(binding.bearer_token(&req()).await, None);
        assert!(!binding.end_session(&Url::parse("http://localhost").unwrap()));
    }

    #[tokio::test]
    async fn last_install_wins() {
        let binding = CredentialBinding::new();
        binding.install_fns(|_| async { Ok("first".to_string()) }, |_| {});
        binding.install_fns(|_| async { Ok("second".to_string()) }, |_| {});

        assert_eq!(binding.session(), 2);
        assert_eq!(binding.bearer_token(&req()).await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn getter_failure_is_swallowed() {
        let binding = CredentialBinding::new();
        binding.install_fns(
            |_| async { Err(AuthError::TokenUnavailable("refresh expired".into())) },
            |_| {},
        );
        assert_eq!(binding.bearer_token(&req()).await, None);
    }

    #[tokio::test]
    async fn clear_removes_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = calls.clone();
        let binding = CredentialBinding::new();
        binding.install_fns(
            |_| async { Ok("t".to_string()) },
            move |_| {
                calls_in.fetch_add(1, Ordering::SeqCst);
            },
        );
        binding.clear();

        assert!(!binding.is_installed());
        assert!(!binding.end_session(&Url::parse("http://localhost").unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
