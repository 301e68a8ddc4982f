//! Identity provider boundary and the credential binding.
//!
//! The pipeline needs exactly two capabilities from the identity provider:
//! an asynchronous token getter and a session-termination action. Both are
//! expressed by [`IdentityProvider`]; the host installs one into a
//! [`CredentialBinding`] after each successful login.

mod binding;

pub use binding::CredentialBinding;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use url::Url;

/// Audience/scope pair requested on every token fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenRequest {
    pub audience: String,
    pub scope: String,
}

impl TokenRequest {
    pub fn new(audience: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            scope: scope.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("login required")]
    LoginRequired,

    #[error("token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("identity provider error: {0}")]
    Provider(String),
}

/// External identity service supplying short-lived bearer tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch (or silently renew) an access token for the given audience/scope.
    async fn get_token(&self, request: &TokenRequest) -> Result<String, AuthError>;

    /// End the current session and send the user back to `return_to`.
    fn end_session(&self, return_to: &Url);
}

type TokenGetter =
    Box<dyn Fn(TokenRequest) -> BoxFuture<'static, Result<String, AuthError>> + Send + Sync>;
type SessionEnder = Box<dyn Fn(&Url) + Send + Sync>;

/// Identity provider assembled from a token getter closure and a logout closure.
pub struct FnIdentityProvider {
    token_getter: TokenGetter,
    on_session_expired: SessionEnder,
}

impl FnIdentityProvider {
    pub fn new<F, Fut, L>(token_getter: F, on_session_expired: L) -> Self
    where
        F: Fn(TokenRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, AuthError>> + Send + 'static,
        L: Fn(&Url) + Send + Sync + 'static,
    {
        Self {
            token_getter: Box::new(move |req| Box::pin(token_getter(req))),
            on_session_expired: Box::new(on_session_expired),
        }
    }
}

#[async_trait]
impl IdentityProvider for FnIdentityProvider {
    async fn get_token(&self, request: &TokenRequest) -> Result<String, AuthError> {
        (self.token_getter)(request.clone()).await
    }

    fn end_session(&self, return_to: &Url) {
        (self.on_session_expired)(return_to)
    }
}

/// Fixed bearer token, e.g. one exported into the environment for the CLI.
///
/// Ending the session only logs; there is no interactive login to return to.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn get_token(&self, _request: &TokenRequest) -> Result<String, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::LoginRequired);
        }
        Ok(self.token.clone())
    }

    fn end_session(&self, return_to: &Url) {
        tracing::warn!(return_to = %return_to, "session ended by server; static token rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn fn_provider_forwards_audience_and_scope() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in = seen.clone();
        let provider = FnIdentityProvider::new(
            move |req: TokenRequest| {
                *seen_in.lock().unwrap() = Some(req);
                async { Ok("tok".to_string()) }
            },
            |_| {},
        );

        let token = provider
            .get_token(&TokenRequest::new("aud", "openid"))
            .await
            .unwrap();
        assert_eq!(token, "tok");
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(TokenRequest::new("aud", "openid"))
        );
    }

    #[tokio::test]
    async fn fn_provider_invokes_logout_with_return_to() {
        let returned = Arc::new(Mutex::new(Vec::new()));
        let returned_in = returned.clone();
        let provider = FnIdentityProvider::new(
            |_req| async { Err(AuthError::LoginRequired) },
            move |url: &Url| returned_in.lock().unwrap().push(url.to_string()),
        );

        provider.end_session(&Url::parse("https://app.example.com").unwrap());
        assert_eq!(*returned.lock().unwrap(), vec!["https://app.example.com/"]);
    }

    #[tokio::test]
    async fn empty_static_token_requires_login() {
        let provider = StaticTokenProvider::new("");
        let err = provider
            .get_token(&TokenRequest::new("a", "s"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::LoginRequired);
    }
}
