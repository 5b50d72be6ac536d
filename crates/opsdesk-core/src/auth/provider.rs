use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::DEFAULT_TOKEN_ENDPOINT;

use super::{SessionData, SessionState};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token", alias = "token")]
    access: String,
    #[serde(default, alias = "refresh_token")]
    refresh: Option<String>,
}

/// Login, logout and current session state on top of an [`ApiClient`].
///
/// State is always derived from the client's token store, so several
/// providers (or clones of the client) agree on who is logged in.
#[derive(Clone)]
pub struct AuthProvider {
    api: ApiClient,
    token_endpoint: String,
}

impl AuthProvider {
    pub fn new(api: ApiClient) -> Self {
        Self::with_token_endpoint(api, DEFAULT_TOKEN_ENDPOINT)
    }

    pub fn with_token_endpoint(api: ApiClient, token_endpoint: impl Into<String>) -> Self {
        Self {
            api,
            token_endpoint: token_endpoint.into(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials for tokens and store them.
    ///
    /// Rejected credentials come back as [`ApiError::Unauthorized`] and
    /// leave whatever session was stored untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionData, ApiError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let response: LoginResponse = self
            .api
            .post(&self.token_endpoint, &LoginRequest { username, password })
            .await?;

        if response.access.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response did not contain an access token".to_string(),
            ));
        }

        let session = SessionData::new(response.access, response.refresh);
        self.api
            .token_store()
            .save_session(&session)
            .map_err(ApiError::Storage)?;

        info!(username, "Logged in");
        Ok(session)
    }

    /// Forget the stored session. Safe to call when already logged out.
    pub fn logout(&self) -> Result<(), ApiError> {
        let was_authenticated = self.is_authenticated();
        self.api.token_store().clear().map_err(ApiError::Storage)?;
        if was_authenticated {
            info!("Logged out");
        }
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.api.session_state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn session(&self) -> Option<SessionData> {
        match self.api.token_store().load_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, TokenStore};
    use std::sync::Arc;

    fn provider(store: Arc<MemoryTokenStore>) -> AuthProvider {
        // Nothing listens on the discard port; these tests never dispatch.
        let api = ApiClient::builder()
            .base_url("http://127.0.0.1:9/api")
            .token_store(store)
            .build()
            .unwrap();
        AuthProvider::new(api)
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = provider(store.clone());

        let err = auth.login("   ", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = auth.login("dana", "").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(auth.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_logout_clears_both_tokens() {
        let store = Arc::new(MemoryTokenStore::with_session(&SessionData::new(
            "abc123",
            Some("r-1".to_string()),
        )));
        let auth = provider(store.clone());
        assert!(auth.is_authenticated());
        assert_eq!(auth.session().unwrap().access_token, "abc123");

        auth.logout().unwrap();
        assert_eq!(auth.state(), SessionState::Anonymous);
        assert!(store.refresh_token().unwrap().is_none());

        // Idempotent
        auth.logout().unwrap();
    }

    #[test]
    fn test_login_response_aliases() {
        let r: LoginResponse = serde_json::from_str(r#"{"access":"a","refresh":"r"}"#).unwrap();
        assert_eq!((r.access.as_str(), r.refresh.as_deref()), ("a", Some("r")));

        let r: LoginResponse =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r"}"#).unwrap();
        assert_eq!(r.refresh.as_deref(), Some("r"));

        let r: LoginResponse = serde_json::from_str(r#"{"token":"a"}"#).unwrap();
        assert_eq!(r.access, "a");
        assert!(r.refresh.is_none());
    }
}
