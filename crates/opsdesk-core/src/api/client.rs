//! Session-aware API client for the operations REST API.
//!
//! Every request goes through [`ApiClient::request`], which
//! - resolves the path against the configured base URL,
//! - attaches `Authorization: Bearer <token>` when the token store holds
//!   an access token (read at dispatch time, never cached), and
//! - on a 401 whose body says the token itself is dead, clears the store
//!   and notifies the session listener before returning the error.
//!
//! Network failures and every other error status are returned unchanged.
//! There is no retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{
    AuthFailureReason, ClassifyAuthFailure, ErrorBody, MemoryTokenStore, SessionListener,
    SessionState, TokenNotValidClassifier, TokenStore,
};
use crate::config::{Config, ConfigError, DEFAULT_REQUEST_TIMEOUT_SECS};

use super::ApiError;

const JSON_CONTENT_TYPE: &str = "application/json";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Request body.
pub enum Payload {
    Json(Value),
    /// `multipart/form-data`; reqwest sets the boundary header itself.
    Multipart(Form),
    Bytes {
        content_type: String,
        data: Vec<u8>,
    },
}

impl Payload {
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        serde_json::to_value(body)
            .map(Payload::Json)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))
    }
}

/// Per-call adjustments.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    /// Overrides the payload's content type (ignored for multipart).
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }
}

/// Builder for [`ApiClient`]. `build` fails fast without a base URL.
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    store: Option<Arc<dyn TokenStore>>,
    classifier: Arc<dyn ClassifyAuthFailure>,
    listener: Option<Arc<dyn SessionListener>>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            store: None,
            classifier: Arc::new(TokenNotValidClassifier::default()),
            listener: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.request_timeout(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn classifier(mut self, classifier: impl ClassifyAuthFailure + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> Result<ApiClient, ConfigError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let base_url = parse_base_url(raw)?;

        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(ApiClient {
            client,
            base_url,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            classifier: self.classifier,
            listener: self.listener,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// API client for the operations backend.
/// Clone is cheap - the connection pool, store and listener are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    classifier: Arc<dyn ClassifyAuthFailure>,
    listener: Option<Arc<dyn SessionListener>>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Session state as of now, read from the store.
    pub fn session_state(&self) -> SessionState {
        let token = self.store.access_token().ok().flatten();
        SessionState::from_access_token(token.as_deref())
    }

    /// Resolve a relative path against the base URL. Base path segments
    /// are kept: `https://host/api` + `/clients/` is `https://host/api/clients/`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid path {:?}: {}", path, e)))
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.store.access_token().map_err(ApiError::Storage)? {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::Storage(anyhow::anyhow!(
                    "Stored access token is not a valid header value"
                ))
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Build the outgoing request without sending it.
    fn prepare(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
        options: &RequestOptions,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let mut headers = self.auth_headers()?;
        debug!(
            %method,
            path,
            authenticated = headers.contains_key(header::AUTHORIZATION),
            "Dispatching request"
        );

        let accept = options.accept.as_deref().unwrap_or(JSON_CONTENT_TYPE);
        headers.insert(header::ACCEPT, header_value(accept)?);

        let mut builder = self.client.request(method, url);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }

        builder = match payload {
            None => builder,
            Some(Payload::Json(value)) => {
                let content_type = options.content_type.as_deref().unwrap_or(JSON_CONTENT_TYPE);
                headers.insert(header::CONTENT_TYPE, header_value(content_type)?);
                let body = serde_json::to_vec(&value).map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to serialize body: {}", e))
                })?;
                builder.body(body)
            }
            Some(Payload::Multipart(form)) => builder.multipart(form),
            Some(Payload::Bytes { content_type, data }) => {
                let content_type = options.content_type.as_deref().unwrap_or(&content_type);
                headers.insert(header::CONTENT_TYPE, header_value(content_type)?);
                builder.body(data)
            }
        };

        Ok(builder.headers(headers))
    }

    /// Dispatch a request and return the successful response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let response = self.prepare(method, path, payload, &options)?.send().await?;
        self.check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, url = %url, error = %e, "Failed to read error body");
                String::new()
            }
        };
        debug!(%status, url = %url, "Request failed");

        if status == StatusCode::UNAUTHORIZED {
            let error_body = ErrorBody::parse(&body);
            let reason = self.classifier.classify(&error_body);
            if reason.invalidates_session() {
                self.invalidate_session(reason)?;
                return Err(ApiError::SessionInvalidated {
                    reason,
                    detail: error_body.detail.unwrap_or_default(),
                });
            }
        }

        Err(ApiError::from_status(status, &body))
    }

    /// Clear the store, then notify the listener. A store that cannot be
    /// cleared still holds the session, so the listener is not told and the
    /// storage failure is what the caller sees.
    fn invalidate_session(&self, reason: AuthFailureReason) -> Result<(), ApiError> {
        warn!(%reason, "Server rejected the access token, clearing session");
        self.store.clear().map_err(|e| {
            warn!(error = %e, "Failed to clear token store");
            ApiError::Storage(e.context(format!(
                "Server rejected the access token ({}) but the stored session could not be cleared",
                reason
            )))
        })?;
        if let Some(ref listener) = self.listener {
            listener.on_session_invalidated(reason);
        }
        Ok(())
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        // Empty bodies (204) decode as JSON null, so `()` and `Option<T>` work.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    // ===== Typed helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with(path, RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path, None, options).await?;
        Self::parse_json(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None, RequestOptions::default())
            .await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = Payload::json(body)?;
        let response = self
            .request(method, path, Some(payload), RequestOptions::default())
            .await?;
        Self::parse_json(response).await
    }

    /// POST a multipart form (file uploads).
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let response = self
            .request(
                Method::POST,
                path,
                Some(Payload::Multipart(form)),
                RequestOptions::default(),
            )
            .await?;
        Self::parse_json(response).await
    }

    /// GET raw bytes (file downloads).
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .request(
                Method::GET,
                path,
                None,
                RequestOptions::new().accept(BINARY_CONTENT_TYPE),
            )
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Untyped call returning whatever JSON the server sent (`null` for
    /// empty bodies).
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let response = self
            .request(method, path, body.map(Payload::Json), RequestOptions::default())
            .await?;
        Self::parse_json(response).await
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid header value {:?}", value)))
}
