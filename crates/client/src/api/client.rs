//! Backend REST API client implementation.
//!
//! Wraps `reqwest` with bearer attachment, a fixed timeout ceiling, and the
//! cache-fallback behavior that keeps the UI showing what it last knew when
//! the network goes away.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::cache::{ResponseCache, cache_key};
use super::ApiError;
use crate::config::ClientConfig;
use crate::diagnostics::DiagnosticSink;
use crate::session::Session;
use crate::storage::Storage;

/// Client for the backend REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool, the
/// response cache, and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: ResponseCache,
    session: Session,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        session: Session,
        diagnostics: DiagnosticSink,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                cache: ResponseCache::new(config.cache_capacity, storage, diagnostics),
                session,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // =========================================================================
    // Request Methods
    // =========================================================================

    /// GET a resource, with cache fallback on transient failure.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails and no cached payload exists
    /// for it, or if the failure is one the cache may never answer for
    /// (unauthorized).
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.execute_get(path, params, false).await
    }

    /// GET a resource for an explicit user-initiated refresh.
    ///
    /// A refresh that silently succeeded with stale data would give no
    /// signal that the network call failed, so this variant never falls
    /// back to the cache.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_fresh(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.execute_get(path, params, true).await
    }

    /// GET a resource and deserialize it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the payload does not
    /// match `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let value = self.get(path, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST a JSON body. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    /// PUT a JSON body. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    /// DELETE a resource. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn execute_get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        explicit_refresh: bool,
    ) -> Result<Value, ApiError> {
        let key = cache_key(path, params);

        match self.execute(Method::GET, path, params, None).await {
            Ok(value) => {
                self.inner.cache.store(&key, &value).await;
                Ok(value)
            }
            Err(err) if !explicit_refresh && err.is_recoverable() => {
                match self.inner.cache.lookup(&key).await {
                    Some(cached) => {
                        debug!(key = %key, error = %err, "serving cached response after failure");
                        Ok(cached)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path, params)?;

        let mut request = self
            .inner
            .http
            .request(method, url)
            .header("X-Request-Id", Uuid::new_v4().to_string());

        // Absence of a credential is not an error here; the server decides
        // authorization
        if let Some(token) = self.inner.session.token() {
            request = request.bearer_auth(token.expose_secret());
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.inner.session.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %text.chars().take(200).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish()
    }
}
