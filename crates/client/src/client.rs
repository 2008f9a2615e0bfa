use std::sync::Arc;
use std::time::Duration;

use radmin_core::ClientConfig;
use radmin_storage::{AdminStore, PortalStore};
use reqwest::Method;
use serde_json::Value;

use crate::error::ClientError;
use crate::interceptor::{AuthInterceptor, Navigator, Sessions};

/// Maximum body length echoed into parse errors.
const MAX_ERROR_BODY_LEN: usize = 200;

/// Where the bearer token for outgoing requests comes from.
#[derive(Debug, Clone, Default)]
pub enum TokenSource {
    #[default]
    None,
    Admin(Arc<AdminStore>),
    Portal(Arc<PortalStore>),
}

impl TokenSource {
    fn current(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Admin(store) => store.token(),
            Self::Portal(store) => store.token(),
        }
    }
}

/// Shared request pipeline. Cloning is cheap and every clone uses the same interceptor.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
    interceptor: Option<AuthInterceptor>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("client", &self.inner.http)
            .field("base_url", &self.inner.base_url)
            .field("tokens", &self.inner.tokens)
            .field("intercepts_401", &self.inner.interceptor.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Option<Duration>,
    tokens: TokenSource,
    interceptor: Option<AuthInterceptor>,
}

impl ApiClientBuilder {
    /// Per-request timeout; without one the transport defaults apply.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn tokens(mut self, tokens: TokenSource) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: AuthInterceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// # Errors
    /// Returns an error if the base URL is empty or the HTTP client cannot be built.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ClientError::ClientInit("empty base URL".to_owned()));
        }
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().map_err(|e| ClientError::ClientInit(e.to_string()))?;
        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens: self.tokens,
                interceptor: self.interceptor,
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder { base_url: base_url.into(), ..ApiClientBuilder::default() }
    }

    /// The admin console client: admin token, 401 interception across both stores.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn admin(
        config: &ClientConfig,
        sessions: Sessions,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let tokens = TokenSource::Admin(Arc::clone(&sessions.admin));
        Self::builder(config.api_url.clone())
            .timeout(config.request_timeout)
            .tokens(tokens)
            .interceptor(AuthInterceptor::new(sessions, navigator))
            .build()
    }

    /// Client for captive-portal pages: portal token, 401s passed through.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn portal(config: &ClientConfig, portal: Arc<PortalStore>) -> Result<Self, ClientError> {
        Self::builder(config.api_url.clone())
            .timeout(config.request_timeout)
            .tokens(TokenSource::Portal(portal))
            .build()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn interceptor(&self) -> Option<&AuthInterceptor> {
        self.inner.interceptor.as_ref()
    }

    /// Issues one request with the current token attached.
    ///
    /// # Errors
    /// `HttpRequest` when no response arrives, `SessionExpired` when a 401 ended the admin
    /// session, `HttpStatus` for every other non-success status, `JsonParse` for a bad body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let token = self.inner.tokens.current();
        self.dispatch(method, path, query, body, token.as_deref()).await
    }

    /// Issues a request without any `Authorization` header (login endpoints).
    ///
    /// # Errors
    /// Same as [`ApiClient::send`]; a 401 here never ends a session.
    pub async fn send_anonymous(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.dispatch(method, path, &[], body, None).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.inner.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let carried_auth = token.is_some();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ClientError::JsonParse {
                context: format!("{url} (body: {})", truncate(&text, MAX_ERROR_BODY_LEN)),
                source: e,
            });
        }

        if let Some(interceptor) = &self.inner.interceptor {
            if interceptor.intercept(status, carried_auth) {
                return Err(ClientError::SessionExpired);
            }
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_status(status.as_u16(), body))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
