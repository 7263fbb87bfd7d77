//! Storefront API client

pub mod auth;
pub mod config;
pub mod error;

use arc_swap::ArcSwapOption;
use error::ClientError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method};
use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;

/// Method, JSON body and extra headers of a single request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<JsonValue>,
    /// Applied last, so they override the client's own headers
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// Set the JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a header, replacing any default with the same name
    ///
    /// Setting the same name again replaces the earlier value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Storefront API client
///
/// Clones share the same bearer token, so the client owned by the
/// composition root and the one held by the session controller always
/// agree on who is logged in.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<ArcSwapOption<String>>,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token; `None` (or an empty token) detaches it
    pub fn set_token(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        debug!(attached = token.is_some(), "Updating bearer token");
        self.token.store(token.map(Arc::new));
    }

    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.token.load_full().map(|t| t.as_ref().clone())
    }

    /// Send a JSON request to `endpoint` and decode the JSON answer
    ///
    /// A successful response without a body decodes as JSON `null`, so
    /// `()` and `Option<_>` targets resolve to no value.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let headers = self.merged_headers(&options.headers)?;

        let mut request = self
            .client
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        debug!(method = %options.method, endpoint, "Sending API request");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let data = match response.bytes().await {
                Ok(bytes) => serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| JsonValue::Object(Map::new())),
                Err(_) => JsonValue::Object(Map::new()),
            };
            warn!(method = %options.method, endpoint, status = status.as_u16(), "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                data,
            });
        }

        let bytes = response.bytes().await?;
        decode_body(&bytes)
    }

    fn merged_headers(&self, overrides: &HeaderMap) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(token) = self.token.load_full() {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Configuration("bearer token is not a valid header value".into())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        for name in overrides.keys() {
            headers.remove(name);
            for value in overrides.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Ok(headers)
    }
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::deserialize(JsonValue::Null)?);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Start with a bearer token already attached
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| format!("storefront-client/{}", env!("CARGO_PKG_VERSION"))),
        );

        let client = client_builder.build()?;

        let token = self.token.filter(|t| !t.is_empty()).map(Arc::new);

        Ok(ApiClient {
            client,
            base_url,
            token: Arc::new(ArcSwapOption::new(token)),
        })
    }
}
