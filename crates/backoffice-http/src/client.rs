//! reqwest-backed HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, instrument, trace};

use backoffice_core::error::{Error, ProtocolError, TransportError};
use backoffice_core::{ApiRequest, ApiResponse, ApiUrl, Backend, Method, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout, applied to every call including refreshes.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("backoffice/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP backend for the admin API.
///
/// Performs one exchange per [`Backend::execute`] call. Authentication and
/// retries are left to [`backoffice_core::AuthedClient`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: ApiUrl,
}

impl HttpBackend {
    /// Create a backend for `base` with default settings.
    pub fn new(base: ApiUrl) -> Result<Self> {
        Self::with_config(base, HttpConfig::default())
    }

    pub fn with_config(base: ApiUrl, config: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(transport_error)?;

        Ok(Self { client, base })
    }

    /// Handle a response, decoding the body or the error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        trace!(status = %status, "HTTP response");

        let text = response.text().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(ApiResponse::from_text(status.as_u16(), &text))
        } else {
            Err(Error::Protocol(parse_error_body(status.as_u16(), &text)))
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn base_url(&self) -> &ApiUrl {
        &self.base
    }

    #[instrument(skip(self, request, bearer), fields(method = %request.method(), path = request.path()))]
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
        let url = self.base.endpoint(request.path());
        debug!(%url, authenticated = bearer.is_some(), "HTTP request");

        let mut builder = self.client.request(to_reqwest(request.method()), &url);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;

        self.handle_response(response).await
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// Parse an error body, falling back to the bare status.
fn parse_error_body(status: u16, text: &str) -> ProtocolError {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(body) => ProtocolError::from_body(status, &body),
        Err(_) => ProtocolError::new(status, None, None),
    }
}
