use std::fmt;
use std::future::Future;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    response::{interpret, RawResponse},
    retry::{self, RetryPolicy},
    timeout::{send_with_timeout, with_deadline, TransportFailure},
    ApiError, Body, ClientOptions, DefaultHeaders, ErrorKind, InvalidRetryCount, RequestConfig,
    Result, UploadFile,
};

/// Joins a base URL and an endpoint with exactly one `/`.
///
/// Absolute endpoints (`http://` or `https://`) are returned unchanged.
///
/// Example: `("https://api.example.com/", "/users")` → `"https://api.example.com/users"`
pub fn build_api_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_owned();
    }
    let base = base_url.trim().trim_end_matches('/');
    let path = endpoint.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, _) => format!("/{path}"),
        (false, true) => base.to_owned(),
        (false, false) => format!("{base}/{path}"),
    }
}

/// HTTP client for a JSON API.
///
/// Every fallible operation returns [`ApiError`]; transport errors never
/// escape. Nothing is retried automatically; wrap calls in
/// [`ApiClient::retry_request`] to opt in.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    options: ClientOptions,
    default_headers: DefaultHeaders,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.options.base_url)
            .field("timeout_ms", &self.options.timeout_ms)
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client with its own default header map seeded from
    /// `options.default_headers`.
    pub fn new(options: ClientOptions) -> Self {
        let default_headers = DefaultHeaders::new(options.default_headers.clone());
        Self::with_default_headers(options, default_headers)
    }

    /// Creates a client that shares an existing default header map.
    ///
    /// `options.default_headers` is ignored; the handle is used as-is.
    ///
    /// Falls back to a client without a cookie store if the HTTP stack cannot
    /// be configured; use [`ApiClient::try_with_default_headers`] to see why.
    pub fn with_default_headers(options: ClientOptions, default_headers: DefaultHeaders) -> Self {
        let http = build_http_client().unwrap_or_else(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "cookie store unavailable, cookies will not be sent");
            reqwest::Client::new()
        });
        Self {
            http,
            options,
            default_headers,
        }
    }

    /// Like [`ApiClient::with_default_headers`], but reports a failure to
    /// configure the HTTP stack as a status-0 [`ApiError`] instead of falling
    /// back.
    pub fn try_with_default_headers(
        options: ClientOptions,
        default_headers: DefaultHeaders,
    ) -> Result<Self> {
        let http = build_http_client().map_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "failed to build HTTP client");
            ApiError::new(
                ErrorKind::Network,
                0,
                options.messages.network_error.clone(),
            )
        })?;
        Ok(Self {
            http,
            options,
            default_headers,
        })
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    pub fn from_env() -> std::result::Result<Self, String> {
        ClientOptions::from_env().map(Self::new)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Shared default header handle.
    pub fn default_headers(&self) -> &DefaultHeaders {
        &self.default_headers
    }

    /// Merges headers into the default map for all subsequent requests.
    pub fn set_default_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.default_headers.set(headers);
    }

    /// Removes a default header for all subsequent requests.
    pub fn remove_default_header(&self, name: &str) {
        self.default_headers.remove(name);
    }

    /// Sends a request and interprets the response.
    ///
    /// The timeout covers both sending and reading the body.
    ///
    /// Failures are normalized:
    /// - timeout → status 408
    /// - server unreachable → status 0, connection message
    /// - any other transport failure → status 0, network message
    /// - HTTP and format errors from the response pass through unchanged
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let url = build_api_url(&self.options.base_url, endpoint);
        let in_flight = send_with_timeout(
            &self.http,
            &url,
            config,
            &self.default_headers,
            self.options.timeout(),
        )
        .await
        .map_err(|failure| self.transport_error(failure))?;

        let raw = with_deadline(in_flight.deadline, RawResponse::read(in_flight.response))
            .await
            .map_err(|failure| self.transport_error(failure))??;
        interpret(raw, &self.options.messages)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        self.request(endpoint, with_method(config, Method::GET)).await
    }

    /// Sends `data` as a JSON body with `POST`.
    pub async fn post<T, B>(
        &self,
        endpoint: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(endpoint, Method::POST, data, config).await
    }

    pub async fn put<T, B>(
        &self,
        endpoint: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(endpoint, Method::PUT, data, config).await
    }

    pub async fn patch<T, B>(
        &self,
        endpoint: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(endpoint, Method::PATCH, data, config).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        self.request(endpoint, with_method(config, Method::DELETE)).await
    }

    /// Uploads `file` as multipart form field `file` with `POST`.
    ///
    /// The `Content-Type` header is cleared so the transport sets the
    /// multipart boundary itself.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: UploadFile,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        let form = file
            .into_form()
            .map_err(|failure| self.transport_error(TransportFailure::from(failure)))?;
        let mut config = config
            .unwrap_or_default()
            .method(Method::POST)
            .without_header("Content-Type");
        config.body = Body::Multipart(form);
        self.request(endpoint, config).await
    }

    /// Runs `operation` with the client's retry settings.
    ///
    /// See [`retry::retry_request`].
    pub async fn retry_request<T, E, F, Fut>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<InvalidRetryCount>,
    {
        retry::retry_request(operation, RetryPolicy::from_options(&self.options)).await
    }

    async fn send_json<T, B>(
        &self,
        endpoint: &str,
        method: Method,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(data).map_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(endpoint, error = %_err, "request body could not be serialized");
            ApiError::new(
                ErrorKind::Network,
                0,
                self.options.messages.network_error.clone(),
            )
        })?;

        let mut config = with_method(config, method);
        config.body = Body::Json(body);
        self.request(endpoint, config).await
    }

    fn transport_error(&self, failure: TransportFailure) -> ApiError {
        #[cfg(feature = "tracing")]
        tracing::warn!(?failure, "request failed before a response was received");

        let messages = &self.options.messages;
        match failure {
            TransportFailure::TimedOut => {
                ApiError::new(ErrorKind::Timeout, 408, messages.timeout.clone())
            }
            TransportFailure::Unreachable(_) => {
                ApiError::new(ErrorKind::Unreachable, 0, messages.connection_failed.clone())
            }
            TransportFailure::InvalidHeader(_) | TransportFailure::Other(_) => {
                ApiError::new(ErrorKind::Network, 0, messages.network_error.clone())
            }
        }
    }
}

/// Cookies set by the API are stored and replayed on later requests.
fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().cookie_store(true).build()
}

/// Sets `method` unless the caller already chose one.
fn with_method(config: Option<RequestConfig>, method: Method) -> RequestConfig {
    let mut config = config.unwrap_or_default();
    if config.method.is_none() {
        config.method = Some(method);
    }
    config
}
