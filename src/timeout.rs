use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tokio::time::Instant;

use crate::{
    headers::DefaultHeaders,
    request::{merge_headers, Body, RequestConfig},
};

/// Why a request produced no response.
#[derive(Debug)]
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) enum TransportFailure {
    /// The deadline elapsed before the response was fully read.
    TimedOut,
    /// The connection could not be established.
    Unreachable(reqwest::Error),
    /// A header name or value could not be encoded.
    InvalidHeader(String),
    Other(reqwest::Error),
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut
        } else if err.is_connect() {
            Self::Unreachable(err)
        } else {
            Self::Other(err)
        }
    }
}

/// A sent request whose response body is still to be read.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) response: reqwest::Response,
    /// Point in time by which the body must be fully read.
    pub(crate) deadline: Instant,
}

/// Sends `config` to `url`, aborting once the timeout elapses.
///
/// The default headers are read once, here; updates made while the request
/// is in flight do not affect it. The same deadline applies to reading the
/// body afterwards, through [`with_deadline`].
pub(crate) async fn send_with_timeout(
    http: &reqwest::Client,
    url: &str,
    config: RequestConfig,
    defaults: &DefaultHeaders,
    default_timeout: Duration,
) -> Result<InFlight, TransportFailure> {
    let RequestConfig {
        method,
        headers,
        body,
        timeout,
    } = config;
    let method = method.unwrap_or(Method::GET);
    let timeout = timeout.unwrap_or(default_timeout);
    let deadline = Instant::now() + timeout;

    let mut merged = merge_headers(defaults.snapshot(), headers);
    if matches!(body, Body::Multipart(_)) {
        merged.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(%method, url, timeout_ms = timeout.as_millis() as u64, "sending request");

    let builder = http
        .request(method, url)
        .headers(to_header_map(merged)?);
    let builder = match body {
        Body::Empty => builder,
        Body::Raw(text) => builder.body(text),
        Body::Json(value) => builder.body(value.to_string()),
        Body::Multipart(form) => builder.multipart(form),
    };

    let response = with_deadline(deadline, builder.send()).await??;
    Ok(InFlight { response, deadline })
}

/// Runs `call` until `deadline`, dropping it unfinished once the deadline
/// passes.
///
/// The timer belongs to the returned future, so it is cleared on every exit
/// path: completion, elapse, or the caller dropping the future.
pub(crate) async fn with_deadline<F>(
    deadline: Instant,
    call: F,
) -> Result<F::Output, TransportFailure>
where
    F: Future,
{
    tokio::time::timeout_at(deadline, call)
        .await
        .map_err(|_elapsed| TransportFailure::TimedOut)
}

fn to_header_map(headers: HashMap<String, String>) -> Result<HeaderMap, TransportFailure> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportFailure::InvalidHeader(name.clone()))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|_| TransportFailure::InvalidHeader(name.clone()))?;
        // Keys that differ only by case are distinct entries and are both sent.
        map.append(header_name, header_value);
    }
    Ok(map)
}
