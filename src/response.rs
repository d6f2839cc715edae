use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{ApiError, ErrorMessages, Result};

/// A fully read transport response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Consumes the transport response and reads its body.
    ///
    /// A body that cannot be read is reported like one that cannot be parsed.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(status, error = %_err, "failed to read response body");
            ApiError::malformed(status)
        })?;

        Ok(Self {
            status,
            content_type,
            body: body.to_vec(),
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_json_content_type)
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Turns a raw response into a payload or an [`ApiError`].
///
/// Success bodies shaped `{ "data": X, .. }` resolve to `X`.
/// An empty success body resolves to `""` for callers expecting text or a
/// JSON value, and to `null` for `()` or `Option<_>` payloads.
pub fn interpret<T: DeserializeOwned>(raw: RawResponse, messages: &ErrorMessages) -> Result<T> {
    let status = raw.status;
    if raw.is_success() && raw.body.is_empty() {
        return serde_json::from_value(Value::String(String::new()))
            .or_else(|_| serde_json::from_value(Value::Null))
            .map_err(|_err| {
                #[cfg(feature = "tracing")]
                tracing::warn!(status, error = %_err, "empty body does not fit the payload type");
                ApiError::malformed(status)
            });
    }

    let parsed = parse_body(&raw).ok_or_else(|| {
        #[cfg(feature = "tracing")]
        tracing::warn!(status, "response body is not in its declared format");
        ApiError::malformed(status)
    })?;

    if raw.is_success() {
        let payload = unwrap_data(parsed);
        return serde_json::from_value(payload).map_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(status, error = %_err, "response payload has an unexpected shape");
            ApiError::malformed(status)
        });
    }

    Err(error_from_body(status, parsed, messages))
}

fn parse_body(raw: &RawResponse) -> Option<Value> {
    if raw.is_json() {
        serde_json::from_slice(&raw.body).ok()
    } else {
        std::str::from_utf8(&raw.body)
            .ok()
            .map(|text| Value::String(text.to_owned()))
    }
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut object) if object.contains_key("data") => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn error_from_body(status: u16, body: Value, messages: &ErrorMessages) -> ApiError {
    let body = match body {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    let default = match status {
        400 => &messages.bad_request,
        401 => &messages.unauthorized,
        403 => &messages.forbidden,
        404 => &messages.not_found,
        _ => &messages.server_error,
    };
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(default)
        .to_owned();

    ApiError::http(status, message, body)
}
