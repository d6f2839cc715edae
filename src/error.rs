use serde_json::{Map, Value};

/// Message used when a response body cannot be parsed or decoded.
pub const INVALID_RESPONSE_FORMAT: &str = "invalid response format";

/// Classification of an [`ApiError`].
///
/// `status` stays the primary discriminant for callers; the kind separates
/// failures that share a status (e.g. the two `0` transport failures).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// HTTP 400.
    BadRequest,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// Any other non-2xx HTTP status.
    Server,
    /// Body could not be parsed, or did not match the expected payload type.
    MalformedResponse,
    /// Request exceeded its deadline (status 408).
    Timeout,
    /// The server could not be reached (status 0).
    Unreachable,
    /// Any other failure before a response was obtained (status 0).
    Network,
    /// A retry loop was asked to run zero attempts.
    InvalidRetryCount,
}

/// Normalized error returned by every fallible operation of this crate.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// HTTP status, or `0` when no HTTP response was obtained.
    pub status: u16,
    /// Human-readable message, already localized where applicable.
    pub message: String,
    /// Parsed error body for HTTP failures.
    pub data: Option<Value>,
}

impl ApiError {
    pub(crate) fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            data: None,
        }
    }

    pub(crate) fn http(status: u16, message: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            kind: kind_for_status(status),
            status,
            message: message.into(),
            data: Some(Value::Object(body)),
        }
    }

    pub(crate) fn malformed(status: u16) -> Self {
        Self::new(ErrorKind::MalformedResponse, status, INVALID_RESPONSE_FORMAT)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    /// True for failures where no HTTP response was received.
    pub fn is_network(&self) -> bool {
        matches!(self.kind, ErrorKind::Unreachable | ErrorKind::Network)
    }

    /// Reads a top-level field of the error body, e.g. validation details
    /// attached to a 400 response.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref()?.as_object()?.get(name)
    }
}

/// Maps an HTTP status to its error kind. Every status has a kind; 2xx
/// statuses never reach this function through the client.
pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::BadRequest,
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        408 => ErrorKind::Timeout,
        _ => ErrorKind::Server,
    }
}

/// Raised by the retry runner when asked for zero attempts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid retry count: at least one attempt is required")]
pub struct InvalidRetryCount;

impl From<InvalidRetryCount> for ApiError {
    fn from(_: InvalidRetryCount) -> Self {
        Self::new(ErrorKind::InvalidRetryCount, 0, "invalid retry count")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn field_reads_from_error_body() {
        let body = json!({"message": "bad", "errors": {"email": "taken"}});
        let Value::Object(body) = body else {
            unreachable!()
        };
        let err = ApiError::http(400, "bad", body);

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(err.field("errors"), Some(&json!({"email": "taken"})));
        assert_eq!(err.field("missing"), None);
    }

    #[test]
    fn display_is_the_message() {
        let err = ApiError::malformed(200);
        assert_eq!(err.to_string(), "invalid response format");
        assert_eq!(err.status, 200);
        assert!(err.data.is_none());
    }

    #[test]
    fn kind_for_status_falls_back_to_server() {
        assert_eq!(kind_for_status(404), ErrorKind::NotFound);
        assert_eq!(kind_for_status(418), ErrorKind::Server);
        assert_eq!(kind_for_status(503), ErrorKind::Server);
    }

    #[test]
    fn invalid_retry_count_converts_to_status_zero() {
        let err = ApiError::from(InvalidRetryCount);
        assert_eq!(err.status, 0);
        assert_eq!(err.kind, ErrorKind::InvalidRetryCount);
    }
}
