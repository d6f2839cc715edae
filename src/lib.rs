//! `jsonapi-http` is an async HTTP client core for JSON APIs.
//!
//! Every request runs under a deadline, every failure surfaces as one
//! [`ApiError`] shape, and retries are opt-in:
//! - [`ApiClient::request`] and the verb helpers ([`ApiClient::get`],
//!   [`ApiClient::post`], [`ApiClient::put`], [`ApiClient::patch`],
//!   [`ApiClient::delete`], [`ApiClient::upload`])
//! - [`DefaultHeaders`] shared across clients
//! - [`retry_request`] for fixed-count, fixed-delay retries

mod client;
mod error;
mod headers;
mod options;
mod request;
mod response;
mod retry;
mod timeout;

pub use client::{build_api_url, ApiClient};
pub use error::{
    kind_for_status, ApiError, ErrorKind, InvalidRetryCount, INVALID_RESPONSE_FORMAT,
};
pub use headers::DefaultHeaders;
pub use options::{ClientOptions, ErrorMessages};
pub use request::{Body, RequestConfig, UploadFile};
pub use response::{interpret, RawResponse};
pub use retry::{retry_request, RetryPolicy};

pub type Result<T> = std::result::Result<T, ApiError>;
