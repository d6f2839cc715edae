use std::collections::HashMap;
use std::time::Duration;

use reqwest::{multipart, Method};
use serde_json::Value;

/// Request body variants.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Sent as-is.
    Raw(String),
    /// Serialized as JSON.
    Json(Value),
    /// Multipart form; the transport sets the boundary header.
    Multipart(multipart::Form),
}

/// Per-call request configuration.
///
/// Header overrides are merged over the default headers one key at a time.
/// `None` clears the key, so the request is sent without it.
#[derive(Debug, Default)]
pub struct RequestConfig {
    pub method: Option<Method>,
    pub headers: HashMap<String, Option<String>>,
    pub body: Body,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Drops `name` from the outgoing headers, including a default.
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name.into(), None);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Raw(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Merges `overrides` over `defaults` key by key. The caller wins per key;
/// a `None` override removes the key.
pub(crate) fn merge_headers(
    mut defaults: HashMap<String, String>,
    overrides: HashMap<String, Option<String>>,
) -> HashMap<String, String> {
    for (name, value) in overrides {
        match value {
            Some(value) => {
                defaults.insert(name, value);
            }
            None => {
                defaults.remove(&name);
            }
        }
    }
    defaults
}

/// A file sent by [`crate::ApiClient::upload`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Reads a file from disk, using its final path component as the name.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_owned());
        Ok(Self::new(file_name, bytes))
    }

    pub(crate) fn into_form(self) -> Result<multipart::Form, reqwest::Error> {
        let mut part = multipart::Part::bytes(self.bytes).file_name(self.file_name);
        if let Some(mime) = self.mime {
            part = part.mime_str(&mime)?;
        }
        Ok(multipart::Form::new().part("file", part))
    }
}
