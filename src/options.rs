use std::collections::HashMap;
use std::time::Duration;

/// Default messages attached to errors, replaceable for localization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorMessages {
    pub bad_request: String,
    pub unauthorized: String,
    pub forbidden: String,
    pub not_found: String,
    pub server_error: String,
    pub timeout: String,
    pub network_error: String,
    /// Used when the server could not be reached at all.
    pub connection_failed: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            bad_request: "Invalid data".to_owned(),
            unauthorized: "Unauthorized, please sign in again".to_owned(),
            forbidden: "You do not have permission to perform this action".to_owned(),
            not_found: "The requested resource was not found".to_owned(),
            server_error: "Server error, please try again later".to_owned(),
            timeout: "The request timed out".to_owned(),
            network_error: "Network error, please check your connection".to_owned(),
            connection_failed: "Cannot connect to the server".to_owned(),
        }
    }
}

/// Configures base URL, timeout, retry defaults, static headers and messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Prefix joined with every endpoint.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts made by [`crate::retry_request`] through the client.
    pub max_retries: usize,
    /// Fixed delay between retry attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Static headers seeded into the default header map.
    pub default_headers: HashMap<String, String>,
    pub messages: ErrorMessages,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            default_headers: HashMap::new(),
            messages: ErrorMessages::default(),
        }
    }
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads options from environment variables.
    ///
    /// - `API_BASE_URL` (required)
    /// - `API_TIMEOUT_MS`, `API_RETRY_ATTEMPTS`, `API_RETRY_DELAY_MS` (optional)
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("API_BASE_URL")
            .map_err(|_| "missing API_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("API_BASE_URL is set but empty".to_owned());
        }

        let mut options = Self::new(base_url.trim());
        if let Some(value) = env_number("API_TIMEOUT_MS")? {
            options.timeout_ms = value;
        }
        if let Some(value) = env_number("API_RETRY_ATTEMPTS")? {
            options.max_retries = value as usize;
        }
        if let Some(value) = env_number("API_RETRY_DELAY_MS")? {
            options.retry_delay_ms = value;
        }
        Ok(options)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, max_retries: usize, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_messages(mut self, messages: ErrorMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn env_number(name: &str) -> std::result::Result<Option<u64>, String> {
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{name} must be a non-negative integer, got '{raw}'")),
        Err(_) => Ok(None),
    }
}
