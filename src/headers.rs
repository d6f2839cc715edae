use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

const REDACTED: [&str; 3] = ["authorization", "cookie", "x-api-key"];

/// Headers applied to every outgoing request unless overridden.
///
/// Cloning the handle shares the same map: an update through any clone is
/// seen by every client built from it. Keys are case-sensitive. The lock is
/// only held for synchronous reads and writes, never across an `.await`, so
/// a request observes the map either fully before or fully after an update.
#[derive(Clone)]
pub struct DefaultHeaders {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl DefaultHeaders {
    /// Seeds the map with `Accept` and `Content-Type` set to
    /// `application/json`, then applies `seed` on top.
    pub fn new(seed: HashMap<String, String>) -> Self {
        let mut headers = HashMap::with_capacity(seed.len() + 2);
        headers.insert("Content-Type".to_owned(), "application/json".to_owned());
        headers.insert("Accept".to_owned(), "application/json".to_owned());
        headers.extend(seed);
        Self {
            inner: Arc::new(RwLock::new(headers)),
        }
    }

    /// Merges `headers` into the map; new values replace existing keys.
    pub fn set<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.extend(
            headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
    }

    /// Removes a header by exact name, returning its previous value.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Copies the current map; later updates do not affect the copy.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for DefaultHeaders {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl fmt::Debug for DefaultHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        let mut map = f.debug_map();
        for (name, value) in &snapshot {
            if REDACTED.iter().any(|r| name.eq_ignore_ascii_case(r)) {
                map.entry(name, &"<redacted>");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::DefaultHeaders;

    #[test]
    fn seeds_json_headers_and_static_config() {
        let headers = DefaultHeaders::new(HashMap::from([(
            "X-Client".to_owned(),
            "web".to_owned(),
        )]));

        assert_eq!(headers.get("Accept").as_deref(), Some("application/json"));
        assert_eq!(
            headers.get("Content-Type").as_deref(),
            Some("application/json")
        );
        assert_eq!(headers.get("X-Client").as_deref(), Some("web"));
    }

    #[test]
    fn set_merges_and_remove_deletes() {
        let headers = DefaultHeaders::default();
        headers.set([("X-Foo", "bar"), ("Accept", "text/plain")]);

        assert_eq!(headers.get("X-Foo").as_deref(), Some("bar"));
        assert_eq!(headers.get("Accept").as_deref(), Some("text/plain"));

        assert_eq!(headers.remove("X-Foo").as_deref(), Some("bar"));
        assert_eq!(headers.get("X-Foo"), None);
        assert_eq!(headers.remove("X-Foo"), None);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let headers = DefaultHeaders::default();
        headers.set([("x-foo", "lower")]);
        assert_eq!(headers.get("X-Foo"), None);
        assert_eq!(headers.remove("X-FOO"), None);
        assert_eq!(headers.get("x-foo").as_deref(), Some("lower"));
    }

    #[test]
    fn clones_share_state_but_snapshots_do_not() {
        let headers = DefaultHeaders::default();
        let shared = headers.clone();
        let before = headers.snapshot();

        shared.set([("X-Trace", "1")]);

        assert_eq!(headers.get("X-Trace").as_deref(), Some("1"));
        assert!(!before.contains_key("X-Trace"));
    }

    #[test]
    fn debug_redacts_credentials() {
        let headers = DefaultHeaders::default();
        headers.set([("Authorization", "Bearer secret-token")]);
        let debug = format!("{headers:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
