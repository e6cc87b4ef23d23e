use std::collections::HashMap;
use std::sync::Arc;

/// Environment variable lookup
///
/// Providers read the process environment in production; tests hand in a
/// fixed snapshot instead of mutating process-wide state.
#[derive(Clone, Default)]
pub struct Env {
    snapshot: Option<Arc<HashMap<String, String>>>,
}

impl Env {
    /// Read from the live process environment
    #[must_use]
    pub fn process() -> Self {
        Self { snapshot: None }
    }

    /// Read from a fixed set of variables
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            snapshot: Some(Arc::new(vars)),
        }
    }

    /// Value of `key`, or `None` when unset or not valid unicode
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        match &self.snapshot {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }

    /// Value of `key` if set to a non-empty string
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}
