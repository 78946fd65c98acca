/// Static response headers, set once at construction.
///
/// Header emission is plain configuration: an ordered list of name/value
/// pairs applied to every response. There is no handler hierarchy to
/// override.
use crate::errors::{DaemonError, DaemonResult};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// One configured response header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: &str, value: &str) -> Self {
        HeaderEntry {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// The header surface the original deployments attached to every response
pub fn default_headers() -> Vec<HeaderEntry> {
    vec![
        HeaderEntry::new("Cache-Control", "no-cache, no-store, must-revalidate"),
        HeaderEntry::new("Access-Control-Allow-Origin", "*"),
        HeaderEntry::new("X-Content-Type-Options", "nosniff"),
    ]
}

/// Pre-parsed header set applied to every response, in config order
#[derive(Debug, Clone)]
pub struct ResponseHeaders(Vec<(HeaderName, HeaderValue)>);

impl ResponseHeaders {
    /// Parse and validate the configured entries once, at construction
    pub fn from_config(entries: &[HeaderEntry]) -> DaemonResult<Self> {
        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            let name: HeaderName = entry.name.parse().map_err(|_| {
                DaemonError::ConfigError(format!("invalid header name: {}", entry.name))
            })?;
            let value: HeaderValue = entry.value.parse().map_err(|_| {
                DaemonError::ConfigError(format!("invalid header value for {}", entry.name))
            })?;
            parsed.push((name, value));
        }
        Ok(ResponseHeaders(parsed))
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.0 {
            headers.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
