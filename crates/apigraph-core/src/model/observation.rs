//! Live-traffic observation records.
//!
//! Gathering these is owned by an external collaborator; the core only
//! consumes them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::key::HttpMethod;

/// One observed request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub method: HttpMethod,
    /// Concrete request path, e.g. `/users/42`. An embedded query string
    /// contributes parameter names through [`Observation::query_names`].
    pub path: String,
    /// `None` when the call never produced an HTTP response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    /// Transport-level failure description (timeout, refused connection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Observation {
    pub fn new(method: HttpMethod, path: impl Into<String>, status: u16) -> Self {
        Self {
            method,
            path: path.into(),
            status: Some(status),
            body: None,
            query: BTreeMap::new(),
            error: None,
        }
    }

    pub fn transport_failure(method: HttpMethod, path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            status: None,
            body: None,
            query: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status.is_none()
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }

    /// Query parameter names from `query` and from any `?a=1&b` suffix of `path`.
    pub fn query_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.query.keys().cloned().collect();
        if let Some((_, query)) = self.path.split_once('?') {
            let query = query.split('#').next().unwrap_or_default();
            names.extend(
                query
                    .split('&')
                    .map(|pair| pair.split_once('=').map_or(pair, |(name, _)| name))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }
        names
    }

    /// Status rendered the way spec documents key responses (`"200"`).
    pub fn status_key(&self) -> Option<String> {
        self.status.map(|s| s.to_string())
    }
}
