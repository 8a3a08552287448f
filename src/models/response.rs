//! Response types returned by the offline controller
//!
//! A response is either the verbatim network response or a verbatim cached
//! copy of one. Bodies are `Bytes`, so handing one copy to the caller and
//! another to the cache is a reference-count bump, not a re-read.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

// == Response Type ==
/// Origin classification of a network response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response with readable status and body
    Cors,
    /// Cross-origin response without readable status
    Opaque,
    /// Network error surrogate
    Error,
}

// == Fetch Response ==
/// A response as produced by the network or stored in a cache.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub response_type: ResponseType,
    /// Final URL after redirects
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}

impl FetchResponse {
    /// Creates a response with no headers.
    pub fn new(
        status: u16,
        body: impl Into<Bytes>,
        response_type: ResponseType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            response_type,
            url: url.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response may be stored opportunistically.
    ///
    /// Opaque responses have no readable status and are accepted as-is;
    /// basic and cors responses must be a plain 200.
    pub fn is_cacheable(&self) -> bool {
        match self.response_type {
            ResponseType::Opaque => true,
            ResponseType::Basic | ResponseType::Cors => self.status == 200,
            ResponseType::Error => false,
        }
    }

    /// Approximate storage footprint used for quota accounting.
    pub fn size_bytes(&self) -> usize {
        self.body.len()
            + self
                .headers
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
