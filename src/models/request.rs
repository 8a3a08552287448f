//! Request types seen by the offline controller
//!
//! Every intercepted request carries a mode. The mode, not the URL, decides
//! whether the request is a navigation or an asset load.

use std::fmt;

use axum::body::Bytes;
use serde::Serialize;
use url::Url;

use crate::error::{OfflineError, Result};

// == Request Mode ==
/// Fetch mode of an intercepted request, as reported by `Sec-Fetch-Mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Browser-initiated page load
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

impl RequestMode {
    /// Parses a `Sec-Fetch-Mode` header value.
    ///
    /// Missing or unrecognised values map to `NoCors`, so a request is only
    /// ever treated as a navigation when the client says so.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("navigate") => RequestMode::Navigate,
            Some("same-origin") => RequestMode::SameOrigin,
            Some("cors") => RequestMode::Cors,
            _ => RequestMode::NoCors,
        }
    }
}

// == Request Kind ==
/// Retrieval strategy selector derived from the request mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Network first, then cache, then the shell document
    Navigation,
    /// Cache first, then network (populating the cache)
    Asset,
}

impl From<RequestMode> for RequestKind {
    fn from(mode: RequestMode) -> Self {
        match mode {
            RequestMode::Navigate => RequestKind::Navigation,
            _ => RequestKind::Asset,
        }
    }
}

// == Request Key ==
/// Exact-match key for a cached response.
///
/// Two requests share a key when their method and normalised URL agree.
/// Fragments never reach the network, so they are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Builds a key from a method and an absolute URL.
    pub fn new(method: impl Into<String>, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Key for a plain `GET` of `url`.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Fetch Request ==
/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    /// Forwarded request headers (hop-by-hop headers already removed)
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a bodiless request with no extra headers.
    pub fn new(method: impl Into<String>, url: Url, mode: RequestMode) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url,
            mode,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// `GET` navigation to an absolute URL.
    pub fn navigate(url: &str) -> Result<Self> {
        Ok(Self::new("GET", parse_url(url)?, RequestMode::Navigate))
    }

    /// `GET` asset load of an absolute URL.
    pub fn asset(url: &str) -> Result<Self> {
        Ok(Self::new("GET", parse_url(url)?, RequestMode::NoCors))
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn kind(&self) -> RequestKind {
        RequestKind::from(self.mode)
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), &self.url)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| OfflineError::InvalidRequest(format!("{}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_header() {
        assert_eq!(RequestMode::from_header(Some("navigate")), RequestMode::Navigate);
        assert_eq!(RequestMode::from_header(Some(" Navigate ")), RequestMode::Navigate);
        assert_eq!(RequestMode::from_header(Some("cors")), RequestMode::Cors);
        assert_eq!(RequestMode::from_header(Some("same-origin")), RequestMode::SameOrigin);
        assert_eq!(RequestMode::from_header(Some("websocket")), RequestMode::NoCors);
        assert_eq!(RequestMode::from_header(None), RequestMode::NoCors);
    }

    #[test]
    fn test_kind_follows_mode_not_url() {
        // An .html URL loaded by a script is still an asset
        let req = FetchRequest::new(
            "GET",
            Url::parse("http://app.test/index.html").unwrap(),
            RequestMode::Cors,
        );
        assert_eq!(req.kind(), RequestKind::Asset);

        // A script-looking URL opened as a page is a navigation
        let req = FetchRequest::navigate("http://app.test/index.tsx").unwrap();
        assert_eq!(req.kind(), RequestKind::Navigation);
    }

    #[test]
    fn test_key_drops_fragment_keeps_query() {
        let a = FetchRequest::asset("http://app.test/icon.svg?v=2#top").unwrap();
        let b = FetchRequest::asset("http://app.test/icon.svg?v=2").unwrap();
        let c = FetchRequest::asset("http://app.test/icon.svg?v=3").unwrap();

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_key_distinguishes_method() {
        let url = Url::parse("http://app.test/api").unwrap();
        assert_ne!(RequestKey::new("get", &url), RequestKey::new("POST", &url));
        assert_eq!(RequestKey::new("get", &url).method, "GET");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = FetchRequest::navigate("not a url");
        assert!(matches!(result, Err(OfflineError::InvalidRequest(_))));
    }
}
