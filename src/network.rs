//! Network Module
//!
//! The fetch primitive the controller falls through to, and the reqwest
//! client that talks to the origin serving the application files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client, Method};
use tracing::debug;
use url::Url;

use crate::error::{OfflineError, Result};
use crate::models::{FetchRequest, FetchResponse, ResponseType};

/// Headers that describe a single connection and are never forwarded.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Returns true when `name` must not cross the proxy.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

// == Network Trait ==
/// Issues a request to the network.
///
/// Resolving with any status (404 included) is a successful fetch; only a
/// transport failure is an `Err`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

// == HTTP Network ==
/// Origin client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
///
/// Redirects are not followed: a 3xx reaches the page as the origin sent it,
/// with a same-origin `Location` made root-relative.
#[derive(Clone, Debug)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| OfflineError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, origin })
    }

    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::new(
            config.origin.clone(),
            Duration::from_secs(config.request_timeout),
        )
    }

    /// Same origin as the configured origin yields `Basic`, anything else `Cors`.
    fn response_type(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }

    /// Rewrites an absolute `Location` on the origin to a root-relative one.
    /// Relative and off-origin locations are returned unchanged.
    fn relative_location(&self, location: &str) -> String {
        match Url::parse(location) {
            Ok(target) if target.origin() == self.origin.origin() => {
                let mut relative = target.path().to_string();
                if let Some(query) = target.query() {
                    relative.push('?');
                    relative.push_str(query);
                }
                if let Some(fragment) = target.fragment() {
                    relative.push('#');
                    relative.push_str(fragment);
                }
                relative
            }
            _ => location.to_string(),
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| OfflineError::InvalidRequest(format!("method {}", request.method)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                let value = if *name == LOCATION {
                    self.relative_location(value)
                } else {
                    value.to_string()
                };
                Some((name.as_str().to_string(), value))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(
            "Fetched {} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(FetchResponse {
            status,
            headers,
            body,
            response_type: self.response_type(&final_url),
            url: final_url.into(),
            fetched_at: chrono::Utc::now(),
        })
    }
}
