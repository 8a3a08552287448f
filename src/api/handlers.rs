//! API Handlers
//!
//! Diagnostic endpoints and the intercepting handler every other request
//! goes through.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{request::Parts, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::controller::OfflineController;
use crate::error::{OfflineError, Result};
use crate::models::{FetchRequest, FetchResponse, HealthResponse, RequestMode, StatusResponse};
use crate::network::{is_hop_by_hop, Network};

/// Largest request body forwarded to the origin
pub const MAX_REQUEST_BODY: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<OfflineController>,
    /// Used directly while the controller does not yet control clients
    pub network: Arc<dyn Network>,
}

impl AppState {
    /// Creates a new AppState.
    ///
    /// `network` must be the same network the controller fetches through.
    pub fn new(controller: Arc<OfflineController>, network: Arc<dyn Network>) -> Self {
        Self {
            controller,
            network,
        }
    }

    /// Builds the controller from configuration on top of the given storage
    /// and network.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn crate::cache::CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self> {
        let controller = OfflineController::from_config(config, storage, network.clone())?;
        Ok(Self::new(Arc::new(controller), network))
    }
}

/// Handler for GET /__offline/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /__offline/status
///
/// Reports lifecycle phase, the current cache and fetch counters.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let controller = &state.controller;
    Json(StatusResponse::new(
        controller.phase().await,
        controller.cache_name(),
        controller.controls_clients(),
        controller.skip_waiting_requested(),
        controller.cache_stats().await,
        controller.stats(),
    ))
}

/// Fallback handler for every other request.
///
/// Before activation requests go straight to the network, like a page that
/// no controller has claimed yet.
pub async fn intercept_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| OfflineError::InvalidRequest(format!("request body: {}", e)))?;
    let fetch_request =
        to_fetch_request(state.controller.origin(), &parts)?.with_body(body);

    let response = if state.controller.controls_clients() {
        state.controller.on_fetch(fetch_request).await?
    } else {
        debug!("Uncontrolled request {}, passing through", fetch_request.url);
        state.network.fetch(&fetch_request).await?
    };

    into_http_response(response)
}

/// Maps an incoming request onto the origin.
///
/// Only the path and query are taken from the request; scheme, host and port
/// always come from `origin`, so a path such as `//other.host/x` stays on
/// the origin.
pub fn to_fetch_request(origin: &Url, parts: &Parts) -> Result<FetchRequest> {
    let url = origin_url(origin, parts)?;

    let mode = RequestMode::from_header(
        parts
            .headers
            .get("sec-fetch-mode")
            .and_then(|v| v.to_str().ok()),
    );

    let headers = parts
        .headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    Ok(FetchRequest::new(parts.method.as_str(), url, mode).with_headers(headers))
}

fn origin_url(origin: &Url, parts: &Parts) -> Result<Url> {
    let mut url = origin.clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());
    url.set_fragment(None);

    if url.origin() != origin.origin() {
        return Err(OfflineError::InvalidRequest(format!(
            "{} is not on {}",
            parts.uri, origin
        )));
    }
    Ok(url)
}

/// Converts a controller response into an HTTP response, body untouched.
pub fn into_http_response(response: FetchResponse) -> Result<Response> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);

    for (name, value) in &response.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(value) {
            builder = builder.header(name.as_str(), value);
        }
    }

    builder
        .body(Body::from(response.body))
        .map_err(|e| OfflineError::Internal(format!("building response: {}", e)))
}
