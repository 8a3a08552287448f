//! API Module
//!
//! HTTP front of the offline controller.
//!
//! # Endpoints
//! - `GET /__offline/health` - Health check endpoint
//! - `GET /__offline/status` - Controller status
//! - everything else - Intercepted and served from cache or network

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
