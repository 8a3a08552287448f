//! Controller Module
//!
//! The offline cache controller: install / activate lifecycle and fetch
//! interception.
//!
//! # Entry Points
//! - `on_install` - Precache the manifest into the current cache
//! - `on_activate` - Claim clients
//! - `on_fetch` - Serve one intercepted request

mod lifecycle;
mod manifest;
mod worker;

pub use lifecycle::{FetchStats, Phase};
pub use manifest::PRECACHE_MANIFEST;
pub use worker::OfflineController;
