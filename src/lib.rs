//! Tafsir Shell - An offline-first app-shell cache
//!
//! Precaches the application shell, serves navigations network-first with a
//! cached fallback and assets cache-first.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod network;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use controller::OfflineController;
pub use tasks::spawn_install_task;
