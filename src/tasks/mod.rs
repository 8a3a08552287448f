//! Background Tasks Module
//!
//! Contains tasks that run alongside the HTTP front.
//!
//! # Tasks
//! - Install: Precaches and activates the offline controller, retrying until it succeeds

mod install;

pub use install::spawn_install_task;
