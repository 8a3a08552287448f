//! Request and response models
//!
//! Value types flowing through the offline controller, plus the DTOs used
//! for serializing the diagnostic endpoint bodies.

pub mod request;
pub mod response;
pub mod status;

// Re-export commonly used types
pub use request::{FetchRequest, RequestKey, RequestKind, RequestMode};
pub use response::{FetchResponse, ResponseType};
pub use status::{ErrorResponse, HealthResponse, StatusResponse};
