//! Remote source: the HTTP client, per-entity adapters, and the failure
//! classification the fallback policy keys on.

mod client;
mod endpoint;
mod error;

pub use client::ApiClient;
pub use endpoint::Endpoint;
pub use error::ApiError;
