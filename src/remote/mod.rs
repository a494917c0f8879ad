//! Client for the hosted Lux model API.

pub mod http;
pub mod schema;

pub use http::{HttpBackend, RemoteConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
