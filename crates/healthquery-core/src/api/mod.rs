//! HTTP client module for the health query service.
//!
//! `ApiClient` performs the three calls the client needs (`login`/`signup`,
//! `query`, and the `protected` identity probe) against a single base URL.
//! Authorized calls send the session's JWT as a bearer token.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
