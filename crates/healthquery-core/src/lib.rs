//! Core library for healthquery.
//!
//! A client for a natural-language health query service: sign in with a
//! username and password, keep the resulting bearer token, submit free-text
//! queries, and derive what the result table and condition chart should
//! show. Front-ends (the `healthquery` TUI and CLI) sit on top of
//! [`auth::SessionController`].

pub mod api;
pub mod auth;
pub mod config;
pub mod history;
pub mod models;
pub mod results;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthOutcome, CredentialStore, SessionController};
pub use config::Config;
pub use history::QueryHistory;
