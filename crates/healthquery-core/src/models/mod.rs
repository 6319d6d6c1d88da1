//! Data models for the health query service.
//!
//! - `Session`, `Credentials`, `AuthMode`: who the user is and how they sign in
//! - `QueryResult`, `QueryEntry`, `PatientResource`: the simulated FHIR bundle
//!   returned by the query endpoint

pub mod query;
pub mod session;

pub use query::{AgeFilter, PatientResource, QueryEntry, QueryFilters, QueryResult};
pub use session::{AuthMode, AuthResponse, Credentials, Identity, Session, SessionState};
