//! Screen content below the title bar.
//!
//! - `auth`: the login / sign-up form shown while anonymous
//! - `workspace`: query field, messages, results and recent queries
//! - `results`: the patient table and the condition chart

pub mod auth;
pub mod results;
pub mod workspace;
