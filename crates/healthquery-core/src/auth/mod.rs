//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionController`: the Anonymous/Authenticated state machine
//! - `CredentialStore`: persistent `token`/`username` storage (file, OS keychain, or memory)
//! - `validate_password`: the local password shape check

pub mod credentials;
pub mod password;
pub mod session;

pub use credentials::{CredentialBackend, CredentialStore, FileBackend, KeyringBackend, MemoryBackend};
pub use password::{validate_password, PASSWORD_RULE_MESSAGE, USERNAME_REQUIRED_MESSAGE};
pub use session::{
    AuthOutcome, AuthRequest, Operation, QueryRequest, SessionController, EMPTY_QUERY_MESSAGE,
};
