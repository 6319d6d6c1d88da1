use serde_json::Value;
use thiserror::Error;

/// Fallback shown when an auth call fails without a server message
pub const AUTH_FAILED: &str = "Authentication failed";

/// Fallback shown when a query fails without a server message
pub const QUERY_FAILED: &str = "Query failed";

/// Every failure a session operation can end in.
///
/// `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    /// Login/signup rejected or unreachable
    #[error("{0}")]
    Auth(String),

    /// Query rejected or unreachable
    #[error("{0}")]
    Query(String),

    #[error("Missing JWT token. Please login.")]
    MissingToken,

    /// A 2xx response whose body did not have the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("A request is already in progress.")]
    Busy,

    /// The session was logged out while the request was in flight
    #[error("Request discarded after logout")]
    Superseded,
}

/// Maximum length for server messages carried into errors
const MAX_ERROR_MESSAGE_LENGTH: usize = 200;

impl ApiError {
    /// Truncate a server message to keep the UI readable
    fn truncate(message: &str) -> String {
        if message.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
            message.to_string()
        } else {
            let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
            format!("{}...", truncated)
        }
    }

    /// Pull `field` out of a JSON error body, if it is a non-empty string
    pub fn server_message(body: &str, field: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        value
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(Self::truncate)
    }

    /// Build the error for a non-2xx auth response
    pub fn auth_from_body(body: &str) -> Self {
        ApiError::Auth(Self::server_message(body, "msg").unwrap_or_else(|| AUTH_FAILED.to_string()))
    }

    /// Build the error for a non-2xx query response
    pub fn query_from_body(body: &str) -> Self {
        ApiError::Query(
            Self::server_message(body, "error").unwrap_or_else(|| QUERY_FAILED.to_string()),
        )
    }

    /// True for failures that should not replace the current error message
    pub fn is_silent(&self) -> bool {
        matches!(self, ApiError::Superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_uses_server_msg() {
        let err = ApiError::auth_from_body(r#"{"msg": "Bad username or password"}"#);
        assert_eq!(err, ApiError::Auth("Bad username or password".to_string()));
        assert_eq!(err.to_string(), "Bad username or password");
    }

    #[test]
    fn test_auth_error_falls_back_to_generic() {
        assert_eq!(ApiError::auth_from_body("").to_string(), AUTH_FAILED);
        assert_eq!(ApiError::auth_from_body("<html>502</html>").to_string(), AUTH_FAILED);
        assert_eq!(ApiError::auth_from_body(r#"{"msg": ""}"#).to_string(), AUTH_FAILED);
        assert_eq!(ApiError::auth_from_body(r#"{"msg": 42}"#).to_string(), AUTH_FAILED);
    }

    #[test]
    fn test_query_error_reads_error_field() {
        let err = ApiError::query_from_body(r#"{"error": "'query' cannot be empty"}"#);
        assert_eq!(err.to_string(), "'query' cannot be empty");

        // flask-jwt-extended answers 401 with `msg`, not `error`
        let err = ApiError::query_from_body(r#"{"msg": "Token has expired"}"#);
        assert_eq!(err.to_string(), QUERY_FAILED);
    }

    #[test]
    fn test_long_server_message_is_truncated() {
        let long = "x".repeat(500);
        let body = serde_json::json!({ "msg": long }).to_string();
        let message = ApiError::auth_from_body(&body).to_string();
        assert!(message.len() < 250);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_missing_token_message() {
        assert_eq!(
            ApiError::MissingToken.to_string(),
            "Missing JWT token. Please login."
        );
    }
}
