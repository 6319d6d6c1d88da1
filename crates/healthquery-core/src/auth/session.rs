//! The session controller: the only writer of session, error and
//! credential-store state.
//!
//! Every operation is split into a `begin_*` step that validates and claims
//! the session, and a `finish_*` step that applies the response. The TUI
//! runs the network call in between on a background task; the async
//! `authenticate` / `submit_query` helpers run all three steps inline.
//!
//! Only one operation may be in flight at a time. `logout` is always
//! allowed and bumps a generation counter so that responses to requests
//! started before it are dropped.

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{
    AuthMode, AuthResponse, Credentials, Identity, QueryResult, Session, SessionState,
};

use super::credentials::CredentialStore;
use super::password::{validate_password, PASSWORD_RULE_MESSAGE, USERNAME_REQUIRED_MESSAGE};

/// Shown when the query text is blank
pub const EMPTY_QUERY_MESSAGE: &str = "Query cannot be empty.";

/// Shown after a successful signup when the service sends no message
const SIGNUP_DEFAULT_MESSAGE: &str = "Account created. Please log in.";

/// What kind of call currently holds the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Auth(AuthMode),
    Query,
}

/// A validated auth call waiting to be sent
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub mode: AuthMode,
    pub credentials: Credentials,
    generation: u64,
}

impl AuthRequest {
    pub async fn send(&self, api: &ApiClient) -> Result<AuthResponse, ApiError> {
        api.authenticate(self.mode, &self.credentials).await
    }
}

/// A validated query waiting to be sent
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub text: String,
    token: String,
    generation: u64,
}

impl QueryRequest {
    pub async fn send(&self, api: &ApiClient) -> Result<QueryResult, ApiError> {
        api.query(&self.token, &self.text).await
    }
}

/// Result of a successful auth call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Session is now authenticated
    LoggedIn { username: String },
    /// Account exists; the user still has to log in
    SignedUp { username: String, message: String },
}

pub struct SessionController {
    api: ApiClient,
    store: CredentialStore,
    session: Session,
    error: Option<String>,
    in_flight: Option<Operation>,
    generation: u64,
}

impl SessionController {
    /// Create the controller, hydrating the session from `store`
    pub fn new(api: ApiClient, store: CredentialStore) -> Self {
        let session = store.get();
        debug!(
            authenticated = session.is_authenticated(),
            username = %session.username,
            "Session hydrated"
        );

        Self {
            api,
            store,
            session,
            error: None,
            in_flight: None,
            generation: 0,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn username(&self) -> &str {
        &self.session.username
    }

    /// The current error message, if the last attempt failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        if !err.is_silent() {
            self.error = Some(err.to_string());
        }
        err
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Validate an auth attempt and claim the session for it.
    ///
    /// Fails without touching the network if another call is in flight, the
    /// username is blank, or the password fails the shape check. The
    /// username is trimmed before it is sent.
    pub fn begin_auth(
        &mut self,
        mode: AuthMode,
        credentials: Credentials,
    ) -> Result<AuthRequest, ApiError> {
        if self.is_busy() {
            return Err(self.fail(ApiError::Busy));
        }
        self.error = None;

        // Usernames are sent and stored trimmed, whichever front-end typed them
        let credentials = Credentials {
            username: credentials.username.trim().to_string(),
            ..credentials
        };
        if credentials.username.is_empty() {
            return Err(self.fail(ApiError::Validation(USERNAME_REQUIRED_MESSAGE.to_string())));
        }
        if !validate_password(&credentials.password) {
            debug!(%mode, "Password failed local shape check");
            return Err(self.fail(ApiError::Validation(PASSWORD_RULE_MESSAGE.to_string())));
        }

        self.in_flight = Some(Operation::Auth(mode));
        Ok(AuthRequest {
            mode,
            credentials,
            generation: self.generation,
        })
    }

    /// Apply the response to a request from `begin_auth`.
    ///
    /// A successful login stores the token and username and moves the
    /// session to `Authenticated`. Signup never establishes a session.
    pub fn finish_auth(
        &mut self,
        request: AuthRequest,
        outcome: Result<AuthResponse, ApiError>,
    ) -> Result<AuthOutcome, ApiError> {
        if request.generation != self.generation {
            debug!(mode = %request.mode, "Dropping auth response from before logout");
            return Err(ApiError::Superseded);
        }
        self.in_flight = None;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(mode = %request.mode, error = %e, "Authentication failed");
                return Err(self.fail(e));
            }
        };

        let username = request.credentials.username;
        match request.mode {
            AuthMode::Login => {
                let token = match response.access_token.filter(|t| !t.is_empty()) {
                    Some(token) => token,
                    None => {
                        return Err(self.fail(ApiError::Decode(
                            "login response has no access_token".to_string(),
                        )))
                    }
                };

                if let Err(e) = self.store.set(&token, &username) {
                    warn!(error = %e, "Failed to persist session");
                }
                self.session = Session::new(token, username.clone());
                self.error = None;
                info!(username = %username, "Login successful");
                Ok(AuthOutcome::LoggedIn { username })
            }
            AuthMode::Signup => {
                self.error = None;
                info!(username = %username, "Signup successful");
                Ok(AuthOutcome::SignedUp {
                    username,
                    message: response
                        .msg
                        .unwrap_or_else(|| SIGNUP_DEFAULT_MESSAGE.to_string()),
                })
            }
        }
    }

    /// Validate, send and apply an auth call in one step
    pub async fn authenticate(
        &mut self,
        mode: AuthMode,
        credentials: Credentials,
    ) -> Result<AuthOutcome, ApiError> {
        let request = self.begin_auth(mode, credentials)?;
        let outcome = request.send(&self.api).await;
        self.finish_auth(request, outcome)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Validate a query and claim the session for it.
    ///
    /// Fails with `MissingToken` and no network call when nobody is logged in.
    pub fn begin_query(&mut self, text: &str) -> Result<QueryRequest, ApiError> {
        if self.is_busy() {
            return Err(self.fail(ApiError::Busy));
        }
        self.error = None;

        let token = match self.session.token() {
            Some(token) => token.to_string(),
            None => return Err(self.fail(ApiError::MissingToken)),
        };
        if text.trim().is_empty() {
            return Err(self.fail(ApiError::Validation(EMPTY_QUERY_MESSAGE.to_string())));
        }

        self.in_flight = Some(Operation::Query);
        Ok(QueryRequest {
            text: text.to_string(),
            token,
            generation: self.generation,
        })
    }

    /// Apply the response to a request from `begin_query`
    pub fn finish_query(
        &mut self,
        request: QueryRequest,
        outcome: Result<QueryResult, ApiError>,
    ) -> Result<QueryResult, ApiError> {
        if request.generation != self.generation {
            debug!("Dropping query response from before logout");
            return Err(ApiError::Superseded);
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                self.error = None;
                Ok(result)
            }
            Err(e) => {
                warn!(query = %request.text, error = %e, "Query failed");
                Err(self.fail(e))
            }
        }
    }

    /// Validate, send and apply a query in one step
    pub async fn submit_query(&mut self, text: &str) -> Result<QueryResult, ApiError> {
        let request = self.begin_query(text)?;
        let outcome = request.send(&self.api).await;
        self.finish_query(request, outcome)
    }

    /// Ask the service who the current token belongs to
    pub async fn whoami(&self) -> Result<Identity, ApiError> {
        let token = self.session.token().ok_or(ApiError::MissingToken)?;
        self.api.whoami(token).await
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Clear the session and the credential store.
    ///
    /// Any request still in flight is abandoned; its response will be
    /// dropped by `finish_*`.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        info!(username = %self.session.username, "Logged out");

        self.session = Session::default();
        self.error = None;
        self.in_flight = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::MemoryBackend;

    fn controller_with(session: Session) -> SessionController {
        // Nothing listens on port 9 (discard); these tests never reach the network.
        let api = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        SessionController::new(api, CredentialStore::new(MemoryBackend::with_session(session)))
    }

    fn login_ok(token: &str) -> Result<AuthResponse, ApiError> {
        Ok(AuthResponse {
            access_token: Some(token.to_string()),
            msg: None,
        })
    }

    #[test]
    fn test_hydrates_from_store() {
        let controller = controller_with(Session::new("abc", "alice"));
        assert_eq!(controller.state(), SessionState::Authenticated);
        assert_eq!(controller.username(), "alice");

        let controller = controller_with(Session::default());
        assert_eq!(controller.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_weak_password_blocks_auth() {
        let mut controller = controller_with(Session::default());
        let err = controller
            .begin_auth(AuthMode::Login, Credentials::new("alice", "abcdefg1"))
            .unwrap_err();

        assert_eq!(err, ApiError::Validation(PASSWORD_RULE_MESSAGE.to_string()));
        assert_eq!(controller.error(), Some(PASSWORD_RULE_MESSAGE));
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_blank_username_blocks_auth() {
        let mut controller = controller_with(Session::default());
        let err = controller
            .begin_auth(AuthMode::Signup, Credentials::new("   ", "Abcdef1!"))
            .unwrap_err();
        assert_eq!(err, ApiError::Validation(USERNAME_REQUIRED_MESSAGE.to_string()));
    }

    #[test]
    fn test_login_success_persists_session() {
        let mut controller = controller_with(Session::default());
        let request = controller
            .begin_auth(AuthMode::Login, Credentials::new("alice", "Abcdef1!"))
            .unwrap();
        assert_eq!(controller.in_flight(), Some(Operation::Auth(AuthMode::Login)));

        let outcome = controller.finish_auth(request, login_ok("jwt-1")).unwrap();
        assert_eq!(outcome, AuthOutcome::LoggedIn { username: "alice".to_string() });
        assert_eq!(controller.state(), SessionState::Authenticated);
        assert_eq!(controller.store().get(), Session::new("jwt-1", "alice"));
        assert!(controller.error().is_none());
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_username_is_trimmed_before_sending() {
        let mut controller = controller_with(Session::default());
        let request = controller
            .begin_auth(AuthMode::Login, Credentials::new("  alice ", "Abcdef1!"))
            .unwrap();
        assert_eq!(request.credentials.username, "alice");

        let outcome = controller.finish_auth(request, login_ok("jwt-1")).unwrap();
        assert_eq!(outcome, AuthOutcome::LoggedIn { username: "alice".to_string() });
        assert_eq!(controller.store().get(), Session::new("jwt-1", "alice"));
    }

    #[test]
    fn test_signup_success_does_not_log_in() {
        let mut controller = controller_with(Session::default());
        let request = controller
            .begin_auth(AuthMode::Signup, Credentials::new("bob", "Abcdef1!"))
            .unwrap();
        let outcome = controller
            .finish_auth(
                request,
                Ok(AuthResponse {
                    access_token: None,
                    msg: Some("User registered successfully".to_string()),
                }),
            )
            .unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::SignedUp {
                username: "bob".to_string(),
                message: "User registered successfully".to_string(),
            }
        );
        assert_eq!(controller.state(), SessionState::Anonymous);
        assert_eq!(controller.store().get(), Session::default());
    }

    #[test]
    fn test_login_without_token_is_decode_error() {
        let mut controller = controller_with(Session::default());
        let request = controller
            .begin_auth(AuthMode::Login, Credentials::new("alice", "Abcdef1!"))
            .unwrap();
        let err = controller
            .finish_auth(request, Ok(AuthResponse::default()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(controller.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_auth_failure_sets_error() {
        let mut controller = controller_with(Session::default());
        let request = controller
            .begin_auth(AuthMode::Login, Credentials::new("alice", "Abcdef1!"))
            .unwrap();
        let err = controller
            .finish_auth(request, Err(ApiError::Auth("Bad username or password".to_string())))
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad username or password");
        assert_eq!(controller.error(), Some("Bad username or password"));
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_query_without_token_fails_immediately() {
        let mut controller = controller_with(Session::default());
        let err = controller.begin_query("patients with asthma").unwrap_err();
        assert_eq!(err, ApiError::MissingToken);
        assert_eq!(controller.error(), Some("Missing JWT token. Please login."));
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_blank_query_rejected() {
        let mut controller = controller_with(Session::new("abc", "alice"));
        let err = controller.begin_query("  ").unwrap_err();
        assert_eq!(err, ApiError::Validation(EMPTY_QUERY_MESSAGE.to_string()));
    }

    #[test]
    fn test_second_call_while_in_flight_is_busy() {
        let mut controller = controller_with(Session::new("abc", "alice"));
        let first = controller.begin_query("asthma").unwrap();

        assert_eq!(controller.begin_query("diabetes").unwrap_err(), ApiError::Busy);
        assert_eq!(
            controller
                .begin_auth(AuthMode::Login, Credentials::new("alice", "Abcdef1!"))
                .unwrap_err(),
            ApiError::Busy
        );
        assert_eq!(controller.error(), Some("A request is already in progress."));

        // Completing the first call frees the session again
        controller.finish_query(first, Ok(QueryResult::default())).unwrap();
        assert!(controller.error().is_none());
        assert!(controller.begin_query("diabetes").is_ok());
    }

    #[test]
    fn test_new_attempt_clears_previous_error() {
        let mut controller = controller_with(Session::new("abc", "alice"));
        let request = controller.begin_query("asthma").unwrap();
        let _ = controller.finish_query(request, Err(ApiError::Query("Query failed".to_string())));
        assert_eq!(controller.error(), Some("Query failed"));

        let _request = controller.begin_query("asthma").unwrap();
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut controller = controller_with(Session::new("abc", "alice"));
        let _ = controller.begin_query("  ");
        assert!(controller.error().is_some());

        controller.logout();
        assert_eq!(controller.state(), SessionState::Anonymous);
        assert_eq!(controller.store().get(), Session::default());
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_response_after_logout_is_dropped() {
        let mut controller = controller_with(Session::new("abc", "alice"));
        let request = controller.begin_query("asthma").unwrap();

        controller.logout();
        assert!(!controller.is_busy());

        let err = controller
            .finish_query(request, Err(ApiError::Query("Query failed".to_string())))
            .unwrap_err();
        assert_eq!(err, ApiError::Superseded);
        assert!(controller.error().is_none());
        assert_eq!(controller.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_stale_login_does_not_resurrect_session() {
        let mut controller = controller_with(Session::new("old", "alice"));
        controller.logout();
        let request = controller
            .begin_auth(AuthMode::Login, Credentials::new("alice", "Abcdef1!"))
            .unwrap();
        controller.logout();

        let err = controller.finish_auth(request, login_ok("jwt-2")).unwrap_err();
        assert_eq!(err, ApiError::Superseded);
        assert_eq!(controller.state(), SessionState::Anonymous);
        assert_eq!(controller.store().get(), Session::default());
    }
}
