//! Application state management for healthquery.
//!
//! This module contains the `App` struct that owns the session controller,
//! the auth form, the query workspace (input, current result, history) and
//! the channel that brings background request results back to the UI loop.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use healthquery_core::api::ApiError;
use healthquery_core::auth::{AuthOutcome, AuthRequest, Operation, QueryRequest, SessionController};
use healthquery_core::models::{AuthMode, AuthResponse, Credentials, QueryResult};
use healthquery_core::{Config, QueryHistory};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Only one request is in flight at a time, so a few slots is plenty.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for query input.
const MAX_QUERY_LENGTH: usize = 200;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay state on top of whichever screen the session selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Auth form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFocus {
    Mode,
    Username,
    Password,
    Button,
}

impl AuthFocus {
    pub fn next(&self) -> Self {
        match self {
            AuthFocus::Mode => AuthFocus::Username,
            AuthFocus::Username => AuthFocus::Password,
            AuthFocus::Password => AuthFocus::Button,
            AuthFocus::Button => AuthFocus::Mode,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            AuthFocus::Mode => AuthFocus::Button,
            AuthFocus::Username => AuthFocus::Mode,
            AuthFocus::Password => AuthFocus::Username,
            AuthFocus::Button => AuthFocus::Password,
        }
    }
}

/// Which part of the query workspace receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceFocus {
    Query,
    Results,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Responses sent back from spawned request tasks
enum TaskResult {
    Auth(AuthRequest, Result<AuthResponse, ApiError>),
    Query(QueryRequest, Result<QueryResult, ApiError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    config_path: Option<PathBuf>,
    pub session: SessionController,

    pub state: AppState,

    // Auth form state
    pub auth_mode: AuthMode,
    pub auth_username: String,
    pub auth_password: String,
    pub auth_focus: AuthFocus,

    // Workspace state
    pub workspace_focus: WorkspaceFocus,
    pub query_input: String,
    pub result: Option<QueryResult>,
    pub history: QueryHistory,
    pub result_selection: usize,
    /// Index into `history` while recalling with ↑/↓
    history_cursor: Option<usize>,

    // Status message (non-error notices)
    pub status_message: Option<String>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Create the app around an already-hydrated session.
    ///
    /// `config_path` is where `last_username` is saved after login; `None`
    /// keeps the config in memory only.
    pub fn new(config: Config, config_path: Option<PathBuf>, session: SessionController) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let auth_username = if session.username().is_empty() {
            config.initial_username()
        } else {
            session.username().to_string()
        };
        let auth_password = std::env::var(healthquery_core::config::ENV_PASSWORD).unwrap_or_default();
        let auth_focus = if auth_username.is_empty() {
            AuthFocus::Username
        } else {
            AuthFocus::Password
        };

        debug!(authenticated = session.is_authenticated(), "App created");

        Self {
            config,
            config_path,
            session,

            state: AppState::Normal,

            auth_mode: AuthMode::Login,
            auth_username,
            auth_password,
            auth_focus,

            workspace_focus: WorkspaceFocus::Query,
            query_input: String::new(),
            result: None,
            history: QueryHistory::new(),
            result_selection: 0,
            history_cursor: None,

            status_message: None,

            task_rx: rx,
            task_tx: tx,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The single current error message
    pub fn error(&self) -> Option<&str> {
        self.session.error()
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.session.in_flight()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn toggle_auth_mode(&mut self) {
        self.auth_mode = self.auth_mode.toggle();
        self.session.clear_error();
        self.status_message = None;
    }

    /// Validate the auth form and send it on a background task.
    ///
    /// Validation failures and busy rejections land in the session error
    /// without any request being made.
    pub fn submit_auth(&mut self) {
        self.status_message = None;
        let credentials = Credentials::new(self.auth_username.clone(), self.auth_password.clone());

        let request = match self.session.begin_auth(self.auth_mode, credentials) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Auth attempt rejected locally");
                return;
            }
        };

        let api = self.session.api().clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = request.send(&api).await;
            Self::send_result(&tx, TaskResult::Auth(request, outcome)).await;
        });
    }

    fn apply_auth(&mut self, request: AuthRequest, outcome: Result<AuthResponse, ApiError>) {
        match self.session.finish_auth(request, outcome) {
            Ok(AuthOutcome::LoggedIn { username }) => {
                self.auth_password.clear();
                self.remember_username(&username);
                self.on_authenticated();
            }
            Ok(AuthOutcome::SignedUp { username, message }) => {
                // Signing up does not sign in; hand the user to the login form
                self.auth_mode = AuthMode::Login;
                self.auth_username = username;
                self.auth_password.clear();
                self.auth_focus = AuthFocus::Password;
                self.status_message = Some(message);
            }
            Err(e) => {
                debug!(error = %e, "Auth attempt failed");
            }
        }
    }

    fn remember_username(&mut self, username: &str) {
        self.config.last_username = Some(username.to_string());
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    /// Entering the workspace puts the cursor in the query field
    fn on_authenticated(&mut self) {
        self.state = AppState::Normal;
        self.workspace_focus = WorkspaceFocus::Query;
        self.status_message = None;
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.result = None;
        self.result_selection = 0;
        self.query_input.clear();
        self.history_cursor = None;
        self.status_message = Some("Logged out".to_string());

        self.auth_mode = AuthMode::Login;
        self.auth_password.clear();
        self.auth_focus = if self.auth_username.is_empty() {
            AuthFocus::Username
        } else {
            AuthFocus::Password
        };
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Send the query input on a background task
    pub fn submit_query(&mut self) {
        self.status_message = None;
        self.history_cursor = None;

        let request = match self.session.begin_query(&self.query_input) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Query rejected locally");
                return;
            }
        };

        info!(query = %request.text, "Submitting query");
        let api = self.session.api().clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = request.send(&api).await;
            Self::send_result(&tx, TaskResult::Query(request, outcome)).await;
        });
    }

    fn apply_query(&mut self, request: QueryRequest, outcome: Result<QueryResult, ApiError>) {
        let text = request.text.clone();
        match self.session.finish_query(request, outcome) {
            Ok(result) => {
                self.history.push(text);
                self.result = Some(result);
                self.result_selection = 0;
            }
            Err(ApiError::Superseded) => {}
            Err(e) => {
                debug!(error = %e, "Query failed, clearing result");
                self.result = None;
                self.result_selection = 0;
            }
        }
    }

    /// Step through history into the query field. `older` moves back in time.
    pub fn recall_history(&mut self, older: bool) {
        if self.history.is_empty() {
            return;
        }
        let last = self.history.len() - 1;
        let next = match (self.history_cursor, older) {
            (None, true) => Some(0),
            (None, false) => None,
            (Some(i), true) => Some((i + 1).min(last)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };

        self.history_cursor = next;
        self.query_input = match next {
            Some(i) => self
                .history
                .get(i)
                .map(|e| e.text.clone())
                .unwrap_or_default(),
            None => String::new(),
        };
    }

    /// Number of rows in the current result table
    pub fn result_row_count(&self) -> usize {
        self.result
            .as_ref()
            .and_then(|r| r.entry.as_ref())
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let count = self.result_row_count();
        if count == 0 {
            self.result_selection = 0;
            return;
        }
        let current = self.result_selection as isize;
        self.result_selection = (current + delta).clamp(0, count as isize - 1) as usize;
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            warn!("Failed to send task result - channel closed");
        }
    }

    /// Apply any responses that arrived since the last frame
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.apply_task_result(result);
        }
    }

    fn apply_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Auth(request, outcome) => self.apply_auth(request, outcome),
            TaskResult::Query(request, outcome) => self.apply_query(request, outcome),
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_query_char(current_len: usize, c: char) -> bool {
    current_len < MAX_QUERY_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
