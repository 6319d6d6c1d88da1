//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Requests are spawned by `App`, so nothing
//! here awaits.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_password_char, can_add_query_char, can_add_username_char, App, AppState, AuthFocus,
    WorkspaceFocus, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if !app.is_authenticated() {
        return handle_auth_input(app, key);
    }

    match app.workspace_focus {
        WorkspaceFocus::Query => handle_query_input(app, key),
        WorkspaceFocus::Results => handle_results_input(app, key),
    }
}

fn handle_auth_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.auth_focus = app.auth_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.auth_focus = app.auth_focus.prev();
        }
        KeyCode::Left | KeyCode::Right if app.auth_focus == AuthFocus::Mode => {
            app.toggle_auth_mode();
        }
        KeyCode::Enter | KeyCode::Char(' ') if app.auth_focus == AuthFocus::Mode => {
            app.toggle_auth_mode();
        }
        KeyCode::Enter => match app.auth_focus {
            AuthFocus::Mode => {}
            AuthFocus::Username => app.auth_focus = AuthFocus::Password,
            AuthFocus::Password => app.auth_focus = AuthFocus::Button,
            AuthFocus::Button => app.submit_auth(),
        },
        KeyCode::Backspace => match app.auth_focus {
            AuthFocus::Username => {
                app.auth_username.pop();
            }
            AuthFocus::Password => {
                app.auth_password.pop();
            }
            AuthFocus::Mode | AuthFocus::Button => {}
        },
        KeyCode::Char(c) => match app.auth_focus {
            AuthFocus::Username => {
                if can_add_username_char(app.auth_username.chars().count(), c) {
                    app.auth_username.push(c);
                }
            }
            AuthFocus::Password => {
                if can_add_password_char(app.auth_password.chars().count(), c) {
                    app.auth_password.push(c);
                }
            }
            AuthFocus::Mode | AuthFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_query_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter => app.submit_query(),
        KeyCode::Esc | KeyCode::Tab => {
            app.workspace_focus = WorkspaceFocus::Results;
        }
        KeyCode::Up => app.recall_history(true),
        KeyCode::Down => app.recall_history(false),
        KeyCode::Backspace => {
            app.query_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_query_char(app.query_input.chars().count(), c) {
                app.query_input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_results_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('/') | KeyCode::Char('i') => {
            app.workspace_focus = WorkspaceFocus::Query;
        }
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('l') => app.logout(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.result_selection = 0,
        KeyCode::End => {
            app.result_selection = app.result_row_count().saturating_sub(1);
        }
        _ => {}
    }
    Ok(false)
}
