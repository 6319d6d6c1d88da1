//! One-shot subcommands that run without the TUI.
//!
//! They go through the same `SessionController` as the interactive client,
//! so a login here is picked up by the next TUI start and vice versa.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use healthquery_core::auth::AuthOutcome;
use healthquery_core::config::ENV_PASSWORD;
use healthquery_core::models::{AuthMode, Credentials, PatientResource, QueryResult};
use healthquery_core::results::{condition_breakdown, NO_RESULTS_MESSAGE};
use healthquery_core::{Config, SessionController};

#[derive(Debug, Parser)]
#[command(name = "healthquery", version)]
#[command(about = "Ask a health records service questions in plain English")]
pub struct Cli {
    /// Query service address (overrides config and HEALTHQUERY_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        /// Defaults to HEALTHQUERY_USERNAME or the last username used
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account (does not log in)
    Signup {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Run a natural-language query against the stored session
    Query {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
        /// The query text, e.g. "female patients over 50 with diabetes"
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Forget the stored session
    Logout,
    /// Ask the service who the stored token belongs to
    Whoami,
    /// Show server, storage and session state
    Status,
}

pub async fn run(command: Command, mut config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let mut session = SessionController::new(config.api_client()?, config.credential_store()?);

    match command {
        Command::Login { username } => {
            let username = resolve_username(username, &config)?;
            let username = match authenticate(&mut session, AuthMode::Login, &username).await? {
                AuthOutcome::LoggedIn { username } | AuthOutcome::SignedUp { username, .. } => {
                    username
                }
            };
            config.last_username = Some(username.clone());
            if let Some(ref path) = config_path {
                if let Err(e) = config.save_to(path) {
                    warn!(error = %e, "Failed to save config");
                }
            }
            println!("Welcome, {}!", username);
        }
        Command::Signup { username } => {
            let username = resolve_username(username, &config)?;
            if let AuthOutcome::SignedUp { username, message } =
                authenticate(&mut session, AuthMode::Signup, &username).await?
            {
                println!("{}", message);
                println!("Run `healthquery login -u {}` to sign in.", username);
            }
        }
        Command::Query { json, text } => {
            let text = text.join(" ");
            let result = session.submit_query(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", format_result(&result));
            }
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            let identity = session.whoami().await?;
            println!("{}", identity.logged_in_as);
        }
        Command::Status => {
            println!("Server:   {}", session.api().base_url());
            println!("Storage:  {}", session.store().describe());
            if session.is_authenticated() {
                println!("Session:  logged in as {}", session.username());
            } else {
                println!("Session:  not logged in");
            }
        }
    }

    Ok(())
}

fn resolve_username(arg: Option<String>, config: &Config) -> Result<String> {
    if let Some(username) = arg {
        return Ok(username);
    }
    let known = config.initial_username();
    if !known.is_empty() {
        return Ok(known);
    }
    eprint!("Username: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read username")?;
    Ok(line.trim().to_string())
}

fn read_password() -> Result<String> {
    match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

async fn authenticate(
    session: &mut SessionController,
    mode: AuthMode,
    username: &str,
) -> Result<AuthOutcome> {
    let credentials = Credentials::new(username, read_password()?);
    Ok(session.authenticate(mode, credentials).await?)
}

/// Plain-text rendering of a query result: filters, patient table, then
/// the condition breakdown.
fn format_result(result: &QueryResult) -> String {
    let mut out = String::new();

    if let Some(filters) = result.filters.as_ref().filter(|f| !f.is_empty()) {
        let _ = writeln!(out, "Filters: {}", filters.summary());
        out.push('\n');
    }

    if !result.has_entries() {
        let _ = writeln!(out, "{}", NO_RESULTS_MESSAGE);
        return out;
    }
    let rows = result.resources();

    out.push_str(&format_table(&rows));
    out.push('\n');

    let total = rows.len();
    let _ = writeln!(out, "Conditions:");
    for slice in condition_breakdown(&rows) {
        let _ = writeln!(
            out,
            "  {:<20} {:>3}  {:>3.0}%",
            slice.label,
            slice.count,
            slice.percent(total)
        );
    }
    out
}

fn format_table(rows: &[&PatientResource]) -> String {
    let name_width = rows
        .iter()
        .map(|p| p.name_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {:>3}  Condition", "Name", "Age");
    for patient in rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>3}  {}",
            patient.name_str(),
            patient.age_str(),
            patient.condition_str()
        );
    }
    out
}
