//! Persistent storage for the `token` / `username` pair.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

use crate::models::Session;

/// Keychain service name
const SERVICE_NAME: &str = "healthquery";

/// Session file name in the data directory
pub const SESSION_FILE: &str = "session.json";

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";

/// Where the two session fields live
pub trait CredentialBackend: Send + Sync {
    /// Read both fields. Missing fields come back empty.
    fn read(&self) -> Result<Session>;

    fn write(&self, session: &Session) -> Result<()>;

    fn remove(&self) -> Result<()>;

    /// Human-readable location, for `status` output
    fn describe(&self) -> String;
}

/// The credential store. Reads never fail; writes report errors.
pub struct CredentialStore {
    backend: Box<dyn CredentialBackend>,
}

impl CredentialStore {
    pub fn new(backend: impl CredentialBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }

    pub fn keyring() -> Self {
        Self::new(KeyringBackend)
    }

    pub fn memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    /// Read the stored session. An unreadable backend reads as empty.
    pub fn get(&self) -> Session {
        match self.backend.read() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, backend = %self.backend.describe(), "Failed to read stored session");
                Session::default()
            }
        }
    }

    pub fn set(&self, token: &str, username: &str) -> Result<()> {
        self.backend.write(&Session::new(token, username))
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove()
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

// ============================================================================
// File backend
// ============================================================================

/// `session.json` in the application data directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

impl CredentialBackend for FileBackend {
    fn read(&self) -> Result<Session> {
        let path = self.path();
        if !path.exists() {
            return Ok(Session::default());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let session: Session =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(session)
    }

    fn write(&self, session: &Session) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        write_private(&path, &contents).context("Failed to write session file")?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Write a file readable only by the current user where the OS supports it
#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

// ============================================================================
// Keyring backend
// ============================================================================

/// OS keychain, one entry per field
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry(key: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")
    }

    fn read_key(key: &str) -> Result<String> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Ok(String::new()),
            Err(e) => Err(e).context("Failed to read from keychain"),
        }
    }

    fn delete_key(key: &str) -> Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

impl CredentialBackend for KeyringBackend {
    fn read(&self) -> Result<Session> {
        Ok(Session {
            token: Self::read_key(TOKEN_KEY)?,
            username: Self::read_key(USERNAME_KEY)?,
        })
    }

    fn write(&self, session: &Session) -> Result<()> {
        Self::entry(TOKEN_KEY)?
            .set_password(&session.token)
            .context("Failed to store token in keychain")?;
        Self::entry(USERNAME_KEY)?
            .set_password(&session.username)
            .context("Failed to store username in keychain")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        Self::delete_key(TOKEN_KEY)?;
        Self::delete_key(USERNAME_KEY)
    }

    fn describe(&self) -> String {
        format!("OS keychain ({})", SERVICE_NAME)
    }
}

// ============================================================================
// Memory backend
// ============================================================================

/// Process-local storage
#[derive(Default)]
pub struct MemoryBackend {
    session: Mutex<Session>,
}

impl MemoryBackend {
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl CredentialBackend for MemoryBackend {
    fn read(&self) -> Result<Session> {
        let session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        Ok(session.clone())
    }

    fn write(&self, session: &Session) -> Result<()> {
        let mut stored = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        *stored = session.clone();
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.write(&Session::default())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::file(dir.path());

        assert_eq!(store.get(), Session::default());

        store.set("jwt-abc", "alice").unwrap();
        assert_eq!(store.get(), Session::new("jwt-abc", "alice"));

        // A second store over the same directory sees the same data
        let reopened = CredentialStore::file(dir.path());
        assert_eq!(reopened.get().token, "jwt-abc");

        store.clear().unwrap();
        assert_eq!(store.get(), Session::default());
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_file_store_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = CredentialStore::file(&nested);
        store.set("t", "u").unwrap();
        assert!(nested.join(SESSION_FILE).exists());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let store = CredentialStore::file(dir.path());
        assert_eq!(store.get(), Session::default());
    }

    #[test]
    fn test_partial_file_fills_missing_with_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), r#"{"token":"abc"}"#).unwrap();
        let store = CredentialStore::file(dir.path());
        assert_eq!(store.get(), Session::new("abc", ""));
    }

    #[test]
    fn test_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::file(dir.path());
        assert!(store.clear().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::file(dir.path());
        store.set("t", "u").unwrap();
        let mode = std::fs::metadata(dir.path().join(SESSION_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = CredentialStore::memory();
        store.set("t", "u").unwrap();
        assert_eq!(store.get(), Session::new("t", "u"));
        store.clear().unwrap();
        assert_eq!(store.get(), Session::default());
    }
}
