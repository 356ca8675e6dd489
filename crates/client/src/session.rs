//! Bearer credential lifecycle.
//!
//! The session is set at login, cleared at logout, and read once per outgoing
//! request. Only the token survives a restart (through a [`TokenStore`]); the
//! user profile is re-fetched from the server after [`Session::restore`].

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use shopease_core::CurrentUser;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::ClientConfig;

/// Owner read/write only.
#[cfg(unix)]
const TOKEN_FILE_MODE: u32 = 0o600;

/// Errors reading or writing the persisted token.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persistence for the bearer token, outside the in-memory session.
pub trait TokenStore: Send + Sync {
    /// Load a previously saved token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError>;

    /// Save the token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    /// Forget the saved token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token persisted in a single file (mode 0600 on Unix).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by the file at `path`. The parent directory is created on
    /// first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(TOKEN_FILE_MODE);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

        // `mode` only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(TOKEN_FILE_MODE))
                .map_err(|e| self.io_error(e))?;
        }

        file.write_all(token.expose_secret().as_bytes())
            .map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Token kept in memory only. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// The signed-in user's credential and profile.
///
/// Cheaply cloneable; all clones share the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: RwLock<Option<SecretString>>,
    user: RwLock<Option<CurrentUser>>,
    store: Box<dyn TokenStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an empty session persisted through `store`.
    #[must_use]
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                user: RwLock::new(None),
                store: Box::new(store),
            }),
        }
    }

    /// Session persisted to the configured token file.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(FileTokenStore::new(&config.token_file))
    }

    /// Session that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::default())
    }

    /// Load the persisted token into memory.
    ///
    /// Returns whether a token was found. The user profile stays unknown until
    /// [`Session::set_user`] is called with a fresh server response.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool, TokenStoreError> {
        let token = self.inner.store.load()?;
        let found = token.is_some();
        *self.inner.token.write().await = token;
        debug!(found, "Restored session token");
        Ok(found)
    }

    /// Start a session after a successful login and persist the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted. The in-memory
    /// session is still set in that case.
    #[instrument(skip(self, token, user), fields(user_id = %user.id))]
    pub async fn begin(&self, token: SecretString, user: CurrentUser) -> Result<(), TokenStoreError> {
        *self.inner.token.write().await = Some(token.clone());
        *self.inner.user.write().await = Some(user);
        self.inner.store.save(&token)
    }

    /// End the session and forget the persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token cannot be removed. The
    /// in-memory session is cleared regardless.
    #[instrument(skip(self))]
    pub async fn end(&self) -> Result<(), TokenStoreError> {
        *self.inner.token.write().await = None;
        *self.inner.user.write().await = None;
        self.inner.store.clear()
    }

    /// The bearer token for the next request.
    pub async fn bearer(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    /// Whether a token is present. Says nothing about whether the server
    /// still accepts it.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Record the profile returned by the server.
    pub async fn set_user(&self, user: CurrentUser) {
        *self.inner.user.write().await = Some(user);
    }

    /// The signed-in user's profile, if known.
    pub async fn user(&self) -> Option<CurrentUser> {
        self.inner.user.read().await.clone()
    }
}
