//! Page commands.
//!
//! Every command gets a [`Context`] whose store has already been rehydrated
//! from the saved session.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use shopease_client::{
    ApiClient, ApiError, ClientConfig, ClientError, Session, SliceState, Store,
};
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to create API client: {0}")]
    Api(#[from] ApiError),

    /// A page loaded but its slice recorded a failure.
    #[error("{0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// The underlying client error, for redirect hints.
    pub const fn client(&self) -> Option<&ClientError> {
        match self {
            Self::Client(e) => Some(e),
            _ => None,
        }
    }
}

/// What every command runs against.
pub struct Context {
    pub config: ClientConfig,
    pub store: Store,
}

impl Context {
    /// Build the store and restore the saved session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the token
    /// store cannot be read.
    pub async fn open(config: ClientConfig) -> Result<Self, CliError> {
        let session = Session::from_config(&config);
        let api = ApiClient::new(&config, session.clone())?;
        let store = Store::new(session, api);

        match store.restore().await {
            Ok(Some(user)) => tracing::debug!(user_id = %user.id, "Session restored"),
            Ok(None) => {}
            Err(e) if restore_is_fatal(&e) => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "Could not restore session, continuing without profile"),
        }

        Ok(Self { config, store })
    }
}

/// Only a broken token store stops a command. Server or network trouble
/// while loading the profile leaves public pages usable.
const fn restore_is_fatal(err: &ClientError) -> bool {
    matches!(err, ClientError::Session(_))
}

/// Turn a slice snapshot with a recorded error into a command failure.
fn loaded<T>(state: SliceState<T>) -> Result<T, CliError> {
    match state.error {
        Some(message) => Err(CliError::Load(message)),
        None => Ok(state.data),
    }
}
