use thiserror::Error;

use crate::auth::types::AuthOutcome;
use crate::config::ConfigError;
use crate::session::SessionError;

/// Why a lifecycle hook rejected. Every variant means "send the user to login".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    /// No HTTP status was available, typically a network or CORS failure
    #[error("Indeterminate error")]
    Indeterminate,

    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl AuthError {
    pub fn outcome(&self) -> AuthOutcome {
        match self {
            Self::RefreshFailed(_) => AuthOutcome::RefreshFailed,
            _ => AuthOutcome::Unauthenticated,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
