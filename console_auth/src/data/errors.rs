use http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A failed response that the auth lifecycle did not treat as an auth problem
    #[error("HTTP status error: {0}")]
    Status(StatusCode),

    /// The auth lifecycle rejected the failure, the user must log in again
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("JSON parsing failed: {0}")]
    Json(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
