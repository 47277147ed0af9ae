use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid cookie URL: {0}")]
    InvalidUrl(String),
}
