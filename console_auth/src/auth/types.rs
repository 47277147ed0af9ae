use serde::{Deserialize, Serialize};

/// Options passed by the host framework to `login`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOptions {
    /// Top up an existing session in the background instead of redirecting
    #[serde(default)]
    pub refresh: bool,
}

impl LoginOptions {
    pub fn refresh() -> Self {
        Self { refresh: true }
    }
}

/// A failed API call as reported to `check_error`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status, `None` when the request failed below HTTP
    pub status: Option<u16>,
}

impl ApiError {
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn network() -> Self {
        Self { status: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    Authenticated,
    /// Must redirect to login
    Unauthenticated,
    /// Silently renewed
    Refreshed,
    /// Must redirect to login
    RefreshFailed,
}

impl AuthOutcome {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Authenticated | Self::Refreshed)
    }
}
