use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::session::cookie::get_token;
use crate::session::jar::CookieSource;
use crate::utils::{parse_utc_timestamp, time_remaining};

/// Session token as stored in the session cookie: `<opaque-secret>,<utc-expiry>`
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    raw: String,
}

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The expiry embedded after the last comma, if there is a parseable one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let (_, expiry) = self.raw.rsplit_once(',')?;
        parse_utc_timestamp(expiry)
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expires_at()
            .map(|expires_at| time_remaining(expires_at, now))
    }
}

// Never print the secret part.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("len", &self.raw.len())
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

/// Read-only view of the session cookie
#[derive(Clone)]
pub struct SessionStore {
    cookie_name: String,
    source: Arc<dyn CookieSource>,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, source: Arc<dyn CookieSource>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            source,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The current session token; an empty cookie value counts as absent
    pub fn token(&self) -> Option<SessionToken> {
        get_token(&self.source.cookie_header(), &self.cookie_name)
            .filter(|value| !value.is_empty())
            .map(SessionToken::new)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}
