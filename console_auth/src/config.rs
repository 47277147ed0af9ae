//! Runtime settings for the console auth lifecycle
//!
//! Settings are read once by the application bootstrap and handed to the
//! controller as an explicit value. The session cookie name may be left
//! unconfigured, in which case [`AuthSettings::resolve`] asks the auth server
//! for it before any auth operation runs.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default base URL of the remote auth server
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:5000/aaa";
/// Default base URL of the record data service
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/api/v1";
/// Default root URL the console is served from
pub const DEFAULT_APP_ROOT: &str = "http://127.0.0.1:5000/";
/// Cookie name used when neither the environment nor the auth server names one
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "arxiv_session_cookie";
/// Remaining lifetime below which a session is refreshed proactively
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 60;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),
    #[error("HTTP status error: {0}")]
    HttpStatusError(reqwest::StatusCode),
    #[error("JSON parsing failed: {0}")]
    JsonError(String),
    #[error("Invalid URL for {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

/// What `check_error` does with a 403 before rejecting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForbiddenPolicy {
    /// Reject without touching the session
    #[default]
    Reject,
    /// Invalidate the session on the auth server, then reject
    LogoutThenReject,
}

impl FromStr for ForbiddenPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "logout" | "logout_then_reject" => Ok(Self::LogoutThenReject),
            _ => Err(ConfigError::InvalidValue {
                name: "AUTH_FORBIDDEN_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

/// Who navigates after a lifecycle hook rejects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RejectRedirect {
    /// The host framework reacts to the rejection
    #[default]
    Framework,
    /// The controller sends the browser to the refresh or login flow itself
    Immediate,
}

impl FromStr for RejectRedirect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "framework" => Ok(Self::Framework),
            "immediate" => Ok(Self::Immediate),
            _ => Err(ConfigError::InvalidValue {
                name: "AUTH_REJECT_REDIRECT",
                value: s.to_string(),
            }),
        }
    }
}

/// Cookie names published by the auth server at `{auth_url}/token-names`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNames {
    pub session: String,
    #[serde(default)]
    pub classic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Base URL of the remote auth server (`AAA_URL`)
    pub auth_url: String,
    /// Base URL of the record data service (`ADMIN_API_BACKEND_URL`)
    pub backend_url: String,
    /// Root URL of the console (`ADMIN_APP_ROOT`)
    pub app_root: String,
    /// Session cookie name (`AUTH_SESSION_COOKIE_NAME`), `None` until resolved
    pub cookie_name: Option<String>,
    pub refresh_threshold: Duration,
    pub forbidden_policy: ForbiddenPolicy,
    pub reject_redirect: RejectRedirect,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            app_root: DEFAULT_APP_ROOT.to_string(),
            cookie_name: None,
            refresh_threshold: Duration::from_secs(DEFAULT_REFRESH_THRESHOLD_SECS),
            forbidden_policy: ForbiddenPolicy::default(),
            reject_redirect: RejectRedirect::default(),
        }
    }
}

impl AuthSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Unparseable policy or threshold values fall back to their defaults
    /// with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let refresh_threshold = lookup("AUTH_REFRESH_THRESHOLD_SECS")
            .and_then(|s| match s.trim().parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!("Ignoring invalid AUTH_REFRESH_THRESHOLD_SECS: {s}");
                    None
                }
            })
            .unwrap_or(defaults.refresh_threshold);

        let forbidden_policy = lookup("AUTH_FORBIDDEN_POLICY")
            .and_then(|s| {
                s.parse()
                    .map_err(|e| tracing::warn!("Ignoring setting: {e}"))
                    .ok()
            })
            .unwrap_or(defaults.forbidden_policy);

        let reject_redirect = lookup("AUTH_REJECT_REDIRECT")
            .and_then(|s| {
                s.parse()
                    .map_err(|e| tracing::warn!("Ignoring setting: {e}"))
                    .ok()
            })
            .unwrap_or(defaults.reject_redirect);

        Self {
            auth_url: lookup("AAA_URL").unwrap_or(defaults.auth_url),
            backend_url: lookup("ADMIN_API_BACKEND_URL").unwrap_or(defaults.backend_url),
            app_root: lookup("ADMIN_APP_ROOT").unwrap_or(defaults.app_root),
            cookie_name: lookup("AUTH_SESSION_COOKIE_NAME").filter(|s| !s.trim().is_empty()),
            refresh_threshold,
            forbidden_policy,
            reject_redirect,
        }
    }

    /// The session cookie name, or the default when none was configured or resolved
    pub fn session_cookie_name(&self) -> &str {
        self.cookie_name
            .as_deref()
            .unwrap_or(DEFAULT_SESSION_COOKIE_NAME)
    }

    /// Check that the configured base URLs are absolute URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("AAA_URL", &self.auth_url),
            ("ADMIN_API_BACKEND_URL", &self.backend_url),
            ("ADMIN_APP_ROOT", &self.app_root),
        ] {
            Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
                name,
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    /// Validate the settings and fill in the session cookie name from the auth
    /// server when it was not configured.
    #[tracing::instrument(skip(self), fields(auth_url = %self.auth_url))]
    pub async fn resolve(mut self) -> Result<Self, ConfigError> {
        self.validate()?;

        if self.cookie_name.is_some() {
            return Ok(self);
        }

        let names = fetch_token_names(&self.auth_url).await?;
        tracing::info!("Resolved session cookie name: {}", names.session);
        self.cookie_name = Some(names.session);
        Ok(self)
    }
}

pub(crate) async fn fetch_token_names(auth_url: &str) -> Result<TokenNames, ConfigError> {
    let url = format!("{}/token-names", auth_url.trim_end_matches('/'));
    tracing::debug!("Fetching token names from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        tracing::error!("Token names lookup failed with status: {}", response.status());
        return Err(ConfigError::HttpStatusError(response.status()));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ConfigError::JsonError(e.to_string()))
}
