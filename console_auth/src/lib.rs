//! console_auth - Session and authentication lifecycle for the admin console
//!
//! This crate decides, on every navigation and every API error, whether the
//! current console session is valid, whether it should be silently refreshed,
//! or whether the user has to be sent back through the remote login flow.
//! It also carries the small record data service shim whose HTTP failures are
//! fed back into the auth lifecycle.

mod auth;
mod config;
mod data;
mod session;
mod utils;

pub use auth::{
    ApiError, AuthController, AuthEndpoint, AuthError, AuthOutcome, AuthProvider,
    HistoryNavigator, HttpAuthEndpoint, LoginOptions, Navigator,
};

pub use config::{AuthSettings, ConfigError, ForbiddenPolicy, RejectRedirect, TokenNames};

pub use data::{DataError, ListResult, ListRoute, RecordService, list_route, resource_alias};

pub use session::{CookieJar, CookieSource, SessionError, SessionStore, SessionToken, get_token};

pub use utils::time_remaining;
