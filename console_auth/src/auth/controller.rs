use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::StatusCode;
use serde_json::Value;

use crate::auth::endpoint::AuthEndpoint;
use crate::auth::errors::AuthError;
use crate::auth::navigator::Navigator;
use crate::auth::types::{ApiError, AuthOutcome, LoginOptions};
use crate::config::{AuthSettings, ForbiddenPolicy, RejectRedirect};
use crate::session::{CookieSource, SessionStore};

/// The hooks the host UI framework calls at its lifecycle points.
///
/// Returning `Err` from any hook means "force navigation to login".
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The user asked to log in, or the UI wants to top up the session
    async fn login(&self, options: LoginOptions) -> Result<(), AuthError>;

    /// The user clicked logout
    async fn logout(&self) -> Result<(), AuthError>;

    /// An API call failed
    async fn check_error(&self, error: ApiError) -> Result<(), AuthError>;

    /// The user navigated to a new location
    async fn check_auth(&self) -> Result<AuthOutcome, AuthError>;

    /// Authorization is enforced server-side per request, so there is nothing to report
    async fn get_permissions(&self) -> Result<Option<Value>, AuthError>;
}

/// Decides login, logout, refresh and redirect actions for the console.
///
/// All session truth lives in the session cookie, which only the auth server
/// writes. The only state held here is the logout in-flight guard, owned per
/// instance so separate controllers never share it.
pub struct AuthController {
    store: SessionStore,
    endpoint: Arc<dyn AuthEndpoint>,
    navigator: Arc<dyn Navigator>,
    app_root: String,
    refresh_threshold: Duration,
    forbidden_policy: ForbiddenPolicy,
    reject_redirect: RejectRedirect,
    logout_in_flight: AtomicBool,
}

/// Releases the logout guard however the logout ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AuthController {
    pub fn new(
        settings: &AuthSettings,
        cookies: Arc<dyn CookieSource>,
        endpoint: Arc<dyn AuthEndpoint>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store: SessionStore::new(settings.session_cookie_name(), cookies),
            endpoint,
            navigator,
            app_root: settings.app_root.clone(),
            refresh_threshold: settings.refresh_threshold,
            forbidden_policy: settings.forbidden_policy,
            reject_redirect: settings.reject_redirect,
            logout_in_flight: AtomicBool::new(false),
        }
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    pub fn is_logout_in_flight(&self) -> bool {
        self.logout_in_flight.load(Ordering::Acquire)
    }

    /// Call the remote logout once. Returns false when another logout already holds the guard.
    async fn invalidate_session(&self) -> bool {
        if self.logout_in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("Logout already in flight, skipping");
            return false;
        }
        let _guard = InFlightGuard(&self.logout_in_flight);

        match self.endpoint.logout(&self.app_root).await {
            Ok(status) if status.is_success() || status.is_redirection() => {
                tracing::debug!("Logout accepted: {}", status);
            }
            Ok(status) => tracing::warn!("Logout responded with status {}", status),
            Err(e) => tracing::error!("Logout request failed: {}", e),
        }
        true
    }

    async fn refresh_session(&self) -> Result<StatusCode, AuthError> {
        self.endpoint
            .refresh()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))
    }

    /// Surface a rejection, navigating first when configured to redirect immediately
    fn reject(&self, error: AuthError) -> AuthError {
        tracing::debug!("Rejecting: {}", error);

        if self.reject_redirect == RejectRedirect::Immediate {
            let next_page = self.navigator.current_url();
            let url = if self.store.token().is_some() {
                self.endpoint.refresh_url(&next_page)
            } else {
                self.endpoint.login_url(&next_page)
            };
            self.navigator.navigate(&url);
        }

        error
    }

    fn spawn_background_refresh(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, skipping background refresh");
            return;
        };

        let endpoint = Arc::clone(&self.endpoint);
        handle.spawn(async move {
            match endpoint.refresh().await {
                Ok(status) if status.is_success() => {
                    tracing::debug!("Background session refresh succeeded");
                }
                Ok(status) => tracing::warn!("Background session refresh rejected: {}", status),
                Err(e) => tracing::error!("Background session refresh failed: {}", e),
            }
        });
    }
}

#[async_trait]
impl AuthProvider for AuthController {
    #[tracing::instrument(skip(self))]
    async fn login(&self, options: LoginOptions) -> Result<(), AuthError> {
        if options.refresh {
            if self.store.token().is_some() {
                tracing::debug!("Refreshing session in the background");
                self.spawn_background_refresh();
                return Ok(());
            }
            tracing::debug!("Refresh requested without a session, falling back to login");
        }

        let next_page = self.navigator.current_url();
        self.navigator.navigate(&self.endpoint.login_url(&next_page));
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn logout(&self) -> Result<(), AuthError> {
        if self.invalidate_session().await {
            self.navigator.navigate("/");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn check_error(&self, error: ApiError) -> Result<(), AuthError> {
        match error.status {
            Some(401) => match self.refresh_session().await {
                Ok(status) if status.is_success() => {
                    tracing::info!("Session refreshed after 401");
                    Ok(())
                }
                Ok(status) => Err(self.reject(AuthError::RefreshFailed(format!(
                    "refresh responded with status {status}"
                )))),
                Err(e) => Err(self.reject(e)),
            },
            Some(403) => {
                if self.forbidden_policy == ForbiddenPolicy::LogoutThenReject {
                    self.invalidate_session().await;
                }
                Err(self.reject(AuthError::Forbidden))
            }
            None => Err(self.reject(AuthError::Indeterminate)),
            Some(status) => {
                tracing::debug!("Status {} is not an auth problem", status);
                Ok(())
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn check_auth(&self) -> Result<AuthOutcome, AuthError> {
        let Some(token) = self.store.token() else {
            tracing::debug!("No session cookie '{}'", self.store.cookie_name());
            return Err(self.reject(AuthError::Unauthenticated));
        };

        let Some(remaining) = token.time_remaining(Utc::now()) else {
            tracing::warn!("Session token has no parseable expiry, treating as valid");
            return Ok(AuthOutcome::Authenticated);
        };

        // A negative remaining time fails `to_std`, which also means refresh.
        let needs_refresh = remaining
            .to_std()
            .map_or(true, |left| left < self.refresh_threshold);

        if !needs_refresh {
            return Ok(AuthOutcome::Authenticated);
        }

        tracing::info!(
            "Session expires in {}s, refreshing",
            remaining.num_seconds()
        );

        match self.refresh_session().await {
            Ok(StatusCode::OK) => Ok(AuthOutcome::Refreshed),
            Ok(status) => Err(self.reject(AuthError::RefreshFailed(format!(
                "refresh responded with status {status}"
            )))),
            Err(e) => Err(self.reject(e)),
        }
    }

    async fn get_permissions(&self) -> Result<Option<Value>, AuthError> {
        Ok(None)
    }
}
