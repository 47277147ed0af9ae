use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;

use crate::auth::errors::AuthError;
use crate::config::AuthSettings;
use crate::session::CookieJar;
use crate::utils::url_with_next_page;

/// The remote auth server: issues, refreshes and invalidates sessions
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    /// Interactive login page that returns to `next_page` afterwards
    fn login_url(&self, next_page: &str) -> String;

    /// Full-page refresh flow that returns to `next_page` afterwards
    fn refresh_url(&self, next_page: &str) -> String;

    /// `GET /refresh` with credentials
    async fn refresh(&self) -> Result<StatusCode, AuthError>;

    /// `GET /logout?next_page=..` with credentials
    async fn logout(&self, next_page: &str) -> Result<StatusCode, AuthError>;
}

/// [`AuthEndpoint`] over HTTP.
///
/// The client's cookie store is the console's [`CookieJar`], so requests carry
/// its cookies and `Set-Cookie` on the response goes back into it, the way a
/// browser handles `credentials: include`. Redirects are not followed, the
/// browser is the one that follows them.
#[derive(Debug, Clone)]
pub struct HttpAuthEndpoint {
    auth_url: String,
    client: reqwest::Client,
}

impl HttpAuthEndpoint {
    pub fn new(auth_url: impl Into<String>, jar: &CookieJar) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(jar.store())
            .build()?;

        Ok(Self {
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_settings(settings: &AuthSettings, jar: &CookieJar) -> Result<Self, AuthError> {
        settings.validate()?;
        Self::new(settings.auth_url.clone(), jar)
    }

    async fn get_with_credentials(&self, url: &str) -> Result<StatusCode, AuthError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Request to {} failed: {}", url, e);
            AuthError::from(e)
        })?;

        let status = response.status();
        tracing::debug!("{} -> {}", url, status);

        Ok(status)
    }
}

#[async_trait]
impl AuthEndpoint for HttpAuthEndpoint {
    fn login_url(&self, next_page: &str) -> String {
        url_with_next_page(&self.auth_url, "login", next_page)
    }

    fn refresh_url(&self, next_page: &str) -> String {
        url_with_next_page(&self.auth_url, "refresh", next_page)
    }

    async fn refresh(&self) -> Result<StatusCode, AuthError> {
        let url = format!("{}/refresh", self.auth_url);
        self.get_with_credentials(&url).await
    }

    async fn logout(&self, next_page: &str) -> Result<StatusCode, AuthError> {
        let url = url_with_next_page(&self.auth_url, "logout", next_page);
        self.get_with_credentials(&url).await
    }
}
