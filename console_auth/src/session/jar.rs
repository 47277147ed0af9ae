use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::session::errors::SessionError;

/// The ambient cookie string of the console, the `document.cookie` of a browser
pub trait CookieSource: Send + Sync {
    fn cookie_header(&self) -> String;
}

impl CookieSource for String {
    fn cookie_header(&self) -> String {
        self.clone()
    }
}

/// Cookies held on behalf of the console.
///
/// The jar plays the browser's part. It backs the cookie store of every
/// client the console builds, so `Set-Cookie` on auth server and backend
/// responses lands here with its `Domain`, `Path` and expiry honored. The
/// auth controller reads it through [`CookieSource`], seeing what a page at
/// the app URL would see, and never writes to it.
pub struct CookieJar {
    store: Arc<Jar>,
    app_url: Url,
}

impl CookieJar {
    /// An empty jar for a console served from `app_url`
    pub fn new(app_url: &str) -> Result<Self, SessionError> {
        let app_url = Url::parse(app_url).map_err(|e| {
            tracing::error!("Invalid app URL '{}': {}", app_url, e);
            SessionError::InvalidUrl(format!("{app_url}: {e}"))
        })?;

        Ok(Self {
            store: Arc::new(Jar::default()),
            app_url,
        })
    }

    /// A jar seeded from a `Cookie` header style string
    pub fn from_header(app_url: &str, header: &str) -> Result<Self, SessionError> {
        let jar = Self::new(app_url)?;
        jar.seed(header);
        Ok(jar)
    }

    /// Add the `name=value` pairs of `header` as cookies of the whole app host,
    /// returning how many were added
    pub fn seed(&self, header: &str) -> usize {
        let mut seeded = 0;

        for pair in header.split(';').map(str::trim) {
            match pair.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    let cookie = format!("{}={}; Path=/", name.trim(), value.trim());
                    self.store.add_cookie_str(&cookie, &self.app_url);
                    seeded += 1;
                }
                _ if pair.is_empty() => {}
                _ => tracing::debug!("Skipping malformed cookie pair '{}'", pair),
            }
        }

        seeded
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    /// The store to hand to `reqwest::ClientBuilder::cookie_provider`
    pub fn store(&self) -> Arc<Jar> {
        self.store.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.cookie_header().is_empty()
    }
}

impl CookieSource for CookieJar {
    fn cookie_header(&self) -> String {
        self.store
            .cookies(&self.app_url)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("app_url", &self.app_url.as_str())
            .finish_non_exhaustive()
    }
}
