use std::sync::{Mutex, PoisonError};

/// Browser location as seen by the auth controller
pub trait Navigator: Send + Sync {
    fn current_url(&self) -> String;

    fn navigate(&self, url: &str);
}

/// Navigator for hosts without a real browser.
///
/// Keeps every visited location; the last one is the current URL.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![start_url.into()]),
        }
    }

    /// Locations navigated to after the start URL
    pub fn visited(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .skip(1)
            .cloned()
            .collect()
    }
}

impl Navigator for HistoryNavigator {
    fn current_url(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn navigate(&self, url: &str) {
        tracing::info!("Navigating to {}", url);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
    }
}
