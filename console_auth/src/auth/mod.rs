mod controller;
mod endpoint;
mod errors;
mod navigator;
mod types;


pub use controller::{AuthController, AuthProvider};
pub use endpoint::{AuthEndpoint, HttpAuthEndpoint};
pub use errors::AuthError;
pub use navigator::{HistoryNavigator, Navigator};
pub use types::{ApiError, AuthOutcome, LoginOptions};
