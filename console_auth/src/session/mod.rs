mod cookie;
mod errors;
mod jar;
mod types;

pub use cookie::get_token;
pub use errors::SessionError;
pub use jar::{CookieJar, CookieSource};
pub use types::{SessionStore, SessionToken};
