use chrono::{DateTime, NaiveDateTime, Utc};

/// Expiry format written by the auth server into the session cookie
const AUTH_SERVER_EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Time left until `expires_at`, negative once it has passed
pub fn time_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> chrono::Duration {
    expires_at - now
}

/// Parse a UTC timestamp as RFC 3339 or in the auth server's `Z` format
pub(crate) fn parse_utc_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(input, AUTH_SERVER_EXPIRY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `{base}/{path}?next_page=<percent-encoded next_page>`
pub(crate) fn url_with_next_page(base: &str, path: &str, next_page: &str) -> String {
    format!(
        "{}/{}?next_page={}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/'),
        urlencoding::encode(next_page)
    )
}
