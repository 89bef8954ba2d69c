//! Path classification for the gate.
//!
//! The login entry is never a member of the protected set, so a redirect to
//! it always terminates in one hop.

use axum::http::{header::ACCEPT, HeaderMap};

/// Public login entry. Unauthenticated protected requests are redirected
/// here with the querystring stripped.
pub const LOGIN_PATH: &str = "/";

/// Protected application areas. Everything below these prefixes requires a
/// verified identity.
const PROTECTED_PREFIXES: [&str; 3] = ["/hub", "/adherence", "/flowmaster"];

/// Explicitly public prefixes: the API surface and static assets. Checked
/// before the protected set so an overlap can never shadow them.
const PUBLIC_PREFIXES: [&str; 4] = ["/api/", "/assets/", "/static/", "/favicon.ico"];

/// Whether the path requires a verified identity.
#[must_use]
pub fn is_protected(path: &str) -> bool {
    if path == LOGIN_PATH || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// HTML-shell routes get `Cache-Control: no-store` so a cached
/// authenticated page can never bleed across users.
#[must_use]
pub fn is_html_shell(path: &str) -> bool {
    path == LOGIN_PATH || is_protected(path)
}

/// Whether the caller is a browser navigation rather than an API client.
/// Form posts carry `text/html` in Accept; AJAX callers set `x-ajax`.
#[must_use]
pub fn wants_html(headers: &HeaderMap) -> bool {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/html"));
    accepts_html && !headers.contains_key("x-ajax")
}

/// Whether a denied caller should get a 401 JSON body instead of the login
/// redirect. Browser navigations never match; only requests that identify
/// themselves as API callers do.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    if headers.contains_key("x-ajax") {
        return true;
    }
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json") && !value.contains("text/html"))
}
