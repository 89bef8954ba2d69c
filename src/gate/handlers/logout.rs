//! Logout: clear the first-party cookies and revoke upstream on a
//! best-effort basis.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::gate::{
    cookies::{self, CookieJar, ACCESS_COOKIE, REFRESH_COOKIE},
    middleware::append_directives,
    GateState,
};

pub async fn logout(State(state): State<Arc<GateState>>, headers: HeaderMap) -> Response {
    let jar = CookieJar::from_headers(&headers);

    // Best effort: upstream drops its own cookies on its domain. A failure
    // here never blocks the local clearing below.
    if let (Some(access), Ok(upstream)) = (jar.access(), state.upstream()) {
        upstream.logout(access).await;
    }

    // Clear the canonical cookies unconditionally, plus any recognized
    // legacy names the client still carries.
    let mut names: BTreeSet<&str> = [ACCESS_COOKIE, REFRESH_COOKIE].into();
    names.extend(jar.stale_credentials());

    let clears: Vec<_> = names
        .into_iter()
        .map(|name| cookies::clear(state.config(), name))
        .collect();

    let mut response = StatusCode::NO_CONTENT.into_response();
    append_directives(&mut response, &clears);
    response
}
