//! The request gate: path-based access control with redirect-loop
//! prevention.

use axum::{
    extract::{Request, State},
    http::{
        header::{CACHE_CONTROL, LOCATION, SET_COOKIE, VARY},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::gate::{
    cookies::{
        self, CookieDirective, CookieJar, ExtractedToken, TokenKind, TokenSource, ACCESS_COOKIE,
    },
    error::AuthError,
    paths::{self, LOGIN_PATH},
    session, GateState,
};

/// Classify the path, resolve the session for protected paths, and render
/// the terminal decision.
///
/// Public paths pass through unconditionally, whatever the cookie state;
/// the login entry in particular is never inspected, which is what makes a
/// login redirect terminate in one hop. Protected paths either proceed with
/// any rotated cookies attached or fail closed.
pub async fn gate(
    State(state): State<Arc<GateState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !paths::is_protected(&path) {
        return decorate(next.run(request).await, &path);
    }

    // Protected areas are HTML shells; only an explicit API caller gets a
    // 401 body instead of the login redirect.
    let jar = CookieJar::from_headers(request.headers());
    let html = !paths::wants_json(request.headers());

    // One-time handoff: a protected URL may arrive with the access token in
    // an `at` query parameter instead of a cookie. Mirror it and bounce back
    // to the same URL with the parameter stripped, so the token never stays
    // in the address bar or browser history.
    if jar.access().is_none() {
        if let Some(response) = handoff(&state, &request) {
            return decorate(response, &path);
        }
    }

    match session::resolve(&state, &jar).await {
        Ok(resolved) => {
            let mut response = next.run(request).await;
            append_directives(&mut response, &resolved.rotated);
            decorate(response, &path)
        }
        Err(err) => decorate(deny(&state, &jar, &err, html), &path),
    }
}

/// Turn an `?at=<token>` query parameter into a mirrored access cookie and
/// a redirect to the same URL without it. Only consulted when the jar holds
/// no access credential; an existing cookie always wins.
fn handoff(state: &GateState, request: &Request) -> Option<Response> {
    let query = request.uri().query()?;

    let mut token = None;
    let mut rest = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key == "at" {
            if !value.is_empty() {
                token = Some(value.into_owned());
            }
        } else {
            rest.append_pair(&key, &value);
        }
    }
    let token = token?;

    let rest = rest.finish();
    let location = if rest.is_empty() {
        request.uri().path().to_string()
    } else {
        format!("{}?{rest}", request.uri().path())
    };

    let minted = ExtractedToken {
        value: token,
        max_age: None,
        source: TokenSource::QueryParam,
    };
    let directive = cookies::mirror(state.config(), ACCESS_COOKIE, &minted, TokenKind::Access);

    let mut response = StatusCode::FOUND.into_response();
    let location = HeaderValue::from_str(&location)
        .unwrap_or_else(|_| HeaderValue::from_static(LOGIN_PATH));
    response.headers_mut().insert(LOCATION, location);
    append_directives(&mut response, &[directive]);
    Some(response)
}

/// Render the fail-closed response: a login redirect for browser
/// navigations, a 401 JSON body for API callers. Misconfiguration and
/// unreachable upstreams degrade to the same response; the detail stays in
/// the server log.
fn deny(state: &GateState, jar: &CookieJar, err: &AuthError, html: bool) -> Response {
    if err.is_operational() {
        error!("Denying protected request: {err}");
    } else {
        debug!("Denying protected request: {err}");
    }

    let clears: Vec<CookieDirective> = jar
        .stale_credentials()
        .into_iter()
        .map(|name| cookies::clear(state.config(), name))
        .collect();

    let mut response = if html {
        // Querystring stripped; the login entry is public, so this cannot
        // loop.
        let mut response = StatusCode::FOUND.into_response();
        response
            .headers_mut()
            .insert(LOCATION, HeaderValue::from_static(LOGIN_PATH));
        response
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response()
    };

    append_directives(&mut response, &clears);
    response
}

/// Attach Set-Cookie directives to an outgoing response.
pub fn append_directives(response: &mut Response, directives: &[CookieDirective]) {
    for directive in directives {
        match directive.header_value() {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => {
                // An unrenderable token is dropped rather than breaking the
                // response.
                error!("Dropping cookie directive for {}: {err}", directive.name);
            }
        }
    }
}

/// Response hygiene applied to every response: caches must split on cookie
/// state, and HTML shells must never be stored at all.
fn decorate(mut response: Response, path: &str) -> Response {
    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Cookie"));
    if paths::is_html_shell(path) {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}
