//! Login proxy: forwards credentials upstream and mirrors minted tokens
//! into first-party cookies.
//!
//! Serves both the native form post (303 redirect carrying Set-Cookie) and
//! the AJAX client (plain JSON, client navigates itself).

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{CONTENT_TYPE, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::gate::{
    cookies::{self, TokenKind, ACCESS_COOKIE, REFRESH_COOKIE},
    middleware::append_directives,
    paths,
    types::LoginRequest,
    GateState,
};

pub async fn login(
    State(state): State<Arc<GateState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let html = paths::wants_html(&headers);
    let credentials = parse_body(&headers, &body);

    let upstream = match state.upstream() {
        Ok(upstream) => upstream,
        Err(err) => {
            error!("Login rejected: {err}");
            return failure(html, "auth_misconfig", StatusCode::UNAUTHORIZED, None);
        }
    };

    let outcome = match upstream.login(&credentials).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Login failed upstream: {err}");
            return failure(html, "login_error", StatusCode::UNAUTHORIZED, None);
        }
    };

    if !outcome.status.is_success() {
        let code = outcome
            .body
            .get("error")
            .and_then(Value::as_str)
            .map_or_else(|| "login_error".to_string(), sanitize_code);
        return failure(html, &code, outcome.status, Some(&outcome.body));
    }

    // Tokens arrive in Set-Cookie and/or the body; mirror whichever is there.
    let harvest = cookies::harvest_tokens(&outcome.headers, Some(&outcome.body));
    let mut directives = Vec::new();
    if let Some(access) = &harvest.access {
        directives.push(cookies::mirror(
            state.config(),
            ACCESS_COOKIE,
            access,
            TokenKind::Access,
        ));
    }
    if let Some(refresh) = &harvest.refresh {
        directives.push(cookies::mirror(
            state.config(),
            REFRESH_COOKIE,
            refresh,
            TokenKind::Refresh,
        ));
    }

    let mut response = if html {
        // Location and Set-Cookie must ride on the same response.
        let mut response = StatusCode::SEE_OTHER.into_response();
        response
            .headers_mut()
            .insert(LOCATION, HeaderValue::from_static("/hub"));
        response
    } else {
        let mut reply = json!({ "ok": true });
        for field in ["username", "role", "mustChangePassword"] {
            if let Some(value) = outcome.body.get(field) {
                reply[field] = value.clone();
            }
        }
        Json(reply).into_response()
    };

    append_directives(&mut response, &directives);
    response
}

fn parse_body(headers: &HeaderMap, body: &Bytes) -> LoginRequest {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return LoginRequest::default();
        };
        return LoginRequest {
            username: field(&value, "username"),
            email: field(&value, "email"),
            password: field(&value, "password").map(SecretString::from),
        };
    }

    // urlencoded fallback (native form)
    let mut request = LoginRequest::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "username" => request.username = Some(value.into_owned()),
            "email" => request.email = Some(value.into_owned()),
            "password" => request.password = Some(SecretString::from(value.into_owned())),
            _ => {}
        }
    }
    request
}

fn field(value: &Value, name: &str) -> Option<String> {
    value
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn failure(html: bool, code: &str, status: StatusCode, body: Option<&Value>) -> Response {
    if html {
        // No cookies needed on the error path; a plain redirect is fine.
        let mut response = StatusCode::SEE_OTHER.into_response();
        let location = format!("/?err={code}");
        if let Ok(value) = HeaderValue::from_str(&location) {
            response.headers_mut().insert(LOCATION, value);
        } else {
            response
                .headers_mut()
                .insert(LOCATION, HeaderValue::from_static("/?err=login_error"));
        }
        return response;
    }

    let body = match body {
        Some(value) if !value.is_null() => value.clone(),
        _ => json!({ "error": code }),
    };
    let status = if status.is_success() {
        StatusCode::UNAUTHORIZED
    } else {
        status
    };
    (status, Json(body)).into_response()
}

/// Error codes end up in a redirect querystring; keep them to a plain token.
fn sanitize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(64)
        .collect()
}
