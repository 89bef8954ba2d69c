//! Who-am-I for the hub's front-end: same resolution as the gate,
//! including the one-shot refresh, with rotated cookies attached.

use axum::{
    extract::State,
    http::{header::CACHE_CONTROL, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::gate::{
    cookies::CookieJar,
    error::AuthError,
    middleware::append_directives,
    session,
    types::WhoamiResponse,
    GateState,
};

pub async fn whoami(State(state): State<Arc<GateState>>, headers: HeaderMap) -> Response {
    let jar = CookieJar::from_headers(&headers);

    if jar.access().is_none() && jar.refresh().is_none() {
        // Not signed in
        return no_store(
            (
                StatusCode::UNAUTHORIZED,
                Json(WhoamiResponse {
                    authed: false,
                    me: None,
                    error: Some("no_cookie"),
                }),
            )
                .into_response(),
        );
    }

    match session::resolve(&state, &jar).await {
        Ok(resolved) => {
            let mut response = Json(WhoamiResponse {
                authed: true,
                me: Some(resolved.identity),
                error: None,
            })
            .into_response();
            append_directives(&mut response, &resolved.rotated);
            no_store(response)
        }
        Err(err) => {
            if err.is_operational() {
                error!("whoami denied: {err}");
            } else {
                debug!("whoami denied: {err}");
            }
            let code = match err {
                AuthError::RefreshFailed => "refresh_failed",
                _ => "unauthorized",
            };
            no_store(
                (
                    StatusCode::UNAUTHORIZED,
                    Json(WhoamiResponse {
                        authed: false,
                        me: None,
                        error: Some(code),
                    }),
                )
                    .into_response(),
            )
        }
    }
}

/// Auth state must never come out of a shared cache.
fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
