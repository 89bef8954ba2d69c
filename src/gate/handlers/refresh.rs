//! Explicit refresh endpoint for the front-end: one rotation, new cookies,
//! no body.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::gate::{cookies::CookieJar, middleware::append_directives, session, GateState};

pub async fn refresh(State(state): State<Arc<GateState>>, headers: HeaderMap) -> Response {
    let jar = CookieJar::from_headers(&headers);

    if jar.refresh().is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "no_refresh" }))).into_response();
    }

    match session::refresh(&state, &jar).await {
        Ok(resolved) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            append_directives(&mut response, &resolved.rotated);
            response
        }
        Err(err) => {
            if err.is_operational() {
                error!("Refresh denied: {err}");
            } else {
                debug!("Refresh denied: {err}");
            }
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "refresh_failed" })),
            )
                .into_response()
        }
    }
}
