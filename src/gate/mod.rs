//! The gate service: router, state, and server wiring.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod paths;
pub mod session;
pub mod types;
pub mod upstream;

use config::GateConfig;
use error::AuthError;
use upstream::Upstream;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Immutable per-process state. Requests share nothing else, so there is no
/// locking anywhere in the request path.
#[derive(Debug)]
pub struct GateState {
    config: GateConfig,
    upstream: Option<Upstream>,
}

impl GateState {
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        let upstream = config.upstream_base().cloned().and_then(|base| {
            match Upstream::new(base, config.transport()) {
                Ok(upstream) => Some(upstream),
                Err(err) => {
                    error!("Failed to build upstream client: {err}");
                    None
                }
            }
        });

        Self { config, upstream }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The upstream client, or `UpstreamMisconfigured` when the process was
    /// started without a usable upstream address.
    pub fn upstream(&self) -> error::Result<&Upstream> {
        self.upstream
            .as_ref()
            .ok_or(AuthError::UpstreamMisconfigured)
    }
}

/// Build the full application router: HTML shells, the API surface, the
/// gate middleware, and request tracing.
#[must_use]
pub fn app(state: Arc<GateState>) -> Router {
    Router::new()
        .route("/", get(handlers::shell::login_page))
        .route("/hub", get(handlers::shell::hub))
        .route("/hub/*rest", get(handlers::shell::hub))
        .route("/adherence", get(handlers::shell::adherence))
        .route("/adherence/*rest", get(handlers::shell::adherence))
        .route("/flowmaster", get(handlers::shell::flowmaster))
        .route("/flowmaster/*rest", get(handlers::shell::flowmaster))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/whoami", get(handlers::whoami))
        .route("/api/health", get(handlers::health))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gate,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
        .with_state(state)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, config: GateConfig) -> Result<()> {
    let state = Arc::new(GateState::new(config));
    let app = app(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
