//! Error taxonomy for the gate.
//!
//! Every variant is recovered into a fail-closed response before it reaches
//! the browser: a login redirect for HTML routes, a 401 JSON body for API
//! callers. Nothing here ever surfaces as a raw 500 on an HTML route.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable credential was present in the cookie jar.
    #[error("no usable credential present")]
    Unauthenticated,

    /// The upstream verify endpoint rejected the access credential.
    #[error("access credential rejected by upstream")]
    InvalidCredential,

    /// The refresh endpoint rejected the credential, timed out, or returned
    /// no extractable access token.
    #[error("refresh failed")]
    RefreshFailed,

    /// Required upstream configuration is absent.
    #[error("upstream identity service is not configured")]
    UpstreamMisconfigured,

    /// Network, DNS, or timeout failure talking to upstream.
    #[error("upstream identity service unreachable: {0}")]
    UpstreamUnreachable(String),
}

impl AuthError {
    /// Whether the failure is an operational problem worth an error-level log,
    /// as opposed to an expected credential miss.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::UpstreamMisconfigured | Self::UpstreamUnreachable(_)
        )
    }
}
