//! Gate configuration, injected once at process start.
//!
//! There is no module-level fallback for the upstream address: a missing or
//! invalid value leaves `upstream_base` empty and the gate denies every
//! protected request (fail closed) instead of crashing a handler.

use std::time::Duration;
use url::Url;

use crate::gate::{cookies::SameSite, upstream::CredentialTransport};

const DEFAULT_ACCESS_MAX_AGE: i64 = 15 * 60;
const DEFAULT_REFRESH_MAX_AGE: i64 = 14 * 24 * 60 * 60;

/// Bounded timeout for every verify/refresh/login/logout call upstream.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct GateConfig {
    upstream_base: Option<Url>,
    transport: CredentialTransport,
    access_max_age: i64,
    refresh_max_age: i64,
    cookie_secure: bool,
    same_site: SameSite,
}

impl GateConfig {
    #[must_use]
    pub fn new(upstream_base: Option<Url>) -> Self {
        Self {
            upstream_base,
            transport: CredentialTransport::Cookie,
            access_max_age: DEFAULT_ACCESS_MAX_AGE,
            refresh_max_age: DEFAULT_REFRESH_MAX_AGE,
            cookie_secure: true,
            same_site: SameSite::Lax,
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: CredentialTransport) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_access_max_age(mut self, seconds: i64) -> Self {
        self.access_max_age = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_max_age(mut self, seconds: i64) -> Self {
        self.refresh_max_age = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    #[must_use]
    pub fn upstream_base(&self) -> Option<&Url> {
        self.upstream_base.as_ref()
    }

    #[must_use]
    pub fn transport(&self) -> CredentialTransport {
        self.transport
    }

    #[must_use]
    pub fn access_max_age(&self) -> i64 {
        self.access_max_age
    }

    #[must_use]
    pub fn refresh_max_age(&self) -> i64 {
        self.refresh_max_age
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn same_site(&self) -> SameSite {
        self.same_site
    }
}
