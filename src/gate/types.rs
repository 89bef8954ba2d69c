//! Request/response types shared by the resolver and the API handlers.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// A verified identity, derived purely from the upstream verify response.
/// Never cached beyond the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, alias = "sub")]
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub must_change_password: bool,
}

/// Roles understood by the hub. Upstream revisions emit either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "AGENT")]
    Agent,
    #[serde(alias = "ADMIN")]
    Admin,
    #[serde(alias = "SUPERADMIN", alias = "superAdmin")]
    Superadmin,
}

/// Credentials accepted by `POST /api/login`, from JSON or a native form
/// post. The password is never logged or echoed back.
#[derive(Debug, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

/// Body of `GET /api/whoami`.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub authed: bool,
    #[serde(flatten)]
    pub me: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}
