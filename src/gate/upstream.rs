//! HTTP client for the upstream identity service.
//!
//! Every call carries a bounded timeout and follows no redirects; a network
//! failure or timeout maps into the error taxonomy instead of hanging or
//! surfacing a raw transport error.

use axum::http::HeaderMap;
use reqwest::{header::COOKIE, Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::gate::{
    config::UPSTREAM_TIMEOUT,
    cookies::{self, ExtractedToken, ACCESS_COOKIE, REFRESH_COOKIE},
    error::{AuthError, Result},
    types::{Identity, LoginRequest},
    APP_USER_AGENT,
};

/// How credentials are presented to upstream. Revisions of the identity
/// service have accepted both; forwarded cookies are the default and the
/// bearer header is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialTransport {
    Cookie,
    Bearer,
}

/// Tokens minted by a successful refresh. The access token is mandatory; a
/// rotated refresh token only appears when upstream chose to rotate.
#[derive(Debug)]
pub struct RefreshGrant {
    pub access: ExtractedToken,
    pub refresh: Option<ExtractedToken>,
}

/// Raw outcome of an upstream login, forwarded almost verbatim to the
/// caller: status and body pass through, tokens are mirrored separately.
#[derive(Debug)]
pub struct UpstreamLogin {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Debug)]
pub struct Upstream {
    base: Url,
    http: Client,
    transport: CredentialTransport,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base: Url, transport: CredentialTransport) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            base,
            http,
            transport,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{path}", self.base.as_str().trim_end_matches('/'));
        Url::parse(&joined).map_err(|_| AuthError::UpstreamMisconfigured)
    }

    fn present(&self, request: RequestBuilder, cookie_name: &str, token: &str) -> RequestBuilder {
        match self.transport {
            CredentialTransport::Cookie => {
                request.header(COOKIE, format!("{cookie_name}={token}"))
            }
            CredentialTransport::Bearer => request.bearer_auth(token),
        }
    }

    /// `GET /me` with the access credential. One attempt, no retry.
    pub async fn verify(&self, access: &str) -> Result<Identity> {
        let request = self.http.get(self.endpoint("/me")?);
        let response = self
            .present(request, ACCESS_COOKIE, access)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            debug!("Upstream verify rejected the access credential: {status}");
            return Err(AuthError::InvalidCredential);
        }

        response
            .json::<Identity>()
            .await
            .map_err(|_| AuthError::InvalidCredential)
    }

    /// `POST /auth/refresh` with the refresh credential. Exactly one call;
    /// any failure, including a response with no extractable access token,
    /// is a `RefreshFailed`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshGrant> {
        let request = self.http.post(self.endpoint("/auth/refresh")?);
        let response = self
            .present(request, REFRESH_COOKIE, refresh_token)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            debug!("Upstream refresh rejected: {status}");
            return Err(AuthError::RefreshFailed);
        }

        let headers = response.headers().clone();
        // 204 has no body; a 200 body may or may not carry tokens.
        let body: Option<Value> = response
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());

        let harvest = cookies::harvest_tokens(&headers, body.as_ref());
        let access = harvest.access.ok_or(AuthError::RefreshFailed)?;

        Ok(RefreshGrant {
            access,
            refresh: harvest.refresh,
        })
    }

    /// `POST /auth/login`. The outcome passes through; token mirroring is
    /// the caller's job.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<UpstreamLogin> {
        let mut payload = Map::new();
        if let Some(username) = &credentials.username {
            payload.insert("username".to_string(), Value::String(username.clone()));
        }
        if let Some(email) = &credentials.email {
            payload.insert("email".to_string(), Value::String(email.clone()));
        }
        if let Some(password) = &credentials.password {
            payload.insert(
                "password".to_string(),
                Value::String(password.expose_secret().to_string()),
            );
        }

        let response = self
            .http
            .post(self.endpoint("/auth/login")?)
            .json(&Value::Object(payload))
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(UpstreamLogin {
            status,
            headers,
            body,
        })
    }

    /// `POST /auth/logout`, best effort. Failures are logged and swallowed;
    /// local cookie clearing never depends on the outcome.
    pub async fn logout(&self, access: &str) {
        let Ok(endpoint) = self.endpoint("/auth/logout") else {
            return;
        };
        let request = self.http.post(endpoint);
        if let Err(err) = self
            .present(request, ACCESS_COOKIE, access)
            .send()
            .await
        {
            debug!("Upstream logout failed (ignored): {err}");
        }
    }
}

fn unreachable(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::UpstreamUnreachable("timeout".to_string())
    } else {
        AuthError::UpstreamUnreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        let upstream = Upstream::new(
            Url::parse("https://auth.example.dev/").unwrap(),
            CredentialTransport::Cookie,
        )
        .unwrap();

        let url = upstream.endpoint("/me").unwrap();
        assert_eq!(url.as_str(), "https://auth.example.dev/me");
    }

    #[test]
    fn endpoint_keeps_a_base_path() {
        let upstream = Upstream::new(
            Url::parse("https://edge.example.dev/auth-worker").unwrap(),
            CredentialTransport::Cookie,
        )
        .unwrap();

        let url = upstream.endpoint("/auth/refresh").unwrap();
        assert_eq!(
            url.as_str(),
            "https://edge.example.dev/auth-worker/auth/refresh"
        );
    }
}
