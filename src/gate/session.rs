//! Session resolution: cookies in, verified identity out.
//!
//! Per protected request the state machine is
//! `START -> CHECK_ACCESS -> {AUTHENTICATED | CHECK_REFRESH} ->
//! {AUTHENTICATED | UNAUTHENTICATED}`, terminal either way. Nothing
//! persists across requests; at most one refresh call is made per request.

use tracing::debug;

use crate::gate::{
    cookies::{self, CookieDirective, CookieJar, TokenKind, ACCESS_COOKIE, REFRESH_COOKIE},
    error::{AuthError, Result},
    types::Identity,
    GateState,
};

/// A resolved session: the identity plus any cookies rotated on the way.
#[derive(Debug)]
pub struct Resolved {
    pub identity: Identity,
    pub rotated: Vec<CookieDirective>,
}

/// Turn the request's cookie jar into a verified identity.
///
/// The access credential is verified with a single upstream attempt; on a
/// missing or rejected credential the resolver falls back to one refresh.
/// With neither credential in the jar it fails fast without any upstream
/// call.
pub async fn resolve(state: &GateState, jar: &CookieJar) -> Result<Resolved> {
    let access = jar.access();
    if access.is_none() && jar.refresh().is_none() {
        return Err(AuthError::Unauthenticated);
    }

    if let Some(token) = access {
        match state.upstream()?.verify(token).await {
            Ok(identity) => {
                return Ok(Resolved {
                    identity,
                    rotated: Vec::new(),
                })
            }
            // Expired or invalid: fall through to the refresh credential.
            Err(AuthError::InvalidCredential) => {
                debug!("Access credential rejected, attempting refresh");
            }
            // Upstream is down; a refresh attempt would burn the rotation
            // cycle against a dead service. Fail closed instead.
            Err(err) => return Err(err),
        }
    }

    refresh(state, jar).await
}

/// Exchange the refresh credential for a new access credential, verify it
/// once, and mirror every minted token as a first-party cookie.
///
/// Never re-enters itself: if the follow-up verify fails the whole
/// operation is a `RefreshFailed`.
pub async fn refresh(state: &GateState, jar: &CookieJar) -> Result<Resolved> {
    let Some(token) = jar.refresh() else {
        return Err(AuthError::RefreshFailed);
    };

    let upstream = state.upstream()?;
    let grant = upstream.refresh(token).await?;

    let identity = match upstream.verify(&grant.access.value).await {
        Ok(identity) => identity,
        Err(err) => {
            debug!("Verify after refresh failed: {err}");
            return Err(AuthError::RefreshFailed);
        }
    };

    let config = state.config();
    let mut rotated = vec![cookies::mirror(
        config,
        ACCESS_COOKIE,
        &grant.access,
        TokenKind::Access,
    )];
    if let Some(rotated_refresh) = &grant.refresh {
        rotated.push(cookies::mirror(
            config,
            REFRESH_COOKIE,
            rotated_refresh,
            TokenKind::Refresh,
        ));
    }

    Ok(Resolved { identity, rotated })
}
