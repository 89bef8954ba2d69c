use crate::cli::actions::Action;
use crate::gate::{self, config::GateConfig, cookies::SameSite, upstream::CredentialTransport};
use anyhow::Result;
use tracing::error;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            upstream_base,
            upstream_bearer,
            access_max_age,
            refresh_max_age,
            insecure_cookies,
        } => {
            // Validate the upstream address eagerly. A missing or unparsable
            // address is not fatal: the gate starts fail-closed and denies
            // every protected request with a login redirect.
            let upstream_base = match upstream_base {
                Some(raw) => match Url::parse(&raw) {
                    Ok(url) => Some(url),
                    Err(err) => {
                        error!("Invalid upstream base URL {raw:?}: {err}");
                        None
                    }
                },
                None => {
                    error!(
                        "No upstream base configured; all protected requests will be denied"
                    );
                    None
                }
            };

            let transport = if upstream_bearer {
                CredentialTransport::Bearer
            } else {
                CredentialTransport::Cookie
            };

            let config = GateConfig::new(upstream_base)
                .with_transport(transport)
                .with_access_max_age(access_max_age)
                .with_refresh_max_age(refresh_max_age)
                .with_cookie_secure(!insecure_cookies)
                .with_same_site(SameSite::Lax);

            gate::new(port, config).await?;
        }
    }

    Ok(())
}
