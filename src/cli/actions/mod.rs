pub mod server;

/// Actions the CLI can dispatch to.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        upstream_base: Option<String>,
        upstream_bearer: bool,
        access_max_age: i64,
        refresh_max_age: i64,
        insecure_cookies: bool,
    },
}
