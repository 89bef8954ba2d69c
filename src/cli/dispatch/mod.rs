use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        upstream_base: matches
            .get_one::<String>("upstream-base")
            .map(String::to_string),
        upstream_bearer: matches.get_flag("upstream-bearer"),
        access_max_age: matches
            .get_one::<i64>("access-max-age")
            .copied()
            .unwrap_or(900),
        refresh_max_age: matches
            .get_one::<i64>("refresh-max-age")
            .copied()
            .unwrap_or(1_209_600),
        insecure_cookies: matches.get_flag("insecure-cookies"),
    })
}
