use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("allstar-gate")
        .about("Edge authentication gate for the Allstar hub")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("GATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("upstream-base")
                .short('u')
                .long("upstream-base")
                .help("Base URL of the upstream identity service, example: https://auth.example.workers.dev")
                .env("GATE_UPSTREAM_BASE"),
        )
        .arg(
            Arg::new("upstream-bearer")
                .long("upstream-bearer")
                .help("Present credentials upstream as an Authorization bearer header instead of forwarded cookies")
                .env("GATE_UPSTREAM_BEARER")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("access-max-age")
                .long("access-max-age")
                .help("Max-Age in seconds for mirrored access cookies when upstream omits one")
                .default_value("900")
                .env("GATE_ACCESS_MAX_AGE")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-max-age")
                .long("refresh-max-age")
                .help("Max-Age in seconds for mirrored refresh cookies when upstream omits one")
                .default_value("1209600")
                .env("GATE_REFRESH_MAX_AGE")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("insecure-cookies")
                .long("insecure-cookies")
                .help("Drop the Secure attribute from issued cookies (local development only)")
                .env("GATE_INSECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("GATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "allstar-gate");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Edge authentication gate for the Allstar hub"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_upstream() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "allstar-gate",
            "--port",
            "8081",
            "--upstream-base",
            "https://auth.example.workers.dev",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8081));
        assert_eq!(
            matches
                .get_one::<String>("upstream-base")
                .map(String::to_string),
            Some("https://auth.example.workers.dev".to_string())
        );
        assert!(!matches.get_flag("upstream-bearer"));
        assert_eq!(matches.get_one::<i64>("access-max-age").copied(), Some(900));
        assert_eq!(
            matches.get_one::<i64>("refresh-max-age").copied(),
            Some(1_209_600)
        );
    }

    #[test]
    fn test_upstream_base_is_optional() {
        // The gate must still start without an upstream and fail closed per
        // request, so the argument cannot be required.
        let command = new();
        let matches = command.get_matches_from(vec!["allstar-gate"]);
        assert_eq!(matches.get_one::<String>("upstream-base"), None);
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("GATE_PORT", Some("443")),
                ("GATE_UPSTREAM_BASE", Some("https://auth.example.dev")),
                ("GATE_UPSTREAM_BEARER", Some("true")),
                ("GATE_ACCESS_MAX_AGE", Some("600")),
                ("GATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["allstar-gate"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    matches
                        .get_one::<String>("upstream-base")
                        .map(String::to_string),
                    Some("https://auth.example.dev".to_string())
                );
                assert!(matches.get_flag("upstream-bearer"));
                assert_eq!(matches.get_one::<i64>("access-max-age").copied(), Some(600));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("GATE_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(vec!["allstar-gate"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("GATE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["allstar-gate".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }
}
