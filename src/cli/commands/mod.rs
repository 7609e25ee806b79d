use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};
use std::path::PathBuf;

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

    Command::new("scanbridge")
        .about("REST translation gateway for a GMP vulnerability scanner manager")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("SCANBRIDGE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("socket")
                .short('s')
                .long("socket")
                .help("Path to the scanner manager's control socket")
                .default_value(crate::gmp::DEFAULT_SOCKET_PATH)
                .env("SCANBRIDGE_SOCKET")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Bootstrap admin username, must exist on the scanner manager")
                .env("SCANBRIDGE_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Bootstrap admin password")
                .default_value("admin")
                .env("SCANBRIDGE_PASSWORD"),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .help("Token signing secret; generated at startup when absent")
                .env("SCANBRIDGE_SECRET"),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .help("Session token lifetime in minutes")
                .default_value("30")
                .env("SCANBRIDGE_TOKEN_TTL")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("users-file")
                .long("users-file")
                .help("Path of the persisted user store")
                .default_value("/var/lib/scanbridge/users.json")
                .env("SCANBRIDGE_USERS_FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("handshake-retries")
                .long("handshake-retries")
                .help("Backend probe attempts before giving up at startup")
                .default_value("60")
                .env("SCANBRIDGE_HANDSHAKE_RETRIES")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SCANBRIDGE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
