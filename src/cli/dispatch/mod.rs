use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if a required argument is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let socket = matches
        .get_one::<PathBuf>("socket")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(crate::gmp::DEFAULT_SOCKET_PATH));

    let username = matches
        .get_one::<String>("username")
        .cloned()
        .context("missing required argument: --username")?;

    let password = matches
        .get_one::<String>("password")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --password")?;

    let secret = matches
        .get_one::<String>("secret")
        .cloned()
        .map(SecretString::from);

    let token_ttl = matches
        .get_one::<u64>("token-ttl")
        .copied()
        .map(|minutes| Duration::from_secs(minutes * 60))
        .unwrap_or(crate::auth::token::DEFAULT_TOKEN_TTL);

    let users_file = matches
        .get_one::<PathBuf>("users-file")
        .cloned()
        .context("missing required argument: --users-file")?;

    let handshake_retries = matches
        .get_one::<u32>("handshake-retries")
        .copied()
        .unwrap_or(crate::gmp::handshake::DEFAULT_MAX_ATTEMPTS);

    Ok(Action::Server {
        port,
        socket,
        username,
        password,
        secret,
        token_ttl,
        users_file,
        handshake_retries,
    })
}
