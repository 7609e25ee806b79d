pub mod server;

use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        socket: PathBuf,
        username: String,
        password: SecretString,
        secret: Option<SecretString>,
        token_ttl: Duration,
        users_file: PathBuf,
        handshake_retries: u32,
    },
}
