use crate::auth::{token, TokenSigner, UserStore};
use crate::cli::actions::Action;
use crate::gmp::{handshake::Handshake, GmpClient, DEFAULT_TIMEOUT};
use crate::scanbridge::{self, AppState};
use anyhow::Result;
use tracing::{error, info};

/// Handle the server action.
///
/// Order matters here: the store is seeded and the backend handshake
/// completes before the listener is bound, so no request is ever served
/// against an unseeded store or an unreachable backend. A failed handshake
/// terminates the process with the error's distinct exit code.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        socket,
        username,
        password,
        secret,
        token_ttl,
        users_file,
        handshake_retries,
    } = action;

    let secret = secret.unwrap_or_else(|| {
        info!("No signing secret configured, generating one; sessions will not survive a restart");

        token::random_secret()
    });

    let signer = TokenSigner::new(secret, token_ttl);

    let store = UserStore::seed_if_absent(&users_file, &username, &password)?;

    let backend = GmpClient::new(socket, DEFAULT_TIMEOUT);

    let probe_client = backend.clone();
    let handshake = Handshake::new(handshake_retries);

    if let Err(e) = handshake
        .run(|| {
            let client = probe_client.clone();

            async move {
                let mut conn = client.connect().await?;

                conn.request("<get_version/>").await
            }
        })
        .await
    {
        error!("{e}");

        std::process::exit(e.exit_code());
    }

    scanbridge::new(
        port,
        AppState {
            store,
            signer,
            backend,
        },
    )
    .await
}
