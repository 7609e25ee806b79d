use crate::auth::{self, AuthError, Credentials, Token};
use crate::scanbridge::AppState;
use axum::{extract::Extension, response::Json, Form};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path= "/authenticate",
    request_body(
        content = Credentials,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses (
        (status = 200, description = "Session token issued", body = Token),
        (status = 401, description = "Incorrect username or password"),
    ),
    tag = "auth",
)]
#[instrument(skip(state, credentials))]
pub async fn authenticate(
    Extension(state): Extension<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> Result<Json<Token>, AuthError> {
    auth::login(
        &state.store,
        &state.signer,
        &credentials.username,
        &credentials.password,
    )
    .map(Json)
}
