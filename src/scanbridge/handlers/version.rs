use crate::auth;
use crate::gmp::classify::Classified;
use crate::scanbridge::handlers::{error_response, forward};
use crate::scanbridge::AppState;
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

#[utoipa::path(
    get,
    path= "/get/version",
    responses (
        (status = 200, description = "Protocol version reported by the manager", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "version",
)]
#[instrument(skip(state, headers))]
pub async fn get_version(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    forward(&state, &headers, "<get_version/>").await
}

#[utoipa::path(
    get,
    path= "/describe_auth",
    responses (
        (status = 200, description = "Authentication methods the manager supports", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "auth",
)]
#[instrument(skip(state, headers))]
pub async fn describe_auth(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    forward(&state, &headers, "<describe_auth/>").await
}

#[utoipa::path(
    get,
    path= "/is_authenticated",
    responses (
        (status = 200, description = "Caller's credentials work against the manager", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "auth",
)]
#[instrument(skip(state, headers))]
/// Check that the caller's backend credential is accepted by the manager.
///
/// Unlike the other routes there is no command to forward: opening and
/// authenticating a connection *is* the check, so the boolean outcome is
/// wrapped in the usual reply shape.
pub async fn is_authenticated(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let user = match auth::resolve_identity(&state.store, &state.signer, &headers) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    let authenticated = async {
        let mut conn = state.backend.connect().await?;
        conn.authenticate(&user.username, user.backend_password())
            .await
    }
    .await;

    match authenticated {
        Ok(()) => Classified {
            status: 200,
            status_text: Some("true".to_string()),
            raw: r#"<is_authenticated_response status="200" status_text="true"/>"#.to_string(),
        }
        .into_response(),
        Err(e) => {
            error!("Backend authentication check failed: {e:#}");

            error_response(&format!("{e:#}"))
        }
    }
}
