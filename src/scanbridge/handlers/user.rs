use crate::scanbridge::handlers::{forward, push_attr};
use crate::scanbridge::AppState;
use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct GetUsersParams {
    /// Filter term to use for the query
    pub filter_string: Option<String>,
    /// UUID of an existing filter to use for the query
    pub filter_id: Option<String>,
}

#[utoipa::path(
    get,
    path= "/get/users",
    params(GetUsersParams),
    responses (
        (status = 200, description = "Manager user list", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "user",
)]
#[instrument(skip(state, headers))]
pub async fn get_users(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<GetUsersParams>,
) -> Response {
    let mut command = String::from("<get_users");

    if let Some(v) = &params.filter_string {
        push_attr(&mut command, "filter", v);
    }
    if let Some(v) = &params.filter_id {
        push_attr(&mut command, "filt_id", v);
    }

    command.push_str("/>");

    forward(&state, &headers, &command).await
}

#[derive(IntoParams, Deserialize, Debug)]
#[into_params(parameter_in = Query)]
pub struct GetUserParams {
    /// UUID of an existing user
    pub user_id: String,
}

#[utoipa::path(
    get,
    path= "/get/user",
    params(GetUserParams),
    responses (
        (status = 200, description = "Single manager user", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "user",
)]
#[instrument(skip(state, headers))]
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<GetUserParams>,
) -> Response {
    let mut command = String::from("<get_users");
    push_attr(&mut command, "user_id", &params.user_id);
    command.push_str("/>");

    forward(&state, &headers, &command).await
}
