use crate::scanbridge::handlers::{bool_attr, forward, push_attr};
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
pub struct GetTasksParams {
    /// Filter term to use for the query
    pub filter_string: Option<String>,
    /// UUID of an existing filter to use for the query
    pub filter_id: Option<String>,
    /// Whether to get the trashcan tasks instead
    pub trash: Option<bool>,
    /// Whether to include full task details
    pub details: Option<bool>,
    /// Whether to only include id, name and schedule details
    pub schedules_only: Option<bool>,
}

#[utoipa::path(
    get,
    path= "/get/tasks",
    params(GetTasksParams),
    responses (
        (status = 200, description = "Task list", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "task",
)]
#[instrument(skip(state, headers))]
pub async fn get_tasks(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<GetTasksParams>,
) -> Response {
    let mut command = String::from("<get_tasks");

    if let Some(v) = &params.filter_string {
        push_attr(&mut command, "filter", v);
    }
    if let Some(v) = &params.filter_id {
        push_attr(&mut command, "filt_id", v);
    }
    if let Some(v) = params.trash {
        push_attr(&mut command, "trash", bool_attr(v));
    }
    if let Some(v) = params.details {
        push_attr(&mut command, "details", bool_attr(v));
    }
    if let Some(v) = params.schedules_only {
        push_attr(&mut command, "schedules_only", bool_attr(v));
    }

    command.push_str("/>");

    forward(&state, &headers, &command).await
}

#[derive(IntoParams, Deserialize, Debug)]
#[into_params(parameter_in = Query)]
pub struct GetTaskParams {
    /// UUID of an existing task
    pub task_id: String,
}

#[utoipa::path(
    get,
    path= "/get/task",
    params(GetTaskParams),
    responses (
        (status = 200, description = "Single task with details", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "task",
)]
#[instrument(skip(state, headers))]
pub async fn get_task(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<GetTaskParams>,
) -> Response {
    let mut command = String::from("<get_tasks");
    push_attr(&mut command, "task_id", &params.task_id);
    push_attr(&mut command, "details", "1");
    command.push_str("/>");

    forward(&state, &headers, &command).await
}

#[derive(IntoParams, Deserialize, Debug)]
#[into_params(parameter_in = Query)]
pub struct DeleteTaskParams {
    /// UUID of the task to be deleted
    pub task_id: String,
    /// Whether to remove entirely, or to the trashcan
    pub ultimate: Option<bool>,
}

#[utoipa::path(
    delete,
    path= "/delete/task",
    params(DeleteTaskParams),
    responses (
        (status = 200, description = "Task deleted", body = String, content_type = "application/xml"),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("bearer" = [])),
    tag = "task",
)]
#[instrument(skip(state, headers))]
pub async fn delete_task(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<DeleteTaskParams>,
) -> Response {
    let mut command = String::from("<delete_task");
    push_attr(&mut command, "task_id", &params.task_id);
    push_attr(
        &mut command,
        "ultimate",
        bool_attr(params.ultimate.unwrap_or(false)),
    );
    command.push_str("/>");

    forward(&state, &headers, &command).await
}
