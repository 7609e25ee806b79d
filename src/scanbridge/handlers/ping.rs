use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

#[utoipa::path(
    get,
    path= "/ping",
    responses (
        (status = 200, description = "Gateway liveness pong", body = String, content_type = "application/xml")
    ),
    tag = "health",
)]
/// Unauthenticated liveness probe. Answers without touching the backend.
pub async fn ping() -> Response {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        )],
        "<response>pong</response>",
    )
        .into_response()
}
