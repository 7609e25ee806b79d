//! HTTP surface of the gateway.

pub mod handlers;

use crate::auth::{Credentials, Token, TokenSigner, UserStore};
use crate::gmp::GmpClient;
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
    routing::{delete, get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Process-wide context handed to every handler.
///
/// Built once at startup, before any traffic is accepted, and read-only
/// afterwards: the store and signing secret are never written on the request
/// path, so handlers share it without locks.
pub struct AppState {
    pub store: UserStore,
    pub signer: TokenSigner,
    pub backend: GmpClient,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::ping::ping,
        handlers::authenticate::authenticate,
        handlers::version::get_version,
        handlers::version::describe_auth,
        handlers::version::is_authenticated,
        handlers::task::get_tasks,
        handlers::task::get_task,
        handlers::task::delete_task,
        handlers::user::get_users,
        handlers::user::get_user,
    ),
    components(schemas(Token, Credentials, handlers::health::Health)),
    modifiers(&SecurityAddon),
    tags(
        (name = "scanbridge", description = "REST translation gateway for the scanner manager"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    debug_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id
    )
}

/// Build the application router around a shared [`AppState`].
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any);

    Router::new()
        .route("/authenticate", post(handlers::authenticate))
        .route("/describe_auth", get(handlers::describe_auth))
        .route("/is_authenticated", get(handlers::is_authenticated))
        .route("/get/version", get(handlers::get_version))
        .route("/get/tasks", get(handlers::get_tasks))
        .route("/get/task", get(handlers::get_task))
        .route("/delete/task", delete(handlers::delete_task))
        .route("/get/users", get(handlers::get_users))
        .route("/get/user", get(handlers::get_user))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors),
        )
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
        .layer(Extension(state))
}

/// Bind and serve. Callers run the backend handshake first; once this
/// returns the gateway is accepting traffic.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{port}");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
