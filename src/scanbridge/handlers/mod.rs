pub mod health;
pub use self::health::health;

pub mod ping;
pub use self::ping::ping;

pub mod authenticate;
pub use self::authenticate::authenticate;

pub mod version;
pub use self::version::{describe_auth, get_version, is_authenticated};

pub mod task;
pub use self::task::{delete_task, get_task, get_tasks};

pub mod user;
pub use self::user::{get_user, get_users};

// common plumbing for the forwarding handlers
use crate::auth::{self, User};
use crate::gmp::classify::{self, Classified};
use crate::scanbridge::AppState;
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use quick_xml::escape::escape;
use std::fmt::Write;
use tracing::error;

/// Render the gateway's own failures in the same envelope shape the backend
/// uses for its replies, so clients can inspect `status` uniformly.
pub(crate) fn error_response(message: &str) -> Response {
    let body = format!(
        r#"<error_response status="500" status_text="{}"/>"#,
        escape(message)
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        )],
        body,
    )
        .into_response()
}

/// Guard, connect, authenticate as the caller, send one command, classify.
///
/// This is the entire forwarding pipeline: identity resolution always
/// completes before the backend is touched, and the classified reply decides
/// the HTTP status of the outer response.
pub(crate) async fn forward(state: &AppState, headers: &HeaderMap, command: &str) -> Response {
    let user = match auth::resolve_identity(&state.store, &state.signer, headers) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    match send_as(state, &user, command).await {
        Ok(classified) => classified.into_response(),
        Err(e) => {
            error!("Backend call failed: {e:#}");

            error_response(&format!("{e:#}"))
        }
    }
}

async fn send_as(state: &AppState, user: &User, command: &str) -> anyhow::Result<Classified> {
    let mut conn = state.backend.connect().await?;

    conn.authenticate(&user.username, user.backend_password())
        .await?;

    let reply = conn.request(command).await?;

    Ok(classify::classify(&reply))
}

/// Append an escaped XML attribute to a command under construction.
pub(crate) fn push_attr(command: &mut String, name: &str, value: &str) {
    // Writing into a String cannot fail.
    let _ = write!(command, r#" {name}="{}""#, escape(value));
}

pub(crate) fn bool_attr(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_attr_escapes() {
        let mut command = String::from("<get_tasks");
        push_attr(&mut command, "filter", r#"name="x" & <y>"#);
        command.push_str("/>");

        assert_eq!(
            command,
            r#"<get_tasks filter="name=&quot;x&quot; &amp; &lt;y&gt;"/>"#
        );
    }

    #[test]
    fn test_bool_attr() {
        assert_eq!(bool_attr(true), "1");
        assert_eq!(bool_attr(false), "0");
    }
}
