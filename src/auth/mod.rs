//! Authentication and session gateway.
//!
//! Two operations back every route in the HTTP layer: [`login`] turns a
//! username/password pair into a bearer token, and [`resolve_identity`]
//! turns a bearer token back into an active user. This module is the only
//! place session state is interpreted.

pub mod password;
pub mod store;
pub mod token;

pub use store::{User, UserStore};
pub use token::TokenSigner;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Authentication failures and their HTTP mappings.
///
/// The two 401 variants carry different user-facing details (matching the
/// login and token-guard surfaces) but deliberately never reveal *which*
/// check failed: unknown user, wrong password and expired token all look the
/// same to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password at login.
    #[error("Incorrect username or password")]
    IncorrectCredentials,

    /// Missing, malformed, expired or unverifiable token, or a token whose
    /// subject no longer exists in the store.
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// Valid token for a disabled account.
    #[error("Inactive user")]
    InactiveUser,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::IncorrectCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InactiveUser => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({ "detail": self.to_string() }));

        if status == StatusCode::UNAUTHORIZED {
            // Bearer challenge on every 401, per RFC 6750.
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Issued session token, as returned by `POST /authenticate`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Login form, consumed form-encoded.
#[derive(ToSchema, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[schema(format = Password)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Verify a credential pair and issue a session token.
///
/// # Errors
/// [`AuthError::IncorrectCredentials`] when the user is unknown or the
/// password does not verify. The outcome is logged with the username, never
/// the password.
pub fn login(
    store: &UserStore,
    signer: &TokenSigner,
    username: &str,
    plaintext: &str,
) -> Result<Token, AuthError> {
    let verified = store
        .lookup(username)
        .is_some_and(|user| password::verify(plaintext, &user.password_hash));

    if !verified {
        warn!("User '{username}' has failed authentication");

        return Err(AuthError::IncorrectCredentials);
    }

    let access_token = signer.issue(username).map_err(|e| {
        warn!("Failed to issue token for '{username}': {e}");

        AuthError::Unauthenticated
    })?;

    info!("User '{username}' has passed authentication");

    Ok(Token {
        access_token,
        token_type: "bearer".to_string(),
    })
}

/// Resolve the active user behind a bearer token.
///
/// The checks run as a fixed sequence: invalid token → 401, valid token for a
/// missing user → 401 (indistinguishable from the former), valid token for a
/// disabled user → 400, otherwise the user is returned.
///
/// # Errors
/// [`AuthError::Unauthenticated`] or [`AuthError::InactiveUser`] per above.
pub fn resolve_identity(
    store: &UserStore,
    signer: &TokenSigner,
    headers: &HeaderMap,
) -> Result<User, AuthError> {
    let token = bearer_token(headers)?;

    let subject = signer.validate(token)?;

    let user = store.lookup(&subject).ok_or(AuthError::Unauthenticated)?;

    if user.disabled {
        warn!("User '{}' is disabled", user.username);

        return Err(AuthError::InactiveUser);
    }

    Ok(user.clone())
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn user(username: &str, plaintext: &str, disabled: bool) -> User {
        User::new(
            username.to_string(),
            password::hash(plaintext).unwrap(),
            SecretString::from(plaintext.to_string()),
            disabled,
        )
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("test-secret".to_string()),
            token::DEFAULT_TOKEN_TTL,
        )
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_login_round_trip() {
        let store = UserStore::with_users([user("admin", "admin", false)]);
        let signer = signer();

        let token = login(&store, &signer, "admin", "admin").unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(signer.validate(&token.access_token).unwrap(), "admin");
    }

    #[test]
    fn test_login_wrong_password() {
        let store = UserStore::with_users([user("admin", "admin", false)]);

        assert_eq!(
            login(&store, &signer(), "admin", "wrong").unwrap_err(),
            AuthError::IncorrectCredentials
        );
    }

    #[test]
    fn test_login_unknown_user_same_error() {
        let store = UserStore::with_users([user("admin", "admin", false)]);

        // Unknown user and wrong password must be indistinguishable.
        assert_eq!(
            login(&store, &signer(), "nope", "x").unwrap_err(),
            AuthError::IncorrectCredentials
        );
    }

    #[test]
    fn test_resolve_identity_active_user() {
        let store = UserStore::with_users([user("admin", "admin", false)]);
        let signer = signer();
        let token = signer.issue("admin").unwrap();

        let resolved = resolve_identity(&store, &signer, &headers_with(&token)).unwrap();

        assert_eq!(resolved.username, "admin");
    }

    #[test]
    fn test_resolve_identity_disabled_user() {
        let store = UserStore::with_users([user("bob", "bob", true)]);
        let signer = signer();
        let token = signer.issue("bob").unwrap();

        assert_eq!(
            resolve_identity(&store, &signer, &headers_with(&token)).unwrap_err(),
            AuthError::InactiveUser
        );
    }

    #[test]
    fn test_resolve_identity_unknown_subject() {
        let store = UserStore::with_users([user("admin", "admin", false)]);
        let signer = signer();
        let token = signer.issue("ghost").unwrap();

        assert_eq!(
            resolve_identity(&store, &signer, &headers_with(&token)).unwrap_err(),
            AuthError::Unauthenticated
        );
    }

    #[test]
    fn test_resolve_identity_missing_header() {
        let store = UserStore::with_users([user("admin", "admin", false)]);

        assert_eq!(
            resolve_identity(&store, &signer(), &HeaderMap::new()).unwrap_err(),
            AuthError::Unauthenticated
        );
    }

    #[test]
    fn test_resolve_identity_garbage_token() {
        let store = UserStore::with_users([user("admin", "admin", false)]);

        assert_eq!(
            resolve_identity(&store, &signer(), &headers_with("not-a-jwt")).unwrap_err(),
            AuthError::Unauthenticated
        );
    }
}
