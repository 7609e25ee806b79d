//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying `sub`, `iat` and `exp`. No server-side
//! record is kept: a token is valid iff the signature verifies against the
//! process signing secret and the expiry has not passed. Restarting the
//! process with a generated secret invalidates all outstanding tokens.

use super::AuthError;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default session lifetime. The original gateway had a second, unreachable
/// 15-minute fallback in its low-level token primitive; this is the single
/// documented default.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    default_ttl: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: SecretString, default_ttl: Duration) -> Self {
        Self {
            secret,
            default_ttl,
        }
    }

    /// Sign a token for `subject` using the default ttl.
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue(&self, subject: &str) -> anyhow::Result<String> {
        self.issue_with_ttl(subject, self.default_ttl)
    }

    /// Sign a token for `subject` expiring `ttl` from now.
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    /// Returns [`AuthError::Unauthenticated`] when the signature does not
    /// verify, the `sub` claim is missing, or the token has expired. The
    /// variants are deliberately indistinguishable to the caller.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims.sub)
        .map_err(|e| {
            debug!("Token rejected: {e}");

            AuthError::Unauthenticated
        })
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"***")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Generate a fresh hex-encoded signing secret.
///
/// Used when no secret is configured; tokens then survive only for the
/// lifetime of the process.
#[must_use]
pub fn random_secret() -> SecretString {
    let mut rng = rand::thread_rng();

    let secret: String = (0..32).map(|_| format!("{:02x}", rng.gen::<u8>())).collect();

    SecretString::from(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::from("test-secret".to_string()), DEFAULT_TOKEN_TTL)
    }

    #[test]
    fn test_round_trip() {
        let signer = signer();
        let token = signer.issue("admin").unwrap();

        assert_eq!(signer.validate(&token).unwrap(), "admin");
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let signer = signer();
        let now = Utc::now().timestamp();

        // Forge an already-expired token with the same secret.
        let expired = encode(
            &Header::default(),
            &json!({"sub": "admin", "iat": now - 120, "exp": now - 60}),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(signer.validate(&expired).is_err());
    }

    #[test]
    fn test_missing_subject_is_invalid() {
        let signer = signer();
        let now = Utc::now().timestamp();

        let anonymous = encode(
            &Header::default(),
            &json!({"iat": now, "exp": now + 60}),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(signer.validate(&anonymous).is_err());
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let signer = signer();
        let token = signer.issue("admin").unwrap();

        // Flip one character in every position; none may validate.
        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };

            if let Ok(mangled) = String::from_utf8(bytes) {
                if mangled == token {
                    continue;
                }
                assert!(signer.validate(&mangled).is_err(), "position {i}");
            }
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = signer().issue("admin").unwrap();
        let other = TokenSigner::new(
            SecretString::from("other-secret".to_string()),
            DEFAULT_TOKEN_TTL,
        );

        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_random_secret_is_unique() {
        let a = random_secret();
        let b = random_secret();

        assert_eq!(a.expose_secret().len(), 64);
        assert_ne!(a.expose_secret(), b.expose_secret());
    }
}
