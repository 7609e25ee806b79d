//! On-disk credential store.
//!
//! A single JSON blob owned by this crate, written exactly once on first run
//! and loaded read-only afterwards. No traffic is served before the load
//! completes, so lookups after startup never race with a writer.

use crate::auth::password;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// A gateway user.
///
/// `backend_password` is the cleartext credential used to re-authenticate
/// against the scanner manager on the caller's behalf. The manager has its
/// own credential scheme, so the gateway cannot derive it from the login
/// hash. Keeping it in cleartext is a known compromise of the original
/// design; it is reachable only through [`User::backend_password`] so a
/// proper delegation mechanism can replace it without touching callers.
#[derive(Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    backend_password: SecretString,
    pub disabled: bool,
}

impl User {
    #[must_use]
    pub fn new(
        username: String,
        password_hash: String,
        backend_password: SecretString,
        disabled: bool,
    ) -> Self {
        Self {
            username,
            password_hash,
            backend_password,
            disabled,
        }
    }

    /// Credential for the scanner manager's own authentication scheme.
    #[must_use]
    pub fn backend_password(&self) -> &SecretString {
        &self.backend_password
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("backend_password", &"***")
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// On-disk record. Schema is owned by this module.
#[derive(Serialize, Deserialize)]
struct UserRecord {
    username: String,
    password_hash: String,
    backend_password: String,
    disabled: bool,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    users: Vec<UserRecord>,
}

/// In-memory user map, keyed by username.
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    /// Load the store, seeding it with the bootstrap identity on first run.
    ///
    /// Idempotent: when the file already exists it is loaded unchanged and
    /// the bootstrap parameters are ignored. First run performs exactly one
    /// persisted write, containing a single enabled record for
    /// `bootstrap_username`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, written or parsed, or if
    /// password hashing fails.
    pub fn seed_if_absent(
        path: &Path,
        bootstrap_username: &str,
        bootstrap_password: &SecretString,
    ) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        info!(
            "Seeding user store at {} with bootstrap user '{}'",
            path.display(),
            bootstrap_username
        );

        let record = UserRecord {
            username: bootstrap_username.to_string(),
            password_hash: password::hash(bootstrap_password.expose_secret())?,
            backend_password: bootstrap_password.expose_secret().to_string(),
            disabled: false,
        };

        let file = StoreFile {
            users: vec![record],
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(path, serde_json::to_vec_pretty(&file)?)
            .with_context(|| format!("Failed to write user store at {}", path.display()))?;

        Self::load(path)
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("Failed to read user store at {}", path.display()))?;

        let file: StoreFile = serde_json::from_slice(&raw)
            .with_context(|| format!("Malformed user store at {}", path.display()))?;

        let users = file
            .users
            .into_iter()
            .map(|r| {
                (
                    r.username.clone(),
                    User::new(
                        r.username,
                        r.password_hash,
                        SecretString::from(r.backend_password),
                        r.disabled,
                    ),
                )
            })
            .collect::<HashMap<_, _>>();

        info!("Loaded {} user(s) from the store", users.len());

        Ok(Self { users })
    }

    #[must_use]
    pub fn lookup(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Build a store directly from records, bypassing the disk. Test-only.
    #[cfg(test)]
    pub(crate) fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }
}
