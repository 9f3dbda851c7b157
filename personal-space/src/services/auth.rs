//! Account authentication
//!
//! Passwords are stored as Argon2id PHC strings. A successful login yields an
//! [`AuthSession`], which is the only way callers can reach mutating commands.

use crate::config::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use crate::database::{CollectionStore, User};
use crate::error::{AppError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

/// Proof that a caller has been authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
    _sealed: (),
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Generic(format!("Password hashing failed: {}", e)))
}

/// The account created on first run
pub fn seed_admin_user() -> Result<User> {
    Ok(User {
        id: DEFAULT_ADMIN_USERNAME.to_string(),
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
    })
}

fn verify_password(user: &User, password: &str) -> bool {
    let parsed = match PasswordHash::new(&user.password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(
                "Stored credential for '{}' is not a supported hash ({}); \
                 run `personal-space reset-password` to replace it",
                user.username,
                e
            );
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Service verifying credentials against the `users` collection
#[derive(Clone)]
pub struct AuthService {
    store: CollectionStore,
}

impl AuthService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    /// Check a username/password pair. A missing username means the admin.
    pub async fn login(&self, username: Option<&str>, password: &str) -> Result<AuthSession> {
        let username = match username.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_ADMIN_USERNAME,
        };

        let users: Vec<User> = self.store.get().await?;
        let user = users
            .into_iter()
            .find(|u| u.username == username)
            .ok_or(AppError::AuthRejected)?;

        if !verify_password(&user, password) {
            tracing::warn!("Rejected login for '{}'", username);
            return Err(AppError::AuthRejected);
        }

        tracing::info!("User '{}' logged in", user.username);

        Ok(AuthSession {
            user_id: user.id,
            username: user.username,
            _sealed: (),
        })
    }

    /// Replace a user's stored credential with a fresh Argon2 hash.
    ///
    /// Works whatever the old hash was, which is how accounts carried over
    /// with an unsupported hash get access back.
    pub async fn reset_password(&self, username: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(AppError::validation("new password must not be empty"));
        }

        let password_hash = hash_password(new_password)?;
        self.store
            .update(|doc| {
                let user = doc
                    .users
                    .iter_mut()
                    .find(|u| u.username == username)
                    .ok_or_else(|| AppError::not_found("User", username))?;
                user.password_hash = password_hash;
                Ok(())
            })
            .await?;

        tracing::info!("Password reset for '{}'", username);
        Ok(())
    }
}
