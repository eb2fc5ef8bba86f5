//! Administrator authentication.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use log::{info, warn};
use shared::{AdminUser, LoginRequest};
use std::sync::Arc;

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::Admin;
use crate::storage::traits::AdminStorage;

/// Hash a password with Argon2 and a fresh random salt
pub fn hash_password(password: &str) -> RegistryResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is invalid: {}", e);
            false
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    storage: Arc<dyn AdminStorage>,
}

impl AuthService {
    pub fn new(storage: Arc<dyn AdminStorage>) -> Self {
        Self { storage }
    }

    /// Create the seed administrator when no administrator exists yet
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> RegistryResult<bool> {
        if self.storage.count_admins().await? > 0 {
            return Ok(false);
        }

        let admin = Admin {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role: Admin::DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        };
        self.storage.store_admin(&admin).await?;

        info!("Created default admin user '{}'", username);
        Ok(true)
    }

    pub async fn login(&self, request: &LoginRequest) -> RegistryResult<AdminUser> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(RegistryError::InvalidCredentials);
        }

        let admin = self
            .storage
            .get_admin(username)
            .await?
            .ok_or(RegistryError::InvalidCredentials)?;

        if !verify_password(&request.password, &admin.password_hash) {
            warn!("Failed login for '{}'", username);
            return Err(RegistryError::InvalidCredentials);
        }

        info!("Admin '{}' logged in", username);
        Ok(AdminUser {
            username: admin.username,
            role: admin.role,
        })
    }
}
