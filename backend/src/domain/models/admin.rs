//! Domain model for an administrator account.

use chrono::{DateTime, Utc};

/// Administrator able to manage registrations. Only the Argon2 hash of the
/// password is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub const DEFAULT_ROLE: &'static str = "admin";
}
