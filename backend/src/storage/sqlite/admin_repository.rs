use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::domain::errors::RegistryResult;
use crate::domain::models::Admin;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::AdminStorage;

/// Repository for administrator accounts
#[derive(Clone)]
pub struct AdminRepository {
    db: DbConnection,
}

impl AdminRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminStorage for AdminRepository {
    async fn get_admin(&self, username: &str) -> RegistryResult<Option<Admin>> {
        let row = sqlx::query(
            r#"
            SELECT username, password_hash, role, created_at
            FROM admins
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await
        .context("Failed to get admin")?;

        match row {
            Some(r) => {
                let created_at: String = r.get("created_at");
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .context("Failed to parse admin created_at")?
                    .with_timezone(&Utc);
                Ok(Some(Admin {
                    username: r.get("username"),
                    password_hash: r.get("password_hash"),
                    role: r.get("role"),
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn count_admins(&self) -> RegistryResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM admins")
            .fetch_one(self.db.pool())
            .await
            .context("Failed to count admins")?;

        Ok(row.get::<i64, _>("total"))
    }

    async fn store_admin(&self, admin: &Admin) -> RegistryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash, role, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash
            "#,
        )
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(&admin.role)
        .bind(admin.created_at.to_rfc3339())
        .execute(self.db.pool())
        .await
        .context("Failed to store admin")?;

        Ok(())
    }
}
