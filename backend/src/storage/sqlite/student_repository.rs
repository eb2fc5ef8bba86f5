use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use shared::{RegistrationStatus, StudentRecord};
use sqlx::Row;

use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::models::{Student, StudentPatch};
use crate::io::rest::mappers::StudentMapper;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::StudentStorage;

/// Repository keeping each student as a JSON document keyed by id, with
/// the email lifted into its own unique column.
#[derive(Clone)]
pub struct StudentRepository {
    db: DbConnection,
}

impl StudentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn encode(student: &Student) -> RegistryResult<String> {
        let record = StudentMapper::to_dto(student.clone());
        Ok(serde_json::to_string(&record).context("Failed to serialize student document")?)
    }

    fn decode(document: &str) -> RegistryResult<Student> {
        let record: StudentRecord =
            serde_json::from_str(document).context("Failed to parse student document")?;
        Ok(StudentMapper::to_domain(record)?)
    }

    /// Id of the record using `email`, if any
    async fn find_id_by_email(&self, email: &str) -> RegistryResult<Option<String>> {
        let row = sqlx::query("SELECT id FROM students WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await
            .context("Failed to look up student by email")?;

        Ok(row.map(|r| r.get::<String, _>("id")))
    }

    async fn ensure_email_free(&self, email: &str, owner_id: Option<&str>) -> RegistryResult<()> {
        match self.find_id_by_email(email).await? {
            Some(existing) if Some(existing.as_str()) != owner_id => {
                warn!("Rejecting duplicate email {} (used by {})", email, existing);
                Err(RegistryError::DuplicateEmail { email: email.to_string() })
            }
            _ => Ok(()),
        }
    }

    async fn save(&self, student: &Student) -> RegistryResult<()> {
        let document = Self::encode(student)?;
        let result = sqlx::query(
            r#"
            UPDATE students
            SET email = ?, document = ?
            WHERE id = ?
            "#,
        )
        .bind(&student.email)
        .bind(&document)
        .bind(&student.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_write_error(e, &student.email))?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::not_found(&student.id));
        }
        Ok(())
    }
}

/// Unique-index violations surface as duplicate emails
fn map_write_error(error: sqlx::Error, email: &str) -> RegistryError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            RegistryError::DuplicateEmail { email: email.to_string() }
        }
        _ => RegistryError::Storage(anyhow::Error::new(error).context("Failed to write student")),
    }
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn list_students(&self) -> RegistryResult<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM students
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .context("Failed to list students")?;

        rows.iter()
            .map(|row| Self::decode(&row.get::<String, _>("document")))
            .collect()
    }

    async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>> {
        let row = sqlx::query("SELECT document FROM students WHERE id = ?")
            .bind(student_id)
            .fetch_optional(self.db.pool())
            .await
            .context("Failed to get student")?;

        row.map(|r| Self::decode(&r.get::<String, _>("document")))
            .transpose()
    }

    async fn create_student(&self, student: &Student) -> RegistryResult<Student> {
        self.ensure_email_free(&student.email, None).await?;

        let document = Self::encode(student)?;
        sqlx::query(
            r#"
            INSERT INTO students (id, email, created_at, document)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.email)
        .bind(student.created_at.to_rfc3339())
        .bind(&document)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_write_error(e, &student.email))?;

        info!("Stored student {} ({})", student.id, student.email);
        Ok(student.clone())
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> RegistryResult<Student> {
        let mut student = self
            .get_student(student_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(student_id))?;

        if let Some(email) = &patch.email {
            self.ensure_email_free(email, Some(student_id)).await?;
        }

        patch.apply(&mut student, Utc::now());
        self.save(&student).await?;

        info!("Updated student {}", student_id);
        Ok(student)
    }

    async fn update_status(
        &self,
        student_id: &str,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> RegistryResult<Student> {
        let mut student = self
            .get_student(student_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(student_id))?;

        student.status = status;
        student.updated_at = Some(updated_at);
        self.save(&student).await?;

        info!("Student {} is now {}", student_id, status);
        Ok(student)
    }

    async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(student_id)
            .execute(self.db.pool())
            .await
            .context("Failed to delete student")?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::not_found(student_id));
        }
        Ok(())
    }

    async fn delete_all_students(&self) -> RegistryResult<usize> {
        let result = sqlx::query("DELETE FROM students")
            .execute(self.db.pool())
            .await
            .context("Failed to delete students")?;

        Ok(result.rows_affected() as usize)
    }
}
