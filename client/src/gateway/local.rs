//! Local fallback slot: the whole record list kept in one JSON file.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use registry_backend::domain::models::{Student, StudentPatch};
use registry_backend::domain::{RegistryError, RegistryResult};
use registry_backend::io::rest::mappers::StudentMapper;
use registry_backend::storage::StudentStorage;
use shared::{RegistrationStatus, StudentRecord};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store keeping `[StudentRecord]` in a single file, newest first.
///
/// Every write rewrites the file through a temporary sibling followed by a
/// rename, so a crash leaves either the old or the new list on disk.
pub struct LocalSlotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalSlotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with a fresh copy of the remote list
    pub async fn replace_all(&self, students: &[Student]) -> RegistryResult<()> {
        let _guard = self.lock.lock().await;
        let records = StudentMapper::to_dto_list(students.to_vec());
        self.write_slot(&records).await?;
        debug!("Cached {} students in {}", records.len(), self.path.display());
        Ok(())
    }

    async fn read_slot(&self) -> RegistryResult<Vec<StudentRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read {}", self.path.display()))
                    .into())
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse local records in {}", self.path.display()))?;
        Ok(records)
    }

    async fn write_slot(&self, records: &[StudentRecord]) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(records).context("Failed to serialize local records")?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    async fn load(&self) -> RegistryResult<Vec<Student>> {
        let records = self.read_slot().await?;
        Ok(StudentMapper::to_domain_list(records)?)
    }

    async fn store(&self, students: Vec<Student>) -> RegistryResult<()> {
        self.write_slot(&StudentMapper::to_dto_list(students)).await
    }
}

fn email_taken(students: &[Student], email: &str, owner_id: Option<&str>) -> bool {
    students
        .iter()
        .any(|s| s.email.eq_ignore_ascii_case(email) && Some(s.id.as_str()) != owner_id)
}

#[async_trait]
impl StudentStorage for LocalSlotStore {
    async fn list_students(&self) -> RegistryResult<Vec<Student>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|s| s.id == student_id))
    }

    async fn create_student(&self, student: &Student) -> RegistryResult<Student> {
        let _guard = self.lock.lock().await;
        let mut students = self.load().await?;

        if email_taken(&students, &student.email, None) {
            warn!("Rejecting duplicate email {} in local slot", student.email);
            return Err(RegistryError::DuplicateEmail {
                email: student.email.clone(),
            });
        }

        students.insert(0, student.clone());
        self.store(students).await?;
        info!("Stored student {} locally", student.id);
        Ok(student.clone())
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> RegistryResult<Student> {
        let _guard = self.lock.lock().await;
        let mut students = self.load().await?;

        if let Some(email) = &patch.email {
            if email_taken(&students, email, Some(student_id)) {
                return Err(RegistryError::DuplicateEmail { email: email.clone() });
            }
        }

        let student = students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| RegistryError::not_found(student_id))?;
        patch.apply(student, Utc::now());
        let updated = student.clone();

        self.store(students).await?;
        Ok(updated)
    }

    async fn update_status(
        &self,
        student_id: &str,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> RegistryResult<Student> {
        let _guard = self.lock.lock().await;
        let mut students = self.load().await?;

        let student = students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| RegistryError::not_found(student_id))?;
        student.status = status;
        student.updated_at = Some(updated_at);
        let updated = student.clone();

        self.store(students).await?;
        Ok(updated)
    }

    async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        let _guard = self.lock.lock().await;
        let mut students = self.load().await?;

        let before = students.len();
        students.retain(|s| s.id != student_id);
        if students.len() == before {
            return Err(RegistryError::not_found(student_id));
        }

        self.store(students).await
    }

    async fn delete_all_students(&self) -> RegistryResult<usize> {
        let _guard = self.lock.lock().await;
        let count = self.load().await?.len();
        self.store(Vec::new()).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::{Gender, RegistrationType, Subject};
    use tempfile::TempDir;

    fn setup_test() -> (TempDir, LocalSlotStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalSlotStore::new(dir.path().join("cache").join("students.json"));
        (dir, store)
    }

    fn student(id: &str, email: &str) -> Student {
        Student {
            id: id.to_string(),
            first_name: "Ruwan".to_string(),
            last_name: "Bandara".to_string(),
            email: email.to_string(),
            mobile: "0701234567".to_string(),
            gender: Gender::Male,
            address: "7 Station Road".to_string(),
            classes: vec![Subject::Physics],
            register_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            registration_fee: 1000,
            registration_type: RegistrationType::Online,
            status: RegistrationStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
            payment_receipt: None,
        }
    }

    #[tokio::test]
    async fn test_missing_slot_reads_as_empty() {
        let (_dir, store) = setup_test();
        assert!(store.list_students().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_persists_newest_first() {
        let (_dir, store) = setup_test();

        store.create_student(&student("S1", "one@example.com")).await.unwrap();
        store.create_student(&student("S2", "two@example.com")).await.unwrap();

        let ids: Vec<String> = store.list_students().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["S2", "S1"]);

        // The file holds plain wire records
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let records: Vec<StudentRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].registration_type, RegistrationType::Online);
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_count_unchanged() {
        let (_dir, store) = setup_test();
        store.create_student(&student("S1", "same@example.com")).await.unwrap();

        let result = store.create_student(&student("S2", "SAME@example.com")).await;

        assert!(matches!(result, Err(RegistryError::DuplicateEmail { .. })));
        assert_eq!(store.list_students().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_status_change() {
        let (_dir, store) = setup_test();
        store.create_student(&student("S1", "one@example.com")).await.unwrap();

        let patch = StudentPatch {
            registration_fee: Some(2000),
            ..Default::default()
        };
        let updated = store.update_student("S1", &patch).await.unwrap();
        assert_eq!(updated.registration_fee, 2000);
        assert!(updated.updated_at.is_some());

        let verified = store
            .update_status("S1", RegistrationStatus::Verified, Utc::now())
            .await
            .unwrap();
        assert!(verified.is_verified());
        assert!(store.get_student("S1").await.unwrap().unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let (_dir, store) = setup_test();

        assert!(store.get_student("nope").await.unwrap().is_none());
        assert!(store.delete_student("nope").await.unwrap_err().is_not_found());
        assert!(store
            .update_student("nope", &StudentPatch::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_replace_all_and_delete_all() {
        let (_dir, store) = setup_test();
        store.create_student(&student("OLD", "old@example.com")).await.unwrap();

        store
            .replace_all(&[student("R1", "r1@example.com"), student("R2", "r2@example.com")])
            .await
            .unwrap();
        let ids: Vec<String> = store.list_students().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["R1", "R2"]);

        assert_eq!(store.delete_all_students().await.unwrap(), 2);
        assert!(store.list_students().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_slot_is_an_error() {
        let (_dir, store) = setup_test();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.list_students().await, Err(RegistryError::Storage(_))));
    }
}
