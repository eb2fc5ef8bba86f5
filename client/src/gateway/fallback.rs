//! Remote-first record store that degrades to the local slot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use registry_backend::domain::models::{Student, StudentPatch};
use registry_backend::domain::{RegistryError, RegistryResult};
use registry_backend::storage::StudentStorage;
use shared::RegistrationStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::gateway::local::LocalSlotStore;

pub const OFFLINE_WARNING: &str = "Record store unreachable; working with local data only";

/// Runs every operation against the remote store first. When the remote is
/// unreachable the same operation runs against the local slot and the
/// gateway is marked degraded until a remote call succeeds again.
///
/// Writes made while degraded stay in the local slot; they are not replayed
/// against the remote store.
pub struct FallbackStudentStore {
    remote: Arc<dyn StudentStorage>,
    local: Arc<LocalSlotStore>,
    degraded: AtomicBool,
}

impl FallbackStudentStore {
    pub fn new(remote: Arc<dyn StudentStorage>, local: Arc<LocalSlotStore>) -> Self {
        Self {
            remote,
            local,
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the last operation was served from the local slot
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Warning to show while degraded
    pub fn status_warning(&self) -> Option<&'static str> {
        self.is_degraded().then_some(OFFLINE_WARNING)
    }

    fn remote_ok(&self) {
        if self.degraded.swap(false, Ordering::SeqCst) {
            info!("Record store reachable again");
        }
    }

    /// Decide whether `err` should be retried locally
    fn should_fall_back(&self, operation: &str, err: &RegistryError) -> bool {
        if !err.is_unavailable() {
            return false;
        }
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!("⚠️ {}: {}", OFFLINE_WARNING, err);
        }
        warn!("Serving {} from local slot {}", operation, self.local.path().display());
        true
    }
}

#[async_trait]
impl StudentStorage for FallbackStudentStore {
    async fn list_students(&self) -> RegistryResult<Vec<Student>> {
        match self.remote.list_students().await {
            Ok(students) => {
                self.remote_ok();
                if let Err(e) = self.local.replace_all(&students).await {
                    warn!("Failed to refresh local slot: {}", e);
                }
                Ok(students)
            }
            Err(e) if self.should_fall_back("list", &e) => self.local.list_students().await,
            Err(e) => Err(e),
        }
    }

    async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>> {
        match self.remote.get_student(student_id).await {
            Ok(student) => {
                self.remote_ok();
                Ok(student)
            }
            Err(e) if self.should_fall_back("get", &e) => self.local.get_student(student_id).await,
            Err(e) => Err(e),
        }
    }

    async fn create_student(&self, student: &Student) -> RegistryResult<Student> {
        match self.remote.create_student(student).await {
            Ok(stored) => {
                self.remote_ok();
                Ok(stored)
            }
            Err(e) if self.should_fall_back("create", &e) => self.local.create_student(student).await,
            Err(e) => Err(e),
        }
    }

    async fn update_student(&self, student_id: &str, patch: &StudentPatch) -> RegistryResult<Student> {
        match self.remote.update_student(student_id, patch).await {
            Ok(updated) => {
                self.remote_ok();
                Ok(updated)
            }
            Err(e) if self.should_fall_back("update", &e) => self.local.update_student(student_id, patch).await,
            Err(e) => Err(e),
        }
    }

    async fn update_status(
        &self,
        student_id: &str,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> RegistryResult<Student> {
        match self.remote.update_status(student_id, status, updated_at).await {
            Ok(updated) => {
                self.remote_ok();
                Ok(updated)
            }
            Err(e) if self.should_fall_back("update_status", &e) => {
                self.local.update_status(student_id, status, updated_at).await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
        match self.remote.delete_student(student_id).await {
            Ok(()) => {
                self.remote_ok();
                Ok(())
            }
            Err(e) if self.should_fall_back("delete", &e) => self.local.delete_student(student_id).await,
            Err(e) => Err(e),
        }
    }

    async fn delete_all_students(&self) -> RegistryResult<usize> {
        match self.remote.delete_all_students().await {
            Ok(count) => {
                self.remote_ok();
                Ok(count)
            }
            Err(e) if self.should_fall_back("delete_all", &e) => self.local.delete_all_students().await,
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::{Gender, RegistrationType, Subject};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory remote that can be switched off
    #[derive(Default)]
    struct FlakyRemote {
        students: Mutex<Vec<Student>>,
        offline: AtomicBool,
    }

    impl FlakyRemote {
        fn check(&self) -> RegistryResult<()> {
            if self.offline.load(Ordering::SeqCst) {
                Err(RegistryError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl StudentStorage for FlakyRemote {
        async fn list_students(&self) -> RegistryResult<Vec<Student>> {
            self.check()?;
            Ok(self.students.lock().unwrap().clone())
        }

        async fn get_student(&self, student_id: &str) -> RegistryResult<Option<Student>> {
            self.check()?;
            Ok(self.students.lock().unwrap().iter().find(|s| s.id == student_id).cloned())
        }

        async fn create_student(&self, student: &Student) -> RegistryResult<Student> {
            self.check()?;
            let mut students = self.students.lock().unwrap();
            if students.iter().any(|s| s.email == student.email) {
                return Err(RegistryError::DuplicateEmail {
                    email: student.email.clone(),
                });
            }
            students.insert(0, student.clone());
            Ok(student.clone())
        }

        async fn update_student(&self, student_id: &str, _patch: &StudentPatch) -> RegistryResult<Student> {
            self.check()?;
            Err(RegistryError::not_found(student_id))
        }

        async fn update_status(
            &self,
            student_id: &str,
            _status: RegistrationStatus,
            _updated_at: DateTime<Utc>,
        ) -> RegistryResult<Student> {
            self.check()?;
            Err(RegistryError::not_found(student_id))
        }

        async fn delete_student(&self, student_id: &str) -> RegistryResult<()> {
            self.check()?;
            Err(RegistryError::not_found(student_id))
        }

        async fn delete_all_students(&self) -> RegistryResult<usize> {
            self.check()?;
            let mut students = self.students.lock().unwrap();
            let count = students.len();
            students.clear();
            Ok(count)
        }
    }

    fn student(id: &str, email: &str) -> Student {
        Student {
            id: id.to_string(),
            first_name: "Tharindu".to_string(),
            last_name: "Wickrama".to_string(),
            email: email.to_string(),
            mobile: "0751234567".to_string(),
            gender: Gender::Male,
            address: "3 Beach Road".to_string(),
            classes: vec![Subject::CombinedMaths],
            register_date: NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
            registration_fee: 1000,
            registration_type: RegistrationType::Manual,
            status: RegistrationStatus::Verified,
            created_at: Utc::now(),
            updated_at: None,
            payment_receipt: None,
        }
    }

    fn setup_test() -> (TempDir, Arc<FlakyRemote>, Arc<LocalSlotStore>, FallbackStudentStore) {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let local = Arc::new(LocalSlotStore::new(dir.path().join("students.json")));
        let gateway = FallbackStudentStore::new(remote.clone(), local.clone());
        (dir, remote, local, gateway)
    }

    #[tokio::test]
    async fn test_successful_list_replaces_local_slot() {
        let (_dir, remote, local, gateway) = setup_test();
        local.create_student(&student("STALE", "stale@example.com")).await.unwrap();
        remote.students.lock().unwrap().push(student("R1", "r1@example.com"));

        let listed = gateway.list_students().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert!(!gateway.is_degraded());
        let cached: Vec<String> = local.list_students().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(cached, vec!["R1"]);
    }

    #[tokio::test]
    async fn test_unreachable_remote_falls_back_to_local() {
        let (_dir, remote, _local, gateway) = setup_test();
        remote.students.lock().unwrap().push(student("R1", "r1@example.com"));
        gateway.list_students().await.unwrap();

        remote.offline.store(true, Ordering::SeqCst);
        let listed = gateway.list_students().await.unwrap();

        assert_eq!(listed[0].id, "R1");
        assert!(gateway.is_degraded());
        assert_eq!(gateway.status_warning(), Some(OFFLINE_WARNING));

        // Writes while degraded land in the local slot only
        gateway.create_student(&student("L1", "l1@example.com")).await.unwrap();
        assert_eq!(gateway.list_students().await.unwrap().len(), 2);
        assert_eq!(remote.students.lock().unwrap().len(), 1);

        remote.offline.store(false, Ordering::SeqCst);
        assert_eq!(gateway.list_students().await.unwrap().len(), 1);
        assert!(!gateway.is_degraded());
    }

    #[tokio::test]
    async fn test_domain_errors_do_not_fall_back() {
        let (_dir, remote, local, gateway) = setup_test();
        remote.students.lock().unwrap().push(student("R1", "taken@example.com"));

        let duplicate = gateway.create_student(&student("R2", "taken@example.com")).await;
        assert!(matches!(duplicate, Err(RegistryError::DuplicateEmail { .. })));

        let missing = gateway.delete_student("nope").await;
        assert!(missing.unwrap_err().is_not_found());

        assert!(!gateway.is_degraded());
        assert!(local.list_students().await.unwrap().is_empty());
    }
}
