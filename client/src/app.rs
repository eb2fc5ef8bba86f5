//! Client application state: the gateway, the roster and the domain
//! services running on top of them.

use chrono::Utc;
use log::{info, warn};
use registry_backend::domain::models::Student;
use registry_backend::domain::{
    AnalyticsService, ExportService, FinanceService, RegistrationFormService, RegistryError, RegistryResult,
    StudentFilter, StudentService, StudentTableService, VerificationAction, VerificationService,
};
use registry_backend::storage::StudentStorage;
use shared::{DeleteStudentsResponse, ExportKind, FinanceReport, StudentOverview, StudentTableResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::gateway::{FallbackStudentStore, HttpStudentStore, LocalSlotStore};
use crate::refresh::{RefreshConfig, Roster};
use crate::services::api::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

pub const DEFAULT_CACHE_PATH: &str = "registry-cache.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_url: String,
    /// Local fallback slot
    pub cache_path: PathBuf,
    pub timeout: Duration,
    pub refresh: RefreshConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            timeout: DEFAULT_TIMEOUT,
            refresh: RefreshConfig::default(),
        }
    }
}

/// Everything the command line needs, wired over the fallback gateway.
/// Reports are computed from the roster so they keep working offline.
#[derive(Clone)]
pub struct RegistryClient {
    pub api: ApiClient,
    pub gateway: Arc<FallbackStudentStore>,
    pub roster: Roster,
    pub student_service: StudentService,
    pub verification_service: VerificationService,
    finance_service: FinanceService,
    analytics_service: AnalyticsService,
    export_service: ExportService,
    table_service: StudentTableService,
}

impl RegistryClient {
    pub fn connect(settings: &ClientSettings) -> RegistryResult<Self> {
        info!(
            "Using record store {} with local slot {}",
            settings.api_url,
            settings.cache_path.display()
        );

        let api = ApiClient::with_base_url(&settings.api_url, settings.timeout)?;
        let remote: Arc<dyn StudentStorage> = Arc::new(HttpStudentStore::new(api.clone()));
        let local = Arc::new(LocalSlotStore::new(settings.cache_path.clone()));
        let gateway = Arc::new(FallbackStudentStore::new(remote, local));

        Ok(Self::with_gateway(api, gateway))
    }

    pub fn with_gateway(api: ApiClient, gateway: Arc<FallbackStudentStore>) -> Self {
        let storage: Arc<dyn StudentStorage> = gateway.clone();

        Self {
            api,
            gateway,
            roster: Roster::new(storage.clone()),
            student_service: StudentService::new(storage.clone(), RegistrationFormService::new()),
            verification_service: VerificationService::new(storage),
            finance_service: FinanceService::new(),
            analytics_service: AnalyticsService::new(),
            export_service: ExportService::new(),
            table_service: StudentTableService::new(),
        }
    }

    /// Warning to show while the gateway serves local data
    pub fn offline_warning(&self) -> Option<&'static str> {
        self.gateway.status_warning()
    }

    /// Reload the roster through the gateway
    pub async fn load(&self) -> RegistryResult<usize> {
        self.roster.refresh().await
    }

    /// Roster records matching `filter`, newest first
    pub async fn students(&self, filter: &StudentFilter) -> Vec<Student> {
        filter.apply(&self.roster.snapshot().await)
    }

    pub async fn student_table(&self, filter: &StudentFilter, page: usize, per_page: Option<usize>) -> StudentTableResponse {
        let students = self.students(filter).await;
        self.table_service.build_table(&students, page, per_page)
    }

    pub async fn finance_report(&self, filter: &StudentFilter) -> FinanceReport {
        let students = self.students(filter).await;
        self.finance_service.build_report(&students, Utc::now().date_naive())
    }

    pub async fn overview(&self) -> StudentOverview {
        let students = self.roster.snapshot().await;
        self.analytics_service.overview(&students, Utc::now().date_naive())
    }

    /// Write a report over the matching records into `directory`
    pub async fn export(&self, kind: ExportKind, filter: &StudentFilter, directory: &Path) -> RegistryResult<PathBuf> {
        let students = self.students(filter).await;
        let export = self
            .export_service
            .export_students(&students, kind, Utc::now().date_naive())?;
        Ok(self.export_service.export_to_directory(&export, directory)?)
    }

    pub async fn pending(&self) -> Vec<Student> {
        self.roster
            .snapshot()
            .await
            .into_iter()
            .filter(|s| s.needs_verification())
            .collect()
    }

    /// Apply a verification decision, then reload the roster
    pub async fn decide(&self, student_id: &str, action: VerificationAction) -> RegistryResult<Student> {
        let student = self.verification_service.apply(student_id, action).await?;
        self.reload_after_write().await;
        Ok(student)
    }

    pub async fn delete(&self, student_ids: &[String]) -> RegistryResult<DeleteStudentsResponse> {
        let response = self.student_service.delete_students(student_ids).await?;
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn delete_all(&self) -> RegistryResult<usize> {
        let deleted = self.student_service.delete_all_students().await?;
        self.reload_after_write().await;
        Ok(deleted)
    }

    async fn reload_after_write(&self) {
        if let Err(e) = self.roster.refresh().await {
            warn!("Failed to reload roster: {}", e);
        }
    }
}

/// Turn an error into the one-line message the command line prints
pub fn describe_error(err: &RegistryError) -> String {
    match err {
        RegistryError::Validation(errors) => errors
            .iter()
            .map(|e| format!("  {}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("\n"),
        RegistryError::Storage(e) => format!("{:#}", e),
        other => other.to_string(),
    }
}
