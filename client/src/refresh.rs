//! Owned in-memory roster with periodic refresh.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use registry_backend::domain::models::Student;
use registry_backend::domain::RegistryResult;
use registry_backend::storage::StudentStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Configuration for periodic refresh behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    pub interval: Duration,
    /// Wait before the first load
    pub initial_delay: Option<Duration>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial_delay: None,
        }
    }
}

/// The client's current view of every student, newest first.
///
/// Each successful load replaces the whole list; a failed load keeps the
/// previous one.
#[derive(Clone)]
pub struct Roster {
    store: Arc<dyn StudentStorage>,
    students: Arc<RwLock<Vec<Student>>>,
    last_refreshed: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl Roster {
    pub fn new(store: Arc<dyn StudentStorage>) -> Self {
        Self {
            store,
            students: Arc::new(RwLock::new(Vec::new())),
            last_refreshed: Arc::new(RwLock::new(None)),
        }
    }

    /// Reload from the store, returning the new record count
    pub async fn refresh(&self) -> RegistryResult<usize> {
        let loaded = self.store.list_students().await?;
        let count = loaded.len();

        *self.students.write().await = loaded;
        *self.last_refreshed.write().await = Some(Utc::now());

        debug!("Roster refreshed with {} students", count);
        Ok(count)
    }

    pub async fn snapshot(&self) -> Vec<Student> {
        self.students.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.students.read().await.len()
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.read().await
    }

    /// Refresh on a fixed interval until the returned handle is aborted
    pub fn spawn_periodic_refresh(&self, config: RefreshConfig) -> JoinHandle<()> {
        let roster = self.clone();
        info!("Starting periodic refresh every {:?}", config.interval);

        tokio::spawn(async move {
            if let Some(delay) = config.initial_delay {
                tokio::time::sleep(delay).await;
            }

            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = roster.refresh().await {
                    warn!("Periodic refresh failed: {}", e);
                }
            }
        })
    }
}
