use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog::PackageCatalogService;
use crate::error::AppServicesError;
use crate::history::AttemptHistoryService;
use crate::import::PackageImportService;
use crate::tryout::TryoutLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<PackageCatalogService>,
    history: Arc<AttemptHistoryService>,
    tryout_loop: Arc<TryoutLoopService>,
    import: Arc<PackageImportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            catalog: Arc::new(PackageCatalogService::new(Arc::clone(&storage.packages))),
            history: Arc::new(AttemptHistoryService::new(Arc::clone(&storage.attempts))),
            tryout_loop: Arc::new(TryoutLoopService::new(
                clock,
                Arc::clone(&storage.packages),
                Arc::clone(&storage.questions),
                Arc::clone(&storage.attempts),
            )),
            import: Arc::new(PackageImportService::new(
                Arc::clone(&storage.packages),
                Arc::clone(&storage.questions),
            )),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<PackageCatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn tryout_loop(&self) -> Arc<TryoutLoopService> {
        Arc::clone(&self.tryout_loop)
    }

    #[must_use]
    pub fn import(&self) -> Arc<PackageImportService> {
        Arc::clone(&self.import)
    }
}
