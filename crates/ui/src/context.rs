use std::sync::Arc;

use services::{AttemptHistoryService, PackageCatalogService, TryoutLoopService};
use tryout_core::model::PackageId;

pub trait UiApp: Send + Sync {
    /// Package offered first on the home screen.
    fn default_package_id(&self) -> PackageId;

    fn catalog(&self) -> Arc<PackageCatalogService>;
    fn history(&self) -> Arc<AttemptHistoryService>;
    fn tryout_loop(&self) -> Arc<TryoutLoopService>;
}

#[derive(Clone)]
pub struct AppContext {
    default_package_id: PackageId,
    catalog: Arc<PackageCatalogService>,
    history: Arc<AttemptHistoryService>,
    tryout_loop: Arc<TryoutLoopService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            default_package_id: app.default_package_id(),
            catalog: app.catalog(),
            history: app.history(),
            tryout_loop: app.tryout_loop(),
        }
    }

    #[must_use]
    pub fn default_package_id(&self) -> PackageId {
        self.default_package_id
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
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
