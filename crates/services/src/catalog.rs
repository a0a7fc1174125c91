use std::sync::Arc;

use storage::repository::{PackageRepository, StorageError};
use tryout_core::model::{PackageId, TryoutPackage};

use crate::error::TryoutError;

/// Package summary for pickers and the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageListItem {
    pub id: PackageId,
    pub title: String,
    pub block_count: usize,
    pub total_questions: usize,
    pub total_minutes: u32,
}

impl PackageListItem {
    #[must_use]
    pub fn from_package(package: &TryoutPackage) -> Self {
        Self {
            id: package.id(),
            title: package.title().to_owned(),
            block_count: package.block_count(),
            total_questions: package.total_questions(),
            total_minutes: package.total_minutes(),
        }
    }
}

/// Read access to stored tryout packages.
#[derive(Clone)]
pub struct PackageCatalogService {
    packages: Arc<dyn PackageRepository>,
}

impl PackageCatalogService {
    #[must_use]
    pub fn new(packages: Arc<dyn PackageRepository>) -> Self {
        Self { packages }
    }

    /// # Errors
    ///
    /// Returns `TryoutError::Storage` on repository failures.
    pub async fn list_packages(&self, limit: u32) -> Result<Vec<PackageListItem>, TryoutError> {
        let packages = self.packages.list_packages(limit).await?;
        Ok(packages.iter().map(PackageListItem::from_package).collect())
    }

    /// # Errors
    ///
    /// Returns `TryoutError::Storage(StorageError::NotFound)` for unknown ids.
    pub async fn get_package(&self, id: PackageId) -> Result<TryoutPackage, TryoutError> {
        Ok(self
            .packages
            .get_package(id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }
}
