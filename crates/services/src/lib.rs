#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod history;
pub mod import;
pub mod tryout;

pub use tryout_core::Clock;

pub use app_services::AppServices;
pub use catalog::{PackageCatalogService, PackageListItem};
pub use error::{AppServicesError, ImportError, TryoutError};
pub use history::{AttemptHistoryService, AttemptListItem};
pub use import::{ImportReport, PackageDocument, PackageImportService};
pub use tryout::{CountdownHandle, TryoutLoopService, TryoutRun};
