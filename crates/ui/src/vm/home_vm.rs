use services::{AttemptListItem, PackageListItem};

use crate::vm::time_fmt::{format_datetime, format_elapsed};
use crate::vm::tryout_vm::finish_reason_label;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageCardVm {
    pub id: u64,
    pub title: String,
    pub summary: String,
}

impl From<&PackageListItem> for PackageCardVm {
    fn from(item: &PackageListItem) -> Self {
        Self {
            id: item.id.value(),
            title: item.title.clone(),
            summary: format!(
                "{} blocks · {} questions · {} min",
                item.block_count, item.total_questions, item.total_minutes
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptCardVm {
    pub id: i64,
    pub finished_at_str: String,
    pub score: String,
    pub detail: String,
}

impl From<&AttemptListItem> for AttemptCardVm {
    fn from(item: &AttemptListItem) -> Self {
        Self {
            id: item.id,
            finished_at_str: format_datetime(item.finished_at),
            score: format!("{} / {}", item.correct, item.total_questions),
            detail: format!(
                "{} · {} · answered {} · doubtful {}",
                finish_reason_label(item.reason),
                format_elapsed(item.elapsed_secs()),
                item.answered,
                item.doubtful
            ),
        }
    }
}

#[must_use]
pub fn map_package_cards(items: &[PackageListItem]) -> Vec<PackageCardVm> {
    items.iter().map(PackageCardVm::from).collect()
}

#[must_use]
pub fn map_attempt_cards(items: &[AttemptListItem]) -> Vec<AttemptCardVm> {
    items.iter().map(AttemptCardVm::from).collect()
}
