use std::sync::Arc;

use dioxus::prelude::*;
use storage::repository::{AttemptId, AttemptRepository, AttemptRow, StorageError};
use tryout_core::model::{OptionId, PackageId, QuestionId, TryoutAttempt};

use super::ResultTable;
use super::test_harness::{ViewKind, setup_view_harness, setup_view_harness_with_attempt_repo};
use crate::vm::ResultRowVm;

fn row(name: &str, total: u32, correct: u32) -> ResultRowVm {
    ResultRowVm {
        block_name: name.to_string(),
        total,
        answered: correct,
        blank: total - correct,
        doubtful: 0,
        correct,
        incorrect: 0,
    }
}

#[test]
fn result_table_renders_rows_and_totals() {
    let html = dioxus_ssr::render_element(rsx! {
        ResultTable {
            rows: vec![row("Penalaran Umum", 20, 12), row("Literasi", 10, 7)],
            totals: row("Total", 30, 19),
        }
    });
    assert!(html.contains("Penalaran Umum"), "missing block row in {html}");
    assert!(html.contains("Literasi"), "missing block row in {html}");
    assert!(html.contains("<tfoot>"), "missing totals footer in {html}");
    assert!(html.contains(">19<"), "missing total correct in {html}");
}

/// Runs a tryout on the seeded package, answering the first question
/// correctly, and returns the stored attempt id.
async fn finished_attempt(services: &services::AppServices) -> AttemptId {
    let tryout_loop = services.tryout_loop();
    let run = tryout_loop
        .start_tryout(PackageId::new(1))
        .await
        .expect("start tryout");
    assert!(run.select_answer(QuestionId::new(101), OptionId::new(1)));
    tryout_loop.finish(&run).await.expect("finish tryout")
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_lists_packages_and_attempts() {
    let mut harness = setup_view_harness(ViewKind::Home).await;
    finished_attempt(&harness.services).await;

    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Tryout SNBT #1"), "missing package in {html}");
    assert!(
        html.contains("2 blocks · 3 questions · 25 min"),
        "missing package summary in {html}"
    );
    assert!(html.contains("1 / 3"), "missing attempt score in {html}");
    assert!(html.contains("Start"), "missing start link in {html}");
}

struct FailingAttempts;

#[async_trait::async_trait]
impl AttemptRepository for FailingAttempts {
    async fn append_attempt(&self, _attempt: &TryoutAttempt) -> Result<AttemptId, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn get_attempt(&self, _id: AttemptId) -> Result<TryoutAttempt, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn list_attempts(
        &self,
        _package_id: PackageId,
        _limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_error_state() {
    let mut harness =
        setup_view_harness_with_attempt_repo(ViewKind::Home, Arc::new(FailingAttempts)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn result_view_smoke_renders_details() {
    let mut harness = setup_view_harness(ViewKind::Result(1)).await;
    assert_eq!(finished_attempt(&harness.services).await, 1);

    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Tryout Result"), "missing title in {html}");
    assert!(html.contains("Penalaran Umum"), "missing block row in {html}");
    assert!(html.contains("Pengetahuan Kuantitatif"), "missing block row in {html}");
    assert!(html.contains("Finished"), "missing reason in {html}");
    assert!(html.contains("Try again"), "missing retry link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn result_view_smoke_unknown_attempt() {
    let mut harness = setup_view_harness(ViewKind::Result(404)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Not found."), "missing not found in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn tryout_view_smoke_renders_first_question() {
    let mut harness = setup_view_harness(ViewKind::Tryout(1)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Block 1 of 2"), "missing block label in {html}");
    assert!(html.contains("Penalaran Umum"), "missing block name in {html}");
    assert!(html.contains("10:00"), "missing countdown in {html}");
    assert!(html.contains("Semua kucing"), "missing question text in {html}");
    assert!(html.contains("Question 1 of 2"), "missing question label in {html}");
    assert!(html.contains("Submit block"), "missing submit in {html}");
    assert!(html.contains("Finish tryout"), "missing finish in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn tryout_view_smoke_unknown_package() {
    let mut harness = setup_view_harness(ViewKind::Tryout(99)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Not found."), "missing not found in {html}");
    assert!(html.contains("Back to home"), "missing home link in {html}");
}
