use tryout_core::model::{BlockResult, PackageId, TryoutAttempt};

use crate::vm::time_fmt::{format_datetime, format_elapsed};
use crate::vm::tryout_vm::finish_reason_label;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRowVm {
    pub block_name: String,
    pub total: u32,
    pub answered: u32,
    pub blank: u32,
    pub doubtful: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl From<&BlockResult> for ResultRowVm {
    fn from(result: &BlockResult) -> Self {
        Self {
            block_name: result.block_name().to_string(),
            total: result.total_questions(),
            answered: result.answered(),
            blank: result.blank(),
            doubtful: result.doubtful(),
            correct: result.correct(),
            incorrect: result.incorrect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultVm {
    pub package_id: PackageId,
    pub rows: Vec<ResultRowVm>,
    pub totals: ResultRowVm,
    pub reason_label: &'static str,
    pub started_at_str: String,
    pub finished_at_str: String,
    pub elapsed_str: String,
    /// Correct answers as a whole percentage of all questions.
    pub score_pct: u32,
}

#[must_use]
pub fn map_result(attempt: &TryoutAttempt) -> ResultVm {
    let rows: Vec<ResultRowVm> = attempt.results().iter().map(ResultRowVm::from).collect();
    let totals = rows.iter().fold(
        ResultRowVm {
            block_name: "Total".to_string(),
            total: 0,
            answered: 0,
            blank: 0,
            doubtful: 0,
            correct: 0,
            incorrect: 0,
        },
        |mut acc, row| {
            acc.total += row.total;
            acc.answered += row.answered;
            acc.blank += row.blank;
            acc.doubtful += row.doubtful;
            acc.correct += row.correct;
            acc.incorrect += row.incorrect;
            acc
        },
    );
    let score_pct = if totals.total == 0 {
        0
    } else {
        totals.correct * 100 / totals.total
    };

    ResultVm {
        package_id: attempt.package_id(),
        rows,
        totals,
        reason_label: finish_reason_label(attempt.reason()),
        started_at_str: format_datetime(attempt.started_at()),
        finished_at_str: format_datetime(attempt.finished_at()),
        elapsed_str: format_elapsed((attempt.finished_at() - attempt.started_at()).num_seconds()),
        score_pct,
    }
}
