use tryout_core::PlayerSnapshot;
use tryout_core::model::{AnswerStatus, FinishReason, OptionId, Question, QuestionId};

use crate::vm::time_fmt::format_countdown;

/// Below this many seconds the countdown is rendered as urgent.
pub const LOW_TIME_SECS: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeKind {
    Blank,
    Answered,
    Doubtful,
}

impl BadgeKind {
    #[must_use]
    pub fn from_status(status: AnswerStatus) -> Self {
        match status {
            AnswerStatus::Unanswered => Self::Blank,
            AnswerStatus::Answered => Self::Answered,
            AnswerStatus::Doubtful => Self::Doubtful,
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Blank => "badge blank",
            Self::Answered => "badge answered",
            Self::Doubtful => "badge doubtful",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadgeVm {
    pub index: usize,
    pub number: usize,
    pub kind: BadgeKind,
    pub is_current: bool,
}

impl BadgeVm {
    #[must_use]
    pub fn class(&self) -> String {
        if self.is_current {
            format!("{} current", self.kind.css_class())
        } else {
            self.kind.css_class().to_string()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub id: OptionId,
    pub label: String,
    pub text: String,
    pub is_selected: bool,
}

/// Render-ready tryout screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryoutVm {
    pub title: String,
    pub block_label: String,
    pub block_name: String,
    pub countdown: String,
    pub is_low_time: bool,
    pub question_id: Option<QuestionId>,
    pub question_label: String,
    /// `None` when the question bank lacks the current question.
    pub question_text: Option<String>,
    pub options: Vec<OptionVm>,
    pub is_doubtful: bool,
    pub badges: Vec<BadgeVm>,
    pub can_previous: bool,
    pub can_next: bool,
    pub block_index: Option<usize>,
    pub submit_label: &'static str,
    pub is_last_block: bool,
    pub finish_label: Option<&'static str>,
    /// `false` before start and after finish: every handler is a no-op.
    pub controls_enabled: bool,
}

impl TryoutVm {
    #[must_use]
    pub fn from_snapshot(snapshot: &PlayerSnapshot, question: Option<&Question>) -> Self {
        let total_in_block = snapshot.badges.len();
        let block_label = snapshot.block_index.map_or_else(String::new, |i| {
            format!("Block {} of {}", i + 1, snapshot.block_count)
        });
        let question_label = if total_in_block == 0 {
            "No questions in this block".to_string()
        } else {
            format!(
                "Question {} of {}",
                snapshot.question_index + 1,
                total_in_block
            )
        };
        let question = question.filter(|q| Some(q.id()) == snapshot.current_question);
        let options = question.map_or_else(Vec::new, |q| {
            q.options()
                .iter()
                .map(|o| OptionVm {
                    id: o.id,
                    label: o.label.clone(),
                    text: o.text.clone(),
                    is_selected: snapshot.selected_option == Some(o.id),
                })
                .collect()
        });
        let badges = snapshot
            .badges
            .iter()
            .map(|b| BadgeVm {
                index: b.index,
                number: b.index + 1,
                kind: BadgeKind::from_status(b.status),
                is_current: b.is_current,
            })
            .collect();
        let controls_enabled = snapshot.is_started && !snapshot.is_finished();

        Self {
            title: snapshot.title.clone(),
            block_label,
            block_name: snapshot.block_name.clone().unwrap_or_default(),
            countdown: format_countdown(snapshot.remaining_secs),
            is_low_time: controls_enabled && snapshot.remaining_secs < LOW_TIME_SECS,
            question_id: snapshot.current_question,
            question_label,
            question_text: question.map(|q| q.text().to_string()),
            options,
            is_doubtful: snapshot.current_status == AnswerStatus::Doubtful,
            badges,
            can_previous: controls_enabled && snapshot.question_index > 0,
            can_next: controls_enabled && snapshot.question_index + 1 < total_in_block,
            block_index: snapshot.block_index,
            submit_label: if snapshot.is_last_block() {
                "Finish tryout"
            } else {
                "Submit block"
            },
            is_last_block: snapshot.is_last_block(),
            finish_label: snapshot.finish_reason.map(finish_reason_label),
            controls_enabled,
        }
    }
}

#[must_use]
pub fn finish_reason_label(reason: FinishReason) -> &'static str {
    match reason {
        FinishReason::Manual => "Finished",
        FinishReason::TimeUp => "Time is up",
    }
}
