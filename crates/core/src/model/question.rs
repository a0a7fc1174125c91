use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("duplicate option id: {0}")]
    DuplicateOption(OptionId),

    #[error("correct option {0} is not one of the question's options")]
    UnknownCorrectOption(OptionId),
}

/// One selectable choice of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: OptionId,
    pub label: String,
    pub text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Multiple-choice question from the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
    correct_option: OptionId,
    explanation: Option<String>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, fewer than two options are
    /// given, option ids repeat, or the correct option is not listed.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct_option: OptionId,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.id) {
                return Err(QuestionError::DuplicateOption(option.id));
            }
        }
        if !seen.contains(&correct_option) {
            return Err(QuestionError::UnknownCorrectOption(correct_option));
        }

        Ok(Self {
            id,
            text,
            options,
            correct_option,
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionId {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

/// Correct option per question, taken from the question bank.
///
/// Scoring always goes through this map; a question missing from it cannot be
/// graded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    correct: HashMap<QuestionId, OptionId>,
}

impl AnswerKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_questions<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        let correct = questions
            .into_iter()
            .map(|q| (q.id(), q.correct_option()))
            .collect();
        Self { correct }
    }

    pub fn insert(&mut self, question_id: QuestionId, correct: OptionId) {
        self.correct.insert(question_id, correct);
    }

    #[must_use]
    pub fn correct_option(&self, question_id: QuestionId) -> Option<OptionId> {
        self.correct.get(&question_id).copied()
    }

    /// `Some(true)` if `selected` is the right answer, `None` if ungradable.
    #[must_use]
    pub fn grade(&self, question_id: QuestionId, selected: OptionId) -> Option<bool> {
        self.correct_option(question_id).map(|c| c == selected)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.correct.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty()
    }
}
