use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionIndex;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("question must have at least one correct answer")]
    NoCorrectAnswers,

    #[error("unknown question type: {0}")]
    UnknownType(String),
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// Answer format of a question.
///
/// - `Single`: exactly one presented option is correct, the user picks one.
/// - `Multi`: two or three presented options are correct, the user submits a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multi,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [QuestionType::Single, QuestionType::Multi];

    /// File-name fragment used by the question and progress stores.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multi => "multi",
        }
    }

    /// The other question type.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            QuestionType::Single => QuestionType::Multi,
            QuestionType::Multi => QuestionType::Single,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(QuestionType::Single),
            "multi" => Ok(QuestionType::Multi),
            other => Err(QuestionError::UnknownType(other.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Immutable multiple-choice question.
///
/// Answer lists behave as sets: duplicates are dropped on construction, and an
/// option listed as both correct and wrong is only kept as correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    question: String,
    correct_answers: Vec<String>,
    wrong_options: Vec<String>,
    explanation: String,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyQuestion` for blank question text and
    /// `QuestionError::NoCorrectAnswers` when no non-blank correct answer remains.
    pub fn new(
        question: impl Into<String>,
        correct_answers: impl IntoIterator<Item = String>,
        wrong_options: impl IntoIterator<Item = String>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(QuestionError::EmptyQuestion);
        }

        let correct_answers = dedup_non_blank(correct_answers, &[]);
        if correct_answers.is_empty() {
            return Err(QuestionError::NoCorrectAnswers);
        }
        let wrong_options = dedup_non_blank(wrong_options, &correct_answers);

        Ok(Self {
            question,
            correct_answers,
            wrong_options,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn correct_answers(&self) -> &[String] {
        &self.correct_answers
    }

    #[must_use]
    pub fn wrong_options(&self) -> &[String] {
        &self.wrong_options
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

fn dedup_non_blank(values: impl IntoIterator<Item = String>, exclude: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if value.trim().is_empty() || exclude.contains(&value) || out.contains(&value) {
            continue;
        }
        out.push(value);
    }
    out
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Ordered questions of one chapter and type.
///
/// A slot may be empty when the source record failed validation; the slot keeps
/// its index so progress keys stay aligned with the file, but it is never drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    slots: Vec<Option<Question>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(slots: Vec<Option<Question>>) -> Self {
        Self { slots }
    }

    #[must_use]
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            slots: questions.into_iter().map(Some).collect(),
        }
    }

    /// Number of slots, including invalid ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: QuestionIndex) -> Option<&Question> {
        self.slots.get(index.value()).and_then(Option::as_ref)
    }

    /// Every slot index, valid or not.
    pub fn all_indices(&self) -> impl Iterator<Item = QuestionIndex> + '_ {
        (0..self.slots.len()).map(QuestionIndex::new)
    }

    /// Indices and questions of valid slots, in file order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionIndex, &Question)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|q| (QuestionIndex::new(i), q)))
    }

    /// Number of questions that can actually be drawn.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
