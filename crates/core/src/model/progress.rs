use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionIndex;

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

/// Consecutive correct learn-mode answers for one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Streak(u32);

impl Streak {
    /// Streak at which a question counts as mastered.
    pub const MASTERY_THRESHOLD: u32 = 2;

    pub const ZERO: Streak = Streak(0);

    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_mastered(self) -> bool {
        self.0 >= Self::MASTERY_THRESHOLD
    }

    /// Streak after a learn-mode answer: +1 when correct, back to zero otherwise.
    #[must_use]
    pub fn after_answer(self, correct: bool) -> Self {
        if correct {
            Self(self.0.saturating_add(1))
        } else {
            Self::ZERO
        }
    }
}

impl fmt::Display for Streak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── STUDY MODE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown study mode: {0}")]
pub struct UnknownModeError(pub String);

/// Which questions a round practices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    /// Unmastered questions; answers update streaks; passes repeat until mastered.
    LearnNew,
    /// Mastered questions; answers never touch streaks; one pass.
    ReviewOld,
}

impl StudyMode {
    /// Eligibility predicate applied to a question's stored streak.
    #[must_use]
    pub fn admits(self, streak: Streak) -> bool {
        match self {
            StudyMode::LearnNew => !streak.is_mastered(),
            StudyMode::ReviewOld => streak.is_mastered(),
        }
    }

    /// Whether answers in this mode are written back to the progress store.
    #[must_use]
    pub fn records_progress(self) -> bool {
        matches!(self, StudyMode::LearnNew)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StudyMode::LearnNew => "learn_new",
            StudyMode::ReviewOld => "review_old",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "learn_new" | "learn" => Ok(StudyMode::LearnNew),
            "review_old" | "review" => Ok(StudyMode::ReviewOld),
            other => Err(UnknownModeError(other.to_owned())),
        }
    }
}

//
// ─── PROGRESS MAP ──────────────────────────────────────────────────────────────
//

/// Streaks for one chapter and question type, keyed by question index.
///
/// Missing keys read as a zero streak. The map is always persisted whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap {
    streaks: BTreeMap<QuestionIndex, Streak>,
}

impl ProgressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress map with a zero streak for every given index.
    #[must_use]
    pub fn zeroed(indices: impl IntoIterator<Item = QuestionIndex>) -> Self {
        Self {
            streaks: indices.into_iter().map(|i| (i, Streak::ZERO)).collect(),
        }
    }

    #[must_use]
    pub fn streak(&self, index: QuestionIndex) -> Streak {
        self.streaks.get(&index).copied().unwrap_or_default()
    }

    pub fn set(&mut self, index: QuestionIndex, streak: Streak) {
        self.streaks.insert(index, streak);
    }

    /// Apply a learn-mode answer and return the new streak.
    pub fn record_answer(&mut self, index: QuestionIndex, correct: bool) -> Streak {
        let next = self.streak(index).after_answer(correct);
        self.set(index, next);
        next
    }

    #[must_use]
    pub fn is_mastered(&self, index: QuestionIndex) -> bool {
        self.streak(index).is_mastered()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionIndex, Streak)> + '_ {
        self.streaks.iter().map(|(i, s)| (*i, *s))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streaks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }
}

impl FromIterator<(QuestionIndex, Streak)> for ProgressMap {
    fn from_iter<T: IntoIterator<Item = (QuestionIndex, Streak)>>(iter: T) -> Self {
        Self {
            streaks: iter.into_iter().collect(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
