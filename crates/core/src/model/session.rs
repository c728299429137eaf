use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{ChapterKey, Question, QuestionIndex, QuestionType, StudyMode};

/// One question instance inside a round's batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnQuestion {
    pub question_type: QuestionType,
    pub index: QuestionIndex,
    pub question: Question,
}

impl DrawnQuestion {
    #[must_use]
    pub fn new(question_type: QuestionType, index: QuestionIndex, question: Question) -> Self {
        Self {
            question_type,
            index,
            question,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoundSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// Aggregate summary for a finished round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    chapter: ChapterKey,
    mode: StudyMode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    batch_size: u32,
    passes: u32,
    answers: u32,
    correct: u32,
    incorrect: u32,
    mastered: u32,
}

/// Raw counters gathered while a round runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundCounts {
    pub batch_size: u32,
    pub passes: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub mastered: u32,
}

impl RoundSummary {
    /// Build a summary from round counters.
    ///
    /// # Errors
    ///
    /// Returns `RoundSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn new(
        chapter: ChapterKey,
        mode: StudyMode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        counts: RoundCounts,
    ) -> Result<Self, RoundSummaryError> {
        if completed_at < started_at {
            return Err(RoundSummaryError::InvalidTimeRange);
        }
        Ok(Self {
            chapter,
            mode,
            started_at,
            completed_at,
            batch_size: counts.batch_size,
            passes: counts.passes,
            answers: counts.correct.saturating_add(counts.incorrect),
            correct: counts.correct,
            incorrect: counts.incorrect,
            mastered: counts.mastered,
        })
    }

    #[must_use]
    pub fn chapter(&self) -> &ChapterKey {
        &self.chapter
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    #[must_use]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    #[must_use]
    pub fn answers(&self) -> u32 {
        self.answers
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    /// Batch questions at mastery when the round ended.
    #[must_use]
    pub fn mastered(&self) -> u32 {
        self.mastered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn chapter() -> ChapterKey {
        ChapterKey::new("basics").unwrap()
    }

    #[test]
    fn summary_totals_answers() {
        let now = fixed_now();
        let counts = RoundCounts {
            batch_size: 3,
            passes: 2,
            correct: 5,
            incorrect: 1,
            mastered: 2,
        };
        let summary = RoundSummary::new(chapter(), StudyMode::LearnNew, now, now, counts).unwrap();

        assert_eq!(summary.answers(), 6);
        assert_eq!(summary.passes(), 2);
        assert_eq!(summary.mastered(), 2);
    }

    #[test]
    fn summary_rejects_inverted_time_range() {
        let now = fixed_now();
        let err = RoundSummary::new(
            chapter(),
            StudyMode::ReviewOld,
            now,
            now - chrono::Duration::seconds(1),
            RoundCounts::default(),
        )
        .unwrap_err();
        assert_eq!(err, RoundSummaryError::InvalidTimeRange);
    }
}
