use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use std::fmt;

use quiz_core::grading::{self, Selection};
use quiz_core::model::{ChapterKey, DrawnQuestion, RoundCounts, RoundSummary, StudyMode};
use quiz_core::options::{self, PresentedOptions};

use crate::error::SessionError;
use super::view::{ReportEntry, ReportOption, RoundReport};

//
// ─── ITEM STATE ────────────────────────────────────────────────────────────────
//

/// Per-item state, reset whenever the item enters a new pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct ItemState {
    options: Option<PresentedOptions>,
    selection: Selection,
    outcome: Option<bool>,
    attempts: u32,
}

impl ItemState {
    fn is_answered(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Where a round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Batch drawn, no pass computed yet.
    AwaitingPass,
    /// Walking a pass.
    InPass,
    /// Terminal; a new round must be started.
    Complete,
}

/// Result of trying to move forward within the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Current item not answered yet, or no pass is active.
    Blocked,
    Moved(usize),
    /// Last item answered; the caller decides what the next pass holds.
    PassFinished,
}

/// A prepared answer, evaluated but not yet applied to the item.
#[derive(Debug, Clone)]
pub(crate) struct PendingAnswer {
    pub drawn: DrawnQuestion,
    pub is_correct: bool,
    pub correct_answers: Vec<String>,
    pub selection: Selection,
}

//
// ─── ROUND SESSION ─────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz round over a drawn batch.
///
/// The batch is fixed for the life of the round. Each pass walks a subset of
/// it (in draw order), and the options for an item are sampled once per pass
/// so that navigating back and forth shows the same choices.
pub struct RoundSession {
    chapter: ChapterKey,
    mode: StudyMode,
    batch: Vec<DrawnQuestion>,
    items: Vec<ItemState>,
    phase: RoundPhase,
    members: Vec<usize>,
    position: usize,
    pass_number: u32,
    rng: StdRng,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    correct: u32,
    incorrect: u32,
}

impl RoundSession {
    /// Create a round awaiting its first pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the batch is empty.
    pub(crate) fn new(
        chapter: ChapterKey,
        mode: StudyMode,
        batch: Vec<DrawnQuestion>,
        rng: StdRng,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if batch.is_empty() {
            return Err(SessionError::Completed);
        }
        let items = vec![ItemState::default(); batch.len()];
        Ok(Self {
            chapter,
            mode,
            batch,
            items,
            phase: RoundPhase::AwaitingPass,
            members: Vec::new(),
            position: 0,
            pass_number: 0,
            rng,
            started_at,
            completed_at: None,
            correct: 0,
            incorrect: 0,
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
    pub fn batch(&self) -> &[DrawnQuestion] {
        &self.batch
    }

    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == RoundPhase::Complete
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Position within the current pass.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// One-based number of the current pass; zero before the first pass.
    #[must_use]
    pub fn pass_number(&self) -> u32 {
        self.pass_number
    }

    #[must_use]
    pub fn pass_len(&self) -> usize {
        self.members.len()
    }

    /// Items of the current pass that have been answered.
    #[must_use]
    pub fn answered_in_pass(&self) -> usize {
        self.members
            .iter()
            .filter(|&&m| self.items[m].is_answered())
            .count()
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect
    }

    fn current_member(&self) -> Option<usize> {
        if self.phase != RoundPhase::InPass {
            return None;
        }
        self.members.get(self.position).copied()
    }

    #[must_use]
    pub fn current(&self) -> Option<&DrawnQuestion> {
        self.current_member().map(|m| &self.batch[m])
    }

    /// Options for the current item, sampled on first access within the pass.
    pub fn current_options(&mut self) -> Option<&PresentedOptions> {
        let member = self.current_member()?;
        let drawn = &self.batch[member];
        let rng = &mut self.rng;
        let item = &mut self.items[member];
        Some(
            item.options
                .get_or_insert_with(|| {
                    options::build_options(&drawn.question, drawn.question_type, rng)
                }),
        )
    }

    /// The submitted selection for the current item, if it has been answered.
    #[must_use]
    pub fn current_answer(&self) -> Option<(&Selection, bool)> {
        let item = &self.items[self.current_member()?];
        item.outcome.map(|correct| (&item.selection, correct))
    }

    /// Answers accepted for the current item in this pass.
    #[must_use]
    pub fn current_attempts(&self) -> u32 {
        self.current_member().map_or(0, |m| self.items[m].attempts)
    }

    #[must_use]
    pub fn is_current_answered(&self) -> bool {
        self.current_member()
            .is_some_and(|m| self.items[m].is_answered())
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        self.phase == RoundPhase::InPass && self.position > 0
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.is_current_answered()
    }

    /// Move back one position. Returns `false` (and does nothing) at position 0.
    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Start a pass over the given batch positions.
    ///
    /// An empty member list completes the round instead.
    pub(crate) fn begin_pass(&mut self, members: Vec<usize>, now: DateTime<Utc>) {
        if members.is_empty() {
            self.complete(now);
            return;
        }
        for &member in &members {
            self.items[member] = ItemState::default();
        }
        self.members = members;
        self.position = 0;
        self.pass_number += 1;
        self.phase = RoundPhase::InPass;
    }

    /// Every batch position, for passes that do not filter by progress.
    pub(crate) fn all_positions(&self) -> Vec<usize> {
        (0..self.batch.len()).collect()
    }

    pub(crate) fn complete(&mut self, now: DateTime<Utc>) {
        self.phase = RoundPhase::Complete;
        self.members.clear();
        self.position = 0;
        if self.completed_at.is_none() {
            self.completed_at = Some(now.max(self.started_at));
        }
    }

    /// Evaluate a selection against the current item without applying it.
    ///
    /// Returns `None` when the item was already answered in this pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` when no pass is active.
    pub(crate) fn prepare_answer(
        &mut self,
        selection: Selection,
    ) -> Result<Option<PendingAnswer>, SessionError> {
        let Some(member) = self.current_member() else {
            return Err(SessionError::Completed);
        };
        if self.items[member].is_answered() {
            return Ok(None);
        }

        let drawn = self.batch[member].clone();
        let correct_answers = self
            .current_options()
            .map(|o| o.correct_answers().to_vec())
            .unwrap_or_default();
        let is_correct = grading::is_correct(drawn.question_type, &correct_answers, &selection);
        Ok(Some(PendingAnswer {
            drawn,
            is_correct,
            correct_answers,
            selection,
        }))
    }

    /// Record an evaluated answer on the current item.
    pub(crate) fn apply_answer(&mut self, pending: PendingAnswer) {
        let Some(member) = self.current_member() else {
            return;
        };
        let item = &mut self.items[member];
        if item.is_answered() {
            return;
        }
        item.selection = pending.selection;
        item.outcome = Some(pending.is_correct);
        item.attempts += 1;
        if pending.is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    /// Move forward within the pass once the current item is answered.
    pub(crate) fn step_forward(&mut self) -> Step {
        if !self.is_current_answered() {
            return Step::Blocked;
        }
        if self.position + 1 < self.members.len() {
            self.position += 1;
            Step::Moved(self.position)
        } else {
            Step::PassFinished
        }
    }

    /// Build the summary of a completed round.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` before completion and
    /// `SessionError::Summary` if the timestamps are inconsistent.
    pub(crate) fn build_summary(&self, mastered: usize) -> Result<RoundSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotComplete)?;
        let counts = RoundCounts {
            batch_size: u32::try_from(self.batch.len()).unwrap_or(u32::MAX),
            passes: self.pass_number,
            correct: self.correct,
            incorrect: self.incorrect,
            mastered: u32::try_from(mastered).unwrap_or(u32::MAX),
        };
        Ok(RoundSummary::new(
            self.chapter.clone(),
            self.mode,
            self.started_at,
            completed_at,
            counts,
        )?)
    }

    /// Per-item review of the round in draw order.
    #[must_use]
    pub fn report(&self) -> RoundReport {
        let entries = self
            .batch
            .iter()
            .zip(&self.items)
            .map(|(drawn, item)| {
                let options = item
                    .options
                    .as_ref()
                    .map(|presented| {
                        presented
                            .options()
                            .iter()
                            .enumerate()
                            .map(|(pos, text)| {
                                let is_correct = presented.is_correct_option(text);
                                ReportOption {
                                    label: options::option_label(pos),
                                    text: text.clone(),
                                    is_correct,
                                    wrongly_selected: !is_correct && item.selection.contains(text),
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ReportEntry::new(drawn, options, item.outcome)
            })
            .collect();
        RoundReport {
            chapter: self.chapter.clone(),
            mode: self.mode,
            entries,
        }
    }
}

impl fmt::Debug for RoundSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundSession")
            .field("chapter", &self.chapter)
            .field("mode", &self.mode)
            .field("batch_len", &self.batch.len())
            .field("phase", &self.phase)
            .field("pass_number", &self.pass_number)
            .field("position", &self.position)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
