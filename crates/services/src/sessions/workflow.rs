use std::sync::Arc;

use quiz_core::grading::Selection;
use quiz_core::model::{ChapterKey, RoundSummary, Streak, StudyMode};
use storage::repository::QuestionRepository;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::progress_service::ProgressService;
use crate::settings_service::SettingsService;
use crate::{Clock, RngSource};
use super::progress::RoundProgress;
use super::queries::RoundQueries;
use super::service::{RoundSession, Step};
use super::view::explanation_or_placeholder;

/// Why a round could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPool {
    /// Learn mode found every question already mastered.
    NothingLeftToLearn,
    /// Review mode found no mastered question.
    NothingLearnedYet,
}

impl EmptyPool {
    #[must_use]
    pub fn for_mode(mode: StudyMode) -> Self {
        match mode {
            StudyMode::LearnNew => EmptyPool::NothingLeftToLearn,
            StudyMode::ReviewOld => EmptyPool::NothingLearnedYet,
        }
    }

    /// User-facing explanation.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            EmptyPool::NothingLeftToLearn => {
                "You have learned every question in this chapter. Nothing left to learn!"
            }
            EmptyPool::NothingLearnedYet => {
                "You have not learned any question in this chapter yet. Learn some first, then review."
            }
        }
    }
}

/// Outcome of starting a round.
#[derive(Debug)]
pub enum RoundStart {
    Ready(RoundSession),
    NoQuestions(EmptyPool),
}

/// What the user sees after submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    /// Post-update streak in learn mode, the unchanged stored streak in review mode.
    pub streak: Streak,
    pub correct_answers: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Answered(AnswerFeedback),
    /// The current item was already answered in this pass; nothing changed.
    AlreadyAnswered,
}

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The current item is not answered yet, or the round is over.
    Blocked,
    Moved { position: usize },
    NewPass { pass_number: u32, len: usize },
    RoundComplete,
}

/// Orchestrates round start, persisted answering, and pass transitions.
#[derive(Clone)]
pub struct RoundLoopService {
    clock: Clock,
    rng_source: RngSource,
    questions: Arc<dyn QuestionRepository>,
    progress: ProgressService,
    settings: SettingsService,
}

impl RoundLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        progress: ProgressService,
        settings: SettingsService,
    ) -> Self {
        Self {
            clock,
            rng_source: RngSource::default(),
            questions,
            progress,
            settings,
        }
    }

    #[must_use]
    pub fn with_rng_source(mut self, rng_source: RngSource) -> Self {
        self.rng_source = rng_source;
        self
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Draw a batch and open its first pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when settings or storage are unavailable.
    pub async fn start_round(
        &self,
        chapter: &ChapterKey,
        mode: StudyMode,
    ) -> Result<RoundStart, SessionError> {
        let settings = self.settings.load().await?;
        let questions_per_session =
            usize::try_from(settings.questions_per_session()).unwrap_or(usize::MAX);
        let mut rng = self.rng_source.rng();

        let batch = RoundQueries::draw_batch(
            self.questions.as_ref(),
            &self.progress,
            chapter,
            mode,
            questions_per_session,
            &mut rng,
        )
        .await?;
        if batch.is_empty() {
            let empty = EmptyPool::for_mode(mode);
            info!(%chapter, %mode, ?empty, "no eligible questions");
            return Ok(RoundStart::NoQuestions(empty));
        }

        info!(%chapter, %mode, batch = batch.len(), "round started");
        let mut session = RoundSession::new(chapter.clone(), mode, batch, rng, self.clock.now())?;
        self.compute_pass(&mut session).await?;
        Ok(RoundStart::Ready(session))
    }

    /// Open the next pass: learn mode keeps the batch items still below
    /// mastery, review mode walks the whole batch once.
    async fn compute_pass(&self, session: &mut RoundSession) -> Result<(), SessionError> {
        let members = match session.mode() {
            StudyMode::LearnNew => {
                RoundQueries::unmastered_positions(&self.progress, session.chapter(), session.batch())
                    .await?
            }
            StudyMode::ReviewOld => session.all_positions(),
        };
        session.begin_pass(members, self.clock.now());

        if session.is_complete() {
            info!(chapter = %session.chapter(), passes = session.pass_number(), "round complete");
        } else {
            debug!(
                chapter = %session.chapter(),
                pass = session.pass_number(),
                len = session.pass_len(),
                "pass started"
            );
        }
        Ok(())
    }

    /// Evaluate and persist an answer for the current item.
    ///
    /// The item is only marked answered once progress has been written, so a
    /// failed write can be retried.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` when no pass is active and
    /// `SessionError::Progress` if progress cannot be saved.
    pub async fn submit_answer(
        &self,
        session: &mut RoundSession,
        selection: Selection,
    ) -> Result<SubmitOutcome, SessionError> {
        let Some(pending) = session.prepare_answer(selection)? else {
            return Ok(SubmitOutcome::AlreadyAnswered);
        };

        let streak = self
            .progress
            .record_answer(
                session.chapter(),
                pending.drawn.question_type,
                pending.drawn.index,
                pending.is_correct,
                session.mode(),
            )
            .await?;

        let feedback = AnswerFeedback {
            is_correct: pending.is_correct,
            streak,
            correct_answers: pending.correct_answers.clone(),
            explanation: explanation_or_placeholder(pending.drawn.question.explanation()),
        };
        session.apply_answer(pending);
        Ok(SubmitOutcome::Answered(feedback))
    }

    /// Move to the next item, opening a new pass or completing the round at
    /// the end of the current one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when progress cannot be read for the next pass.
    pub async fn advance(&self, session: &mut RoundSession) -> Result<Advance, SessionError> {
        match session.step_forward() {
            Step::Blocked => Ok(Advance::Blocked),
            Step::Moved(position) => Ok(Advance::Moved { position }),
            Step::PassFinished => {
                match session.mode() {
                    StudyMode::ReviewOld => {
                        session.complete(self.clock.now());
                        info!(chapter = %session.chapter(), "review round complete");
                    }
                    StudyMode::LearnNew => self.compute_pass(session).await?,
                }
                if session.is_complete() {
                    Ok(Advance::RoundComplete)
                } else {
                    Ok(Advance::NewPass {
                        pass_number: session.pass_number(),
                        len: session.pass_len(),
                    })
                }
            }
        }
    }

    /// Progress indicator for the current state of a round.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when learn-mode progress cannot be read.
    pub async fn round_progress(&self, session: &RoundSession) -> Result<RoundProgress, SessionError> {
        let (done, total) = match session.mode() {
            StudyMode::LearnNew => {
                let mastered =
                    RoundQueries::mastered_in_batch(&self.progress, session.chapter(), session.batch())
                        .await?;
                (mastered, session.batch().len())
            }
            StudyMode::ReviewOld if session.is_complete() => {
                (session.batch().len(), session.batch().len())
            }
            StudyMode::ReviewOld => (session.position() + 1, session.pass_len()),
        };
        Ok(RoundProgress {
            pass_number: session.pass_number(),
            position: session.position(),
            pass_len: session.pass_len(),
            answered_in_pass: session.answered_in_pass(),
            done,
            total,
            can_retreat: session.can_retreat(),
            can_advance: session.can_advance(),
            is_complete: session.is_complete(),
        })
    }

    /// Summary of a completed round.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` if the round is still running.
    pub async fn finish_summary(&self, session: &RoundSession) -> Result<RoundSummary, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::NotComplete);
        }
        let mastered =
            RoundQueries::mastered_in_batch(&self.progress, session.chapter(), session.batch())
                .await?;
        session.build_summary(mastered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_messages_differ_per_mode() {
        let learn = EmptyPool::for_mode(StudyMode::LearnNew);
        let review = EmptyPool::for_mode(StudyMode::ReviewOld);
        assert_eq!(learn, EmptyPool::NothingLeftToLearn);
        assert_eq!(review, EmptyPool::NothingLearnedYet);
        assert_ne!(learn.message(), review.message());
    }
}
