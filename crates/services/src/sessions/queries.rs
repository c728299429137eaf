use rand::Rng;

use quiz_core::model::{ChapterKey, DrawnQuestion, ProgressMap, QuestionType, StudyMode};
use quiz_core::selection::{BatchSelector, TypePool};
use storage::repository::QuestionRepository;

use crate::error::SessionError;
use crate::progress_service::ProgressService;

/// Storage-backed lookups the round workflow runs between state transitions.
pub(crate) struct RoundQueries;

/// Live progress for both question types of one chapter.
struct ChapterProgress {
    single: ProgressMap,
    multi: ProgressMap,
}

impl ChapterProgress {
    async fn load(progress: &ProgressService, chapter: &ChapterKey) -> Result<Self, SessionError> {
        Ok(Self {
            single: progress.load(chapter, QuestionType::Single).await?,
            multi: progress.load(chapter, QuestionType::Multi).await?,
        })
    }

    fn for_type(&self, question_type: QuestionType) -> &ProgressMap {
        match question_type {
            QuestionType::Single => &self.single,
            QuestionType::Multi => &self.multi,
        }
    }

    fn is_mastered(&self, drawn: &DrawnQuestion) -> bool {
        self.for_type(drawn.question_type).is_mastered(drawn.index)
    }
}

impl RoundQueries {
    /// Draw a fresh batch for a chapter from stored questions and progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the backend is unavailable.
    pub async fn draw_batch<R: Rng + ?Sized>(
        questions: &dyn QuestionRepository,
        progress: &ProgressService,
        chapter: &ChapterKey,
        mode: StudyMode,
        questions_per_session: usize,
        rng: &mut R,
    ) -> Result<Vec<DrawnQuestion>, SessionError> {
        let single_bank = questions.load_questions(chapter, QuestionType::Single).await?;
        let multi_bank = questions.load_questions(chapter, QuestionType::Multi).await?;
        let live = ChapterProgress::load(progress, chapter).await?;

        let selector = BatchSelector::new(
            mode,
            TypePool {
                bank: &single_bank,
                progress: &live.single,
            },
            TypePool {
                bank: &multi_bank,
                progress: &live.multi,
            },
        );
        Ok(selector.draw(questions_per_session, rng))
    }

    /// Batch positions whose stored streak is still below mastery, in draw order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the backend is unavailable.
    pub async fn unmastered_positions(
        progress: &ProgressService,
        chapter: &ChapterKey,
        batch: &[DrawnQuestion],
    ) -> Result<Vec<usize>, SessionError> {
        let live = ChapterProgress::load(progress, chapter).await?;
        Ok(batch
            .iter()
            .enumerate()
            .filter(|(_, drawn)| !live.is_mastered(drawn))
            .map(|(position, _)| position)
            .collect())
    }

    /// Number of batch items currently mastered in the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the backend is unavailable.
    pub async fn mastered_in_batch(
        progress: &ProgressService,
        chapter: &ChapterKey,
        batch: &[DrawnQuestion],
    ) -> Result<usize, SessionError> {
        let live = ChapterProgress::load(progress, chapter).await?;
        Ok(batch.iter().filter(|drawn| live.is_mastered(drawn)).count())
    }
}
