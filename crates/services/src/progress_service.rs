use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::{
    Chapter, ChapterCatalog, ChapterKey, ProgressMap, QuestionIndex, QuestionType, Streak,
    StudyMode,
};
use storage::repository::{ProgressRepository, QuestionRepository};
use tracing::{debug, info};

use crate::error::ProgressServiceError;

/// Learned/total counts for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOverview {
    pub key: ChapterKey,
    pub title: String,
    pub total: usize,
    pub learned: usize,
}

impl ChapterOverview {
    /// Share of mastered questions in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.learned as f64 / self.total as f64
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.learned >= self.total
    }
}

type SlotKey = (ChapterKey, QuestionType);

/// One async lock per chapter/type progress map.
#[derive(Clone, Default)]
struct ProgressLocks {
    slots: Arc<Mutex<HashMap<SlotKey, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ProgressLocks {
    fn slot(&self, chapter: &ChapterKey, question_type: QuestionType) -> Arc<tokio::sync::Mutex<()>> {
        let mut guard = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guard.entry((chapter.clone(), question_type)).or_default())
    }
}

/// Reads and writes streaks; the only writer of progress maps.
///
/// Every read-modify-write of a map runs under that map's lock, so concurrent
/// answers for the same chapter and type cannot lose updates.
#[derive(Clone)]
pub struct ProgressService {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    locks: ProgressLocks,
}

impl ProgressService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            questions,
            progress,
            locks: ProgressLocks::default(),
        }
    }

    /// Snapshot of a chapter/type progress map.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend is unavailable.
    pub async fn load(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<ProgressMap, ProgressServiceError> {
        Ok(self.progress.load_progress(chapter, question_type).await?)
    }

    /// Apply an answer to the stored streak and return the resulting streak.
    ///
    /// Review mode never writes: the stored streak is returned unchanged.
    /// Learn mode increments on a correct answer, resets to zero otherwise, and
    /// persists the whole map.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the map cannot be saved.
    pub async fn record_answer(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
        index: QuestionIndex,
        correct: bool,
        mode: StudyMode,
    ) -> Result<Streak, ProgressServiceError> {
        if !mode.records_progress() {
            let progress = self.load(chapter, question_type).await?;
            return Ok(progress.streak(index));
        }

        let slot = self.locks.slot(chapter, question_type);
        let _guard = slot.lock().await;

        let mut progress = self.load(chapter, question_type).await?;
        let streak = progress.record_answer(index, correct);
        self.progress
            .save_progress(chapter, question_type, &progress)
            .await?;
        debug!(%chapter, %question_type, %index, correct, %streak, "streak updated");
        Ok(streak)
    }

    /// Overwrite both progress maps of a chapter with zero streaks.
    ///
    /// Types without a question source are skipped. Returns the types reset.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a map cannot be written.
    pub async fn reset_chapter(
        &self,
        chapter: &ChapterKey,
    ) -> Result<Vec<QuestionType>, ProgressServiceError> {
        let mut reset = Vec::new();
        for question_type in QuestionType::ALL {
            if !self.questions.has_questions(chapter, question_type).await? {
                debug!(%chapter, %question_type, "no question source, skipping reset");
                continue;
            }
            self.write_zeroed(chapter, question_type).await?;
            reset.push(question_type);
        }
        info!(%chapter, types = reset.len(), "chapter progress reset");
        Ok(reset)
    }

    /// Create zeroed progress maps for types that have questions but no progress yet.
    ///
    /// Returns the types that were created.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if a map cannot be written.
    pub async fn ensure_progress(
        &self,
        chapter: &ChapterKey,
    ) -> Result<Vec<QuestionType>, ProgressServiceError> {
        let mut created = Vec::new();
        for question_type in QuestionType::ALL {
            if !self.questions.has_questions(chapter, question_type).await?
                || self.progress.has_progress(chapter, question_type).await?
            {
                continue;
            }
            self.write_zeroed(chapter, question_type).await?;
            created.push(question_type);
        }
        if !created.is_empty() {
            info!(%chapter, types = created.len(), "progress initialised");
        }
        Ok(created)
    }

    async fn write_zeroed(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<(), ProgressServiceError> {
        let bank = self.questions.load_questions(chapter, question_type).await?;
        let zeroed = ProgressMap::zeroed(bank.all_indices());

        let slot = self.locks.slot(chapter, question_type);
        let _guard = slot.lock().await;
        self.progress
            .save_progress(chapter, question_type, &zeroed)
            .await?;
        Ok(())
    }

    /// Learned/total counts for one chapter.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend is unavailable.
    pub async fn overview(&self, chapter: &Chapter) -> Result<ChapterOverview, ProgressServiceError> {
        let mut total = 0;
        let mut learned = 0;
        for question_type in QuestionType::ALL {
            let bank = self
                .questions
                .load_questions(chapter.key(), question_type)
                .await?;
            let progress = self.load(chapter.key(), question_type).await?;
            total += bank.valid_count();
            learned += bank
                .iter()
                .filter(|(index, _)| progress.is_mastered(*index))
                .count();
        }
        Ok(ChapterOverview {
            key: chapter.key().clone(),
            title: chapter.title().to_owned(),
            total,
            learned,
        })
    }

    /// Overviews for every catalog chapter that has at least one question.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend is unavailable.
    pub async fn overviews(
        &self,
        catalog: &ChapterCatalog,
    ) -> Result<Vec<ChapterOverview>, ProgressServiceError> {
        let mut out = Vec::new();
        for chapter in catalog.chapters() {
            let overview = self.overview(chapter).await?;
            if overview.total > 0 {
                out.push(overview);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionBank};
    use storage::repository::InMemoryRepository;

    fn chapter() -> ChapterKey {
        ChapterKey::new("basics").unwrap()
    }

    fn bank(n: usize) -> QuestionBank {
        QuestionBank::from_questions((0..n).map(|i| {
            Question::new(format!("Q{i}"), vec!["A".to_owned()], vec!["B".to_owned()], "").unwrap()
        }))
    }

    fn service(repo: &InMemoryRepository) -> ProgressService {
        ProgressService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn learn_mode_streak_sequence() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let key = chapter();
        let idx = QuestionIndex::new(0);

        let mut streaks = Vec::new();
        for correct in [true, true, false] {
            let streak = svc
                .record_answer(&key, QuestionType::Single, idx, correct, StudyMode::LearnNew)
                .await
                .unwrap();
            streaks.push(streak);
        }
        assert_eq!(streaks, vec![Streak::new(1), Streak::new(2), Streak::ZERO]);
    }

    #[tokio::test]
    async fn review_mode_never_writes() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let idx = QuestionIndex::new(3);
        let mut seeded = ProgressMap::new();
        seeded.set(idx, Streak::new(4));
        repo.save_progress(&chapter(), QuestionType::Multi, &seeded)
            .await
            .unwrap();

        for correct in [false, true, false] {
            let streak = svc
                .record_answer(&chapter(), QuestionType::Multi, idx, correct, StudyMode::ReviewOld)
                .await
                .unwrap();
            assert_eq!(streak, Streak::new(4));
        }
        assert_eq!(svc.load(&chapter(), QuestionType::Multi).await.unwrap(), seeded);
    }

    #[tokio::test]
    async fn concurrent_answers_do_not_lose_updates() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let mut handles = Vec::new();
        for i in 0..16 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.record_answer(
                    &chapter(),
                    QuestionType::Single,
                    QuestionIndex::new(i),
                    true,
                    StudyMode::LearnNew,
                )
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let progress = svc.load(&chapter(), QuestionType::Single).await.unwrap();
        assert_eq!(progress.len(), 16);
        assert!(progress.iter().all(|(_, s)| s == Streak::new(1)));
    }

    #[tokio::test]
    async fn reset_zeroes_known_types_only() {
        let repo = InMemoryRepository::new();
        repo.insert_questions(&chapter(), QuestionType::Single, bank(3))
            .unwrap();
        let svc = service(&repo);
        svc.record_answer(&chapter(), QuestionType::Single, QuestionIndex::new(1), true, StudyMode::LearnNew)
            .await
            .unwrap();

        let reset = svc.reset_chapter(&chapter()).await.unwrap();
        assert_eq!(reset, vec![QuestionType::Single]);

        let progress = svc.load(&chapter(), QuestionType::Single).await.unwrap();
        assert_eq!(progress, ProgressMap::zeroed((0..3).map(QuestionIndex::new)));
        assert!(!repo.has_progress(&chapter(), QuestionType::Multi).await.unwrap());
    }

    #[tokio::test]
    async fn ensure_progress_only_creates_missing_maps() {
        let repo = InMemoryRepository::new();
        repo.insert_questions(&chapter(), QuestionType::Single, bank(2))
            .unwrap();
        repo.insert_questions(&chapter(), QuestionType::Multi, bank(1))
            .unwrap();
        let svc = service(&repo);
        svc.record_answer(&chapter(), QuestionType::Multi, QuestionIndex::new(0), true, StudyMode::LearnNew)
            .await
            .unwrap();

        let created = svc.ensure_progress(&chapter()).await.unwrap();
        assert_eq!(created, vec![QuestionType::Single]);
        let multi = svc.load(&chapter(), QuestionType::Multi).await.unwrap();
        assert_eq!(multi.streak(QuestionIndex::new(0)), Streak::new(1));
    }

    #[tokio::test]
    async fn overview_counts_mastered_questions() {
        let repo = InMemoryRepository::new();
        repo.insert_questions(&chapter(), QuestionType::Single, bank(3))
            .unwrap();
        repo.insert_questions(&chapter(), QuestionType::Multi, bank(1))
            .unwrap();
        let svc = service(&repo);
        let mut single = ProgressMap::new();
        single.set(QuestionIndex::new(0), Streak::new(2));
        single.set(QuestionIndex::new(1), Streak::new(1));
        repo.save_progress(&chapter(), QuestionType::Single, &single)
            .await
            .unwrap();

        let catalog = ChapterCatalog::default();
        let overviews = svc.overviews(&catalog).await.unwrap();
        assert_eq!(overviews.len(), 1);
        let basics = &overviews[0];
        assert_eq!(basics.total, 4);
        assert_eq!(basics.learned, 1);
        assert!((basics.ratio() - 0.25).abs() < f64::EPSILON);
        assert!(!basics.is_complete());
    }
}
