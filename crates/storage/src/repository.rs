use async_trait::async_trait;
use quiz_core::model::{ChapterKey, ProgressMap, QuestionBank, QuestionType, QuizSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
///
/// Read paths recover from missing or malformed files on their own; these
/// errors mostly come from writes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read-only access to a chapter's questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Load the ordered questions for a chapter and type.
    ///
    /// A missing or unreadable source yields an empty bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself is unavailable.
    async fn load_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<QuestionBank, StorageError>;

    /// Whether a question source exists for the chapter and type.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if existence cannot be determined.
    async fn has_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError>;
}

/// Streak persistence per chapter and question type.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the progress map. Missing or corrupt data yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself is unavailable.
    async fn load_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<ProgressMap, StorageError>;

    /// Whether progress has ever been persisted for the chapter and type.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if existence cannot be determined.
    async fn has_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError>;

    /// Replace the whole progress map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the map cannot be written.
    async fn save_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
        progress: &ProgressMap,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch persisted settings, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend is unavailable.
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError>;

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be written.
    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError>;
}

type SlotKey = (ChapterKey, QuestionType);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<SlotKey, QuestionBank>>>,
    progress: Arc<Mutex<HashMap<SlotKey, ProgressMap>>>,
    settings: Arc<Mutex<Option<QuizSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a question bank for a chapter and type.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
        bank: QuestionBank,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((chapter.clone(), question_type), bank);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn load_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<QuestionBank, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(chapter.clone(), question_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn has_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.contains_key(&(chapter.clone(), question_type)))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<ProgressMap, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(chapter.clone(), question_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn has_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.contains_key(&(chapter.clone(), question_type)))
    }

    async fn save_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
        progress: &ProgressMap,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((chapter.clone(), question_type), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*settings);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one repository value across all three concerns.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository + ProgressRepository + SettingsRepository + Clone + 'static,
    {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self {
            questions,
            progress,
            settings,
        }
    }
}
