use async_trait::async_trait;
use quiz_core::model::{ChapterKey, ProgressMap, QuestionType};
use tracing::debug;

use super::mapping::{decode_progress, encode_progress};
use super::{JsonRepository, exists, read_optional, write_atomic};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for JsonRepository {
    async fn load_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<ProgressMap, StorageError> {
        let path = self.layout.progress_path(chapter, question_type);
        Ok(read_optional(&path)
            .await
            .map(|bytes| decode_progress(&bytes, &path))
            .unwrap_or_default())
    }

    async fn has_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError> {
        exists(&self.layout.progress_path(chapter, question_type)).await
    }

    async fn save_progress(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
        progress: &ProgressMap,
    ) -> Result<(), StorageError> {
        let path = self.layout.progress_path(chapter, question_type);
        let bytes = encode_progress(progress)?;
        write_atomic(&path, &bytes).await?;
        debug!(path = %path.display(), entries = progress.len(), "progress saved");
        Ok(())
    }
}
