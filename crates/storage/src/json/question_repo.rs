use async_trait::async_trait;
use quiz_core::model::{ChapterKey, QuestionBank, QuestionType};

use super::mapping::decode_question_bank;
use super::{JsonRepository, exists, read_optional};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait]
impl QuestionRepository for JsonRepository {
    async fn load_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<QuestionBank, StorageError> {
        let path = self.layout.question_path(chapter, question_type);
        Ok(read_optional(&path)
            .await
            .map(|bytes| decode_question_bank(&bytes, &path))
            .unwrap_or_default())
    }

    async fn has_questions(
        &self,
        chapter: &ChapterKey,
        question_type: QuestionType,
    ) -> Result<bool, StorageError> {
        exists(&self.layout.question_path(chapter, question_type)).await
    }
}
