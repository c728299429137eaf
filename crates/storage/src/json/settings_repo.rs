use async_trait::async_trait;
use quiz_core::model::QuizSettings;
use serde_json::Value;

use super::mapping::{QUESTIONS_PER_SESSION_KEY, decode_settings_object, settings_from_object};
use super::{JsonRepository, read_optional, write_atomic};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for JsonRepository {
    async fn get_settings(&self) -> Result<Option<QuizSettings>, StorageError> {
        let path = self.layout.settings_path();
        Ok(read_optional(path)
            .await
            .map(|bytes| settings_from_object(&decode_settings_object(&bytes, path))))
    }

    async fn save_settings(&self, settings: &QuizSettings) -> Result<(), StorageError> {
        let path = self.layout.settings_path();
        // Other keys in the file are preserved.
        let mut raw = read_optional(path)
            .await
            .map(|bytes| decode_settings_object(&bytes, path))
            .unwrap_or_default();
        raw.insert(
            QUESTIONS_PER_SESSION_KEY.to_owned(),
            Value::from(settings.questions_per_session()),
        );
        let bytes = serde_json::to_vec_pretty(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_atomic(path, &bytes).await
    }
}
