use std::sync::Arc;

use quiz_core::model::{QuizSettings, QuizSettingsDraft};
use storage::repository::SettingsRepository;
use tracing::info;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings, writing the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<QuizSettings, SettingsServiceError> {
        if let Some(settings) = self.repo.get_settings().await? {
            return Ok(settings);
        }
        let settings = QuizSettings::default();
        self.repo.save_settings(&settings).await?;
        info!(
            questions_per_session = settings.questions_per_session(),
            "wrote default settings"
        );
        Ok(settings)
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Settings` if validation fails, leaving the
    /// stored value untouched, or `SettingsServiceError::Storage` if persistence fails.
    pub async fn save(&self, draft: QuizSettingsDraft) -> Result<QuizSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SettingsError;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn first_load_persists_defaults() {
        let repo = InMemoryRepository::new();
        let service = SettingsService::new(Arc::new(repo.clone()));

        let settings = service.load().await.unwrap();
        assert_eq!(settings.questions_per_session(), 10);
        assert_eq!(repo.get_settings().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn invalid_draft_keeps_stored_value() {
        let repo = InMemoryRepository::new();
        let service = SettingsService::new(Arc::new(repo.clone()));
        service.save(QuizSettingsDraft::new("20")).await.unwrap();

        let err = service.save(QuizSettingsDraft::new("99")).await.unwrap_err();
        assert!(matches!(
            err,
            SettingsServiceError::Settings(SettingsError::OutOfRange { .. })
        ));
        assert_eq!(service.load().await.unwrap().questions_per_session(), 20);
    }
}
