use thiserror::Error;

use crate::model::{ChapterKeyError, QuestionError, RoundSummaryError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    ChapterKey(#[from] ChapterKeyError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    RoundSummary(#[from] RoundSummaryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterKey, QuizSettingsDraft};

    fn validate_all(key: &str, questions: &str) -> Result<(), Error> {
        ChapterKey::new(key)?;
        QuizSettingsDraft::new(questions).validate()?;
        Ok(())
    }

    #[test]
    fn lower_errors_convert_transparently() {
        assert!(validate_all("basics", "10").is_ok());

        let err = validate_all("", "10").unwrap_err();
        assert!(matches!(err, Error::ChapterKey(_)));

        let err = validate_all("basics", "99").unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
        assert_eq!(err.to_string(), SettingsError::OutOfRange { provided: 99, min: 5, max: 50 }.to_string());
    }
}
