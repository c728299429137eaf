use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("questions per session must be a whole number")]
    NotANumber,

    #[error("questions per session must be between {min} and {max}, got {provided}")]
    OutOfRange { provided: i64, min: u32, max: u32 },
}

/// User-tunable quiz settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    questions_per_session: u32,
}

impl QuizSettings {
    pub const DEFAULT_QUESTIONS_PER_SESSION: u32 = 10;
    pub const MIN_QUESTIONS_PER_SESSION: u32 = 5;
    pub const MAX_QUESTIONS_PER_SESSION: u32 = 50;

    /// Rehydrate settings from storage.
    ///
    /// Persisted values are honored as-is; the range only applies to user edits.
    #[must_use]
    pub fn from_persisted(questions_per_session: u32) -> Self {
        Self {
            questions_per_session,
        }
    }

    #[must_use]
    pub fn questions_per_session(&self) -> u32 {
        self.questions_per_session
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_session: Self::DEFAULT_QUESTIONS_PER_SESSION,
        }
    }
}

/// Raw settings input as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct QuizSettingsDraft {
    pub questions_per_session: String,
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new(questions_per_session: impl Into<String>) -> Self {
        Self {
            questions_per_session: questions_per_session.into(),
        }
    }

    /// Validate the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NotANumber` if the input is not an integer and
    /// `SettingsError::OutOfRange` if it falls outside 5..=50.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let parsed: i64 = self
            .questions_per_session
            .trim()
            .parse()
            .map_err(|_| SettingsError::NotANumber)?;

        let min = QuizSettings::MIN_QUESTIONS_PER_SESSION;
        let max = QuizSettings::MAX_QUESTIONS_PER_SESSION;
        if parsed < i64::from(min) || parsed > i64::from(max) {
            return Err(SettingsError::OutOfRange {
                provided: parsed,
                min,
                max,
            });
        }

        let questions_per_session = u32::try_from(parsed).map_err(|_| SettingsError::OutOfRange {
            provided: parsed,
            min,
            max,
        })?;
        Ok(QuizSettings {
            questions_per_session,
        })
    }
}
