#![forbid(unsafe_code)]

pub mod error;
pub mod progress_service;
pub mod sessions;
pub mod settings_service;

pub use quiz_core::{Clock, RngSource};

pub use error::{ProgressServiceError, SessionError, SettingsServiceError};
pub use progress_service::{ChapterOverview, ProgressService};
pub use sessions::{
    Advance, AnswerFeedback, EmptyPool, RoundLoopService, RoundPhase, RoundProgress, RoundReport,
    RoundSession, RoundStart, SubmitOutcome,
};
pub use settings_service::SettingsService;
