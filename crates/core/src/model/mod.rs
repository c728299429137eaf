mod chapter;
mod ids;
mod progress;
mod question;
mod session;
mod settings;

pub use chapter::{Chapter, ChapterCatalog};
pub use ids::{ChapterKey, ChapterKeyError, ParseIdError, QuestionIndex};
pub use progress::{ProgressMap, Streak, StudyMode, UnknownModeError};
pub use question::{Question, QuestionBank, QuestionError, QuestionType};
pub use session::{DrawnQuestion, RoundCounts, RoundSummary, RoundSummaryError};
pub use settings::{QuizSettings, QuizSettingsDraft, SettingsError};
