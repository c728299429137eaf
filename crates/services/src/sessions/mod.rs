mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the round subsystem.
pub use crate::error::SessionError;
pub use progress::RoundProgress;
pub use service::{RoundPhase, RoundSession};
pub use view::{NO_EXPLANATION, ReportEntry, ReportOption, RoundReport};
pub use workflow::{AnswerFeedback, Advance, EmptyPool, RoundLoopService, RoundStart, SubmitOutcome};
