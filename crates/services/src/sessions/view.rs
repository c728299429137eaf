use quiz_core::model::{ChapterKey, DrawnQuestion, QuestionIndex, QuestionType, StudyMode};

/// Shown in place of an empty explanation.
pub const NO_EXPLANATION: &str = "No explanation provided.";

/// One presented option in the post-round report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOption {
    pub label: char,
    pub text: String,
    pub is_correct: bool,
    /// Selected by the user although it is not a correct answer.
    pub wrongly_selected: bool,
}

/// Review of one batch item.
///
/// `options` is empty for items that were never shown, and `result` is `None`
/// for items not answered in their latest pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub question_type: QuestionType,
    pub index: QuestionIndex,
    pub question: String,
    pub options: Vec<ReportOption>,
    pub result: Option<bool>,
    pub explanation: String,
}

impl ReportEntry {
    pub(crate) fn new(drawn: &DrawnQuestion, options: Vec<ReportOption>, result: Option<bool>) -> Self {
        Self {
            question_type: drawn.question_type,
            index: drawn.index,
            question: drawn.question.question().to_owned(),
            options,
            result,
            explanation: explanation_or_placeholder(drawn.question.explanation()),
        }
    }
}

/// Presentation-agnostic review of a round, in draw order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub chapter: ChapterKey,
    pub mode: StudyMode,
    pub entries: Vec<ReportEntry>,
}

impl RoundReport {
    #[must_use]
    pub fn answered(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_some()).count()
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.entries.iter().filter(|e| e.result == Some(true)).count()
    }
}

pub(crate) fn explanation_or_placeholder(explanation: &str) -> String {
    if explanation.trim().is_empty() {
        NO_EXPLANATION.to_owned()
    } else {
        explanation.to_owned()
    }
}
