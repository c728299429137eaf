use std::collections::BTreeSet;

use crate::model::QuestionType;

/// Options the user submitted for one question instance.
///
/// Single-select answers are stored as a one-element set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    #[must_use]
    pub fn single(option: impl Into<String>) -> Self {
        Self(BTreeSet::from([option.into()]))
    }

    #[must_use]
    pub fn multi<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(options.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn contains(&self, option: &str) -> bool {
        self.0.contains(option)
    }

    /// Add the option if absent, remove it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, option: &str) -> bool {
        if self.0.remove(option) {
            false
        } else {
            self.0.insert(option.to_owned());
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decide whether `selection` answers a question instance correctly.
///
/// Single-select: exactly one option chosen and it is one of `correct`.
/// Multi-select: the chosen set equals `correct` exactly; no partial credit.
#[must_use]
pub fn is_correct(question_type: QuestionType, correct: &[String], selection: &Selection) -> bool {
    match question_type {
        QuestionType::Single => {
            selection.len() == 1 && selection.iter().all(|s| correct.iter().any(|c| c == s))
        }
        QuestionType::Multi => {
            let expected: BTreeSet<&str> = correct.iter().map(String::as_str).collect();
            let submitted: BTreeSet<&str> = selection.iter().collect();
            expected == submitted
        }
    }
}
