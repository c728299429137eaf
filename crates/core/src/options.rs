use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::model::{Question, QuestionType};

/// Wrong options shown next to a single-select answer.
pub const SINGLE_WRONG_OPTIONS: usize = 3;
/// Bounds on correct answers sampled for a multi-select instance.
pub const MULTI_MIN_CORRECT: usize = 2;
pub const MULTI_MAX_CORRECT: usize = 3;
/// Option count a multi-select instance aims for.
pub const MULTI_TARGET_OPTIONS: usize = 5;

/// Options presented for one question instance, plus which of them are correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedOptions {
    options: Vec<String>,
    correct: Vec<String>,
}

impl PresentedOptions {
    /// Presented options in display order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Correct answers sampled for this instance.
    #[must_use]
    pub fn correct_answers(&self) -> &[String] {
        &self.correct
    }

    #[must_use]
    pub fn is_correct_option(&self, option: &str) -> bool {
        self.correct.iter().any(|c| c == option)
    }

    /// Option text at a display position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.options.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Letter label (`A`, `B`, ...) for a display position.
#[must_use]
pub fn option_label(position: usize) -> char {
    u8::try_from(position)
        .ok()
        .and_then(|p| b'A'.checked_add(p))
        .filter(u8::is_ascii_uppercase)
        .map_or('?', char::from)
}

/// Sample and shuffle the options for one presentation of `question`.
///
/// Single-select: one correct answer and up to three wrong options.
/// Multi-select: two or three correct answers (capped by what exists) and
/// enough wrong options to reach five, at least one, capped by what exists.
pub fn build_options<R: Rng + ?Sized>(
    question: &Question,
    question_type: QuestionType,
    rng: &mut R,
) -> PresentedOptions {
    let correct_pool = question.correct_answers();
    let wrong_pool = question.wrong_options();

    let (correct, wrong_count) = match question_type {
        QuestionType::Single => {
            let correct: Vec<String> = correct_pool.choose(rng).cloned().into_iter().collect();
            (correct, SINGLE_WRONG_OPTIONS)
        }
        QuestionType::Multi => {
            let max = MULTI_MAX_CORRECT.min(correct_pool.len());
            let take = if max <= MULTI_MIN_CORRECT {
                max
            } else {
                rng.random_range(MULTI_MIN_CORRECT..=max)
            };
            let correct: Vec<String> = correct_pool.choose_multiple(rng, take).cloned().collect();
            let wrong_count = MULTI_TARGET_OPTIONS.saturating_sub(correct.len()).max(1);
            (correct, wrong_count)
        }
    };

    let wrongs = wrong_pool
        .choose_multiple(rng, wrong_count.min(wrong_pool.len()))
        .cloned();
    let mut options: Vec<String> = correct.iter().cloned().chain(wrongs).collect();
    options.shuffle(rng);

    PresentedOptions { options, correct }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn single_select_has_one_correct_and_three_wrongs() {
        let q = Question::new(
            "Q",
            strings(&["A1", "A2"]),
            strings(&["W1", "W2", "W3", "W4", "W5"]),
            "",
        )
        .unwrap();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let presented = build_options(&q, QuestionType::Single, &mut rng);
            assert_eq!(presented.correct_answers().len(), 1);
            assert_eq!(presented.len(), 4);
            let correct = &presented.correct_answers()[0];
            assert!(q.correct_answers().contains(correct));
            assert!(presented.options().contains(correct));
            let wrong = presented.options().iter().filter(|o| !presented.is_correct_option(o));
            assert_eq!(wrong.count(), 3);
        }
    }

    #[test]
    fn multi_select_samples_two_or_three_correct() {
        let q = Question::new(
            "Q",
            strings(&["A1", "A2", "A3", "A4"]),
            strings(&["W1", "W2", "W3", "W4"]),
            "",
        )
        .unwrap();

        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let presented = build_options(&q, QuestionType::Multi, &mut rng);
            let k = presented.correct_answers().len();
            assert!((2..=3).contains(&k));
            assert_eq!(presented.len(), 5);
            for c in presented.correct_answers() {
                assert!(presented.options().contains(c));
            }
        }
    }

    #[test]
    fn scarce_wrong_options_are_all_used() {
        let q = Question::new("Q", strings(&["A1", "A2"]), strings(&["W1"]), "").unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let presented = build_options(&q, QuestionType::Multi, &mut rng);
        assert_eq!(presented.correct_answers().len(), 2);
        assert_eq!(presented.len(), 3);

        let presented = build_options(&q, QuestionType::Single, &mut rng);
        assert_eq!(presented.len(), 2);
    }

    #[test]
    fn multi_select_with_one_correct_answer_does_not_panic() {
        let q = Question::new("Q", strings(&["A1"]), strings(&["W1", "W2"]), "").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let presented = build_options(&q, QuestionType::Multi, &mut rng);
        assert_eq!(presented.correct_answers(), strings(&["A1"]).as_slice());
        assert_eq!(presented.len(), 3);
    }

    #[test]
    fn labels_run_alphabetically() {
        assert_eq!(option_label(0), 'A');
        assert_eq!(option_label(4), 'E');
        assert_eq!(option_label(40), '?');
    }
}
