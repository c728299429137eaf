use rand::Rng;

use crate::model::{DrawnQuestion, ProgressMap, QuestionBank, QuestionIndex, QuestionType, StudyMode};

/// Default probability of drawing a single-select question on each pick.
pub const SINGLE_WEIGHT: f64 = 0.7;

/// Indices of `bank` whose stored streak satisfies the mode's predicate.
#[must_use]
pub fn eligible_indices(
    bank: &QuestionBank,
    progress: &ProgressMap,
    mode: StudyMode,
) -> Vec<QuestionIndex> {
    bank.iter()
        .map(|(index, _)| index)
        .filter(|index| mode.admits(progress.streak(*index)))
        .collect()
}

/// Questions and stored progress for one question type of a chapter.
#[derive(Debug, Clone, Copy)]
pub struct TypePool<'a> {
    pub bank: &'a QuestionBank,
    pub progress: &'a ProgressMap,
}

/// Draws a round's batch from both question types of a chapter.
///
/// Each pick chooses a type by weight (falling back to the other type once one
/// runs dry) and then an index uniformly from that type's remaining pool.
/// Picked indices are removed immediately, so a batch never repeats a question.
#[derive(Debug, Clone)]
pub struct BatchSelector<'a> {
    mode: StudyMode,
    single: TypePool<'a>,
    multi: TypePool<'a>,
    single_weight: f64,
}

impl<'a> BatchSelector<'a> {
    #[must_use]
    pub fn new(mode: StudyMode, single: TypePool<'a>, multi: TypePool<'a>) -> Self {
        Self {
            mode,
            single,
            multi,
            single_weight: SINGLE_WEIGHT,
        }
    }

    /// Override the single-select weight. Values outside `[0, 1]` are clamped.
    #[must_use]
    pub fn with_single_weight(mut self, weight: f64) -> Self {
        self.single_weight = if weight.is_nan() {
            SINGLE_WEIGHT
        } else {
            weight.clamp(0.0, 1.0)
        };
        self
    }

    fn pool(&self, question_type: QuestionType) -> &TypePool<'a> {
        match question_type {
            QuestionType::Single => &self.single,
            QuestionType::Multi => &self.multi,
        }
    }

    /// Number of questions across both types the mode admits.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        QuestionType::ALL
            .iter()
            .map(|t| {
                let pool = self.pool(*t);
                eligible_indices(pool.bank, pool.progress, self.mode).len()
            })
            .sum()
    }

    /// Draw up to `questions_per_session` questions in presentation order.
    ///
    /// The result holds `min(questions_per_session, eligible)` items and is
    /// empty when nothing is eligible.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        questions_per_session: usize,
        rng: &mut R,
    ) -> Vec<DrawnQuestion> {
        let mut single_pool = eligible_indices(self.single.bank, self.single.progress, self.mode);
        let mut multi_pool = eligible_indices(self.multi.bank, self.multi.progress, self.mode);

        let target = questions_per_session.min(single_pool.len() + multi_pool.len());
        let mut batch = Vec::with_capacity(target);

        while batch.len() < target {
            let preferred = if rng.random_bool(self.single_weight) {
                QuestionType::Single
            } else {
                QuestionType::Multi
            };

            let chosen = [preferred, preferred.other()].into_iter().find(|t| match t {
                QuestionType::Single => !single_pool.is_empty(),
                QuestionType::Multi => !multi_pool.is_empty(),
            });
            let Some(chosen) = chosen else {
                break;
            };

            let pool = match chosen {
                QuestionType::Single => &mut single_pool,
                QuestionType::Multi => &mut multi_pool,
            };
            let pick = rng.random_range(0..pool.len());
            let index = pool.swap_remove(pick);

            if let Some(question) = self.pool(chosen).bank.get(index) {
                batch.push(DrawnQuestion::new(chosen, index, question.clone()));
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, Streak};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn bank(n: usize) -> QuestionBank {
        QuestionBank::from_questions((0..n).map(|i| {
            Question::new(
                format!("Q{i}"),
                vec![format!("A{i}"), format!("B{i}")],
                vec!["W1".to_owned(), "W2".to_owned()],
                "",
            )
            .unwrap()
        }))
    }

    fn progress_with(mastered: &[usize]) -> ProgressMap {
        mastered
            .iter()
            .map(|i| (QuestionIndex::new(*i), Streak::new(2)))
            .collect()
    }

    #[test]
    fn batch_size_is_bounded_by_setting_and_pool() {
        let singles = bank(4);
        let multis = bank(3);
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::LearnNew,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        );
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(selector.draw(5, &mut rng).len(), 5);
        assert_eq!(selector.draw(50, &mut rng).len(), 7);
        assert_eq!(selector.draw(0, &mut rng).len(), 0);
        assert_eq!(selector.eligible_count(), 7);
    }

    #[test]
    fn draws_never_repeat_a_question() {
        let singles = bank(10);
        let multis = bank(10);
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::LearnNew,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        );

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let batch = selector.draw(20, &mut rng);
            let unique: HashSet<_> = batch.iter().map(|d| (d.question_type, d.index)).collect();
            assert_eq!(unique.len(), batch.len());
            assert_eq!(batch.len(), 20);
        }
    }

    #[test]
    fn falls_back_to_the_only_non_empty_type() {
        let singles = bank(6);
        let multis = QuestionBank::default();
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::LearnNew,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        )
        .with_single_weight(0.0);
        let mut rng = StdRng::seed_from_u64(1);

        let batch = selector.draw(10, &mut rng);
        assert_eq!(batch.len(), 6);
        assert!(batch.iter().all(|d| d.question_type == QuestionType::Single));
    }

    #[test]
    fn falls_back_to_multi_when_no_single_is_eligible() {
        let singles = QuestionBank::default();
        let multis = bank(4);
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::LearnNew,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        )
        .with_single_weight(1.0);
        let mut rng = StdRng::seed_from_u64(2);

        let batch = selector.draw(10, &mut rng);
        assert_eq!(batch.len(), 4);
        assert!(batch.iter().all(|d| d.question_type == QuestionType::Multi));
    }

    #[test]
    fn single_share_follows_weight_when_both_pools_are_large() {
        let singles = bank(200);
        let multis = bank(200);
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::LearnNew,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        );

        let mut drawn = 0usize;
        let mut single = 0usize;
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let batch = selector.draw(100, &mut rng);
            drawn += batch.len();
            single += batch.iter().filter(|d| d.question_type == QuestionType::Single).count();
        }

        assert_eq!(drawn, 2000);
        let share = single as f64 / drawn as f64;
        assert!((0.65..=0.75).contains(&share), "single share was {share}");
    }

    #[test]
    fn modes_partition_by_mastery() {
        let singles = bank(4);
        let multis = bank(2);
        let single_progress = progress_with(&[0, 2]);
        let multi_progress = progress_with(&[1]);
        let pools = |mode| {
            BatchSelector::new(
                mode,
                TypePool { bank: &singles, progress: &single_progress },
                TypePool { bank: &multis, progress: &multi_progress },
            )
        };
        let mut rng = StdRng::seed_from_u64(3);

        let learn = pools(StudyMode::LearnNew).draw(10, &mut rng);
        assert_eq!(learn.len(), 3);
        assert!(learn.iter().all(|d| match d.question_type {
            QuestionType::Single => !single_progress.is_mastered(d.index),
            QuestionType::Multi => !multi_progress.is_mastered(d.index),
        }));

        let review = pools(StudyMode::ReviewOld).draw(10, &mut rng);
        assert_eq!(review.len(), 3);
    }

    #[test]
    fn nothing_eligible_yields_empty_batch() {
        let singles = bank(2);
        let multis = bank(1);
        let empty = ProgressMap::new();
        let selector = BatchSelector::new(
            StudyMode::ReviewOld,
            TypePool { bank: &singles, progress: &empty },
            TypePool { bank: &multis, progress: &empty },
        );
        let mut rng = StdRng::seed_from_u64(0);
        assert!(selector.draw(10, &mut rng).is_empty());
    }

    #[test]
    fn invalid_slots_are_never_eligible() {
        let q = Question::new("Q", vec!["A".to_owned()], Vec::new(), "").unwrap();
        let singles = QuestionBank::new(vec![None, Some(q)]);
        let empty = ProgressMap::new();
        let indices = eligible_indices(&singles, &empty, StudyMode::LearnNew);
        assert_eq!(indices, vec![QuestionIndex::new(1)]);
    }
}
