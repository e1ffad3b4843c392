use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};
use sha2::{Digest, Sha256};
use tracing::debug;

use exam_core::model::{Question, RunConfiguration, Seed, Selection};

use crate::error::SelectionError;

/// Pick the questions for one run.
///
/// Range runs take a contiguous slice in source order. Random runs shuffle an
/// index vector (seeded from the seed string when there is one) and take the
/// first `count`; `questions` itself is never reordered. A replay carries its
/// original selection, so it re-derives the same subset.
///
/// # Errors
///
/// Returns `SelectionError::OutOfBounds` if the configuration asks for more
/// questions than `questions` holds.
pub fn select(
    questions: &[Question],
    config: &RunConfiguration,
) -> Result<Vec<Question>, SelectionError> {
    let count = usize::try_from(config.count()).unwrap_or(usize::MAX);
    let available = questions.len();

    match config.selection() {
        Selection::Range { start } => {
            let start = usize::try_from(*start).unwrap_or(usize::MAX);
            let first = start.saturating_sub(1);
            let end = first.checked_add(count).filter(|&end| start > 0 && end <= available);
            let Some(end) = end else {
                return Err(SelectionError::OutOfBounds {
                    start,
                    count,
                    available,
                });
            };
            debug!(start, count, "selected question range");
            Ok(questions[first..end].to_vec())
        }
        Selection::Random { seed } => {
            if count > available {
                return Err(SelectionError::OutOfBounds {
                    start: 1,
                    count,
                    available,
                });
            }
            let order = shuffled_indices(available, seed.as_ref());
            debug!(count, seeded = seed.is_some(), "selected random questions");
            Ok(order
                .into_iter()
                .take(count)
                .map(|idx| questions[idx].clone())
                .collect())
        }
    }
}

/// A permutation of `0..len`; deterministic for a given seed.
#[must_use]
pub fn shuffled_indices(len: usize, seed: Option<&Seed>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    match seed {
        Some(seed) => order.shuffle(&mut seeded_rng(seed)),
        None => order.shuffle(&mut rng()),
    }
    order
}

fn seeded_rng(seed: &Seed) -> StdRng {
    let digest: [u8; 32] = Sha256::digest(seed.as_str().as_bytes()).into();
    StdRng::from_seed(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        Mode, QuestionDraft, QuestionKind, QuestionOrdinal, RunConfigDraft, SelectionMethod,
    };

    fn build_questions(n: u32) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                QuestionDraft {
                    ordinal: QuestionOrdinal::new(i),
                    text: format!("Q{i}"),
                    kind: QuestionKind::SingleSelect,
                    options: vec!["a".into(), "b".into()],
                    correct_response: "1".into(),
                    explanation: None,
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    fn ordinals(questions: &[Question]) -> Vec<u32> {
        questions.iter().map(|q| q.ordinal().value()).collect()
    }

    fn random_config(count: u32, seed: Option<&str>, total: usize) -> RunConfiguration {
        RunConfigDraft {
            method: SelectionMethod::Random,
            mode: Mode::Practice,
            count: Some(count),
            range_start: None,
            seed: seed.map(str::to_string),
        }
        .validate(total)
        .unwrap()
    }

    #[test]
    fn range_takes_contiguous_slice() {
        let questions = build_questions(5);
        let config = RunConfigDraft {
            method: SelectionMethod::Range,
            mode: Mode::Exam,
            count: Some(3),
            range_start: Some(2),
            seed: None,
        }
        .validate(questions.len())
        .unwrap();

        let selected = select(&questions, &config).unwrap();
        assert_eq!(ordinals(&selected), vec![2, 3, 4]);
    }

    #[test]
    fn range_beyond_input_is_an_error() {
        let config = RunConfigDraft {
            method: SelectionMethod::Range,
            mode: Mode::Exam,
            count: Some(3),
            range_start: Some(3),
            seed: None,
        }
        .validate(5)
        .unwrap();

        let err = select(&build_questions(4), &config).unwrap_err();
        assert_eq!(
            err,
            SelectionError::OutOfBounds {
                start: 3,
                count: 3,
                available: 4
            }
        );
    }

    #[test]
    fn seeded_random_is_reproducible_and_leaves_input_alone() {
        let questions = build_questions(10);
        let before = ordinals(&questions);
        let config = random_config(2, Some("42"), questions.len());

        let first = select(&questions, &config).unwrap();
        let second = select(&questions, &config).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(ordinals(&first), ordinals(&second));
        assert_eq!(ordinals(&questions), before);
    }

    #[test]
    fn replay_reuses_the_seeded_subset() {
        let questions = build_questions(10);
        let config = random_config(4, Some("exam day"), questions.len());
        let fresh = select(&questions, &config).unwrap();
        let replay = select(&questions, &config.clone().into_replay()).unwrap();
        assert_eq!(ordinals(&fresh), ordinals(&replay));
    }

    #[test]
    fn unseeded_random_picks_distinct_questions() {
        let questions = build_questions(10);
        let selected = select(&questions, &random_config(10, None, 10)).unwrap();
        let mut picked = ordinals(&selected);
        picked.sort_unstable();
        assert_eq!(picked, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn shuffled_indices_is_a_permutation() {
        let seed = Seed::parse("abc").unwrap();
        let mut order = shuffled_indices(7, Some(&seed));
        assert_eq!(order, shuffled_indices(7, Some(&seed)));
        order.sort_unstable();
        assert_eq!(order, (0..7).collect::<Vec<_>>());
    }
}
