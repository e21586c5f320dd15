//! Which lines get corrupted, and how.
//!
//! Line indices are sampled from the `Chaos` stream of index 0 (never a data
//! line). Each selected line then draws its anomaly type from its own
//! `Chaos` stream, and the same stream drives the positions the anomaly
//! touches. Nothing depends on the order lines are written in.

use corpus_core::AnomalyKind;
use corpus_generator::{ItemSeeder, Stream};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeMap;

/// Per-line stream after the anomaly type draw, plus the drawn position in
/// `kinds`.
pub(crate) fn line_rng(seeder: &ItemSeeder, line: u64, kinds: usize) -> (usize, StdRng) {
    let mut rng = seeder.rng_for(Stream::Chaos, line);
    let choice = rng.gen_range(0..kinds.max(1));
    (choice, rng)
}

/// Pick `amount` distinct lines from `1..=total` and assign each an anomaly
/// type drawn uniformly from `kinds`.
///
/// `amount` is clamped to `total`. Returns an empty plan when `kinds` is
/// empty.
pub fn select_lines(
    total: u64,
    amount: u64,
    kinds: &[AnomalyKind],
    seed: u64,
) -> BTreeMap<u64, AnomalyKind> {
    let mut plan = BTreeMap::new();
    let amount = amount.min(total);
    if kinds.is_empty() || amount == 0 {
        return plan;
    }

    let seeder = ItemSeeder::new(seed);
    let mut rng = seeder.rng_for(Stream::Chaos, 0);
    for offset in index::sample(&mut rng, total as usize, amount as usize) {
        let line = offset as u64 + 1;
        let (choice, _) = line_rng(&seeder, line, kinds.len());
        plan.insert(line, kinds[choice]);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAT_KINDS: [AnomalyKind; 5] = [
        AnomalyKind::MixedDelimiters,
        AnomalyKind::Quotes,
        AnomalyKind::Columns,
        AnomalyKind::Eol,
        AnomalyKind::Encoding,
    ];

    #[test]
    fn test_exact_amount_of_distinct_lines() {
        let plan = select_lines(100, 10, &DAT_KINDS, 42);
        assert_eq!(plan.len(), 10);
        assert!(plan.keys().all(|line| (1..=100).contains(line)));
    }

    #[test]
    fn test_amount_is_independent_of_total() {
        for total in [5, 6, 50, 10_000] {
            assert_eq!(select_lines(total, 5, &DAT_KINDS, 1).len(), 5);
        }
    }

    #[test]
    fn test_amount_clamped_to_total() {
        let plan = select_lines(3, 10, &DAT_KINDS, 1);
        assert_eq!(plan.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_types_restricted_to_subset() {
        let subset = [AnomalyKind::Quotes, AnomalyKind::Eol];
        let plan = select_lines(1000, 200, &subset, 9);
        assert!(plan.values().all(|kind| subset.contains(kind)));
        // both types show up with 200 draws
        assert!(plan.values().any(|k| *k == AnomalyKind::Quotes));
        assert!(plan.values().any(|k| *k == AnomalyKind::Eol));
    }

    #[test]
    fn test_depends_only_on_seed_and_total() {
        assert_eq!(
            select_lines(500, 25, &DAT_KINDS, 77),
            select_lines(500, 25, &DAT_KINDS, 77)
        );
        assert_ne!(
            select_lines(500, 25, &DAT_KINDS, 77),
            select_lines(500, 25, &DAT_KINDS, 78)
        );
    }

    #[test]
    fn test_no_kinds_no_plan() {
        assert!(select_lines(100, 10, &[], 1).is_empty());
    }
}
