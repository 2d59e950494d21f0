//! Seeded train/validation partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffles `items` with a seeded generator and splits off the validation
/// tail. `validation_fraction` is the share of rows held out; the count is
/// truncated, so small inputs may round the holdout down to nothing.
pub fn split_records<T>(mut items: Vec<T>, validation_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    let train_len = (items.len() as f64 * (1.0 - validation_fraction)) as usize;
    let validation = items.split_off(train_len.min(items.len()));
    (items, validation)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fraction_sets_the_holdout_size() {
        let (train, validation) = split_records((0..100).collect(), 0.25, 1);
        assert_eq!(train.len(), 75);
        assert_eq!(validation.len(), 25);
    }

    #[test]
    fn zero_fraction_keeps_everything_for_training() {
        let (train, validation) = split_records((0..10).collect(), 0.0, 1);
        assert_eq!(train.len(), 10);
        assert!(validation.is_empty());
    }

    #[test]
    fn partition_preserves_the_population() {
        let (mut train, validation) = split_records((0..50).collect(), 0.3, 9);
        train.extend(validation);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_partition() {
        let (a_train, a_val) = split_records((0..40).collect::<Vec<i32>>(), 0.2, 4);
        let (b_train, b_val) = split_records((0..40).collect::<Vec<i32>>(), 0.2, 4);
        assert_eq!(a_train, b_train);
        assert_eq!(a_val, b_val);
    }

    #[test]
    fn shuffle_actually_mixes_classes() {
        // A block-ordered input should not come back block-ordered.
        let items: Vec<i32> = (0..200).collect();
        let (train, _) = split_records(items, 0.2, 11);
        let front_all_low = train[..40].iter().all(|&v| v < 100);
        assert!(!front_all_low);
    }
}
