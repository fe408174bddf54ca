//! Seeded stratified train/test split.
//!
//! Stratification is mandatory here: the spectrum taxonomy is heavily
//! imbalanced, and an unstratified split on a small corpus can produce a
//! test partition missing a class entirely, invalidating every reported
//! metric.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::seq::SliceRandom;

/// Split indices `0..y.len()` into `(train, test)` preserving each class's
/// proportion in the test partition to within one sample.
///
/// Classes with a single example stay in the training partition. Both index
/// lists come back sorted; the shuffle only decides membership.
pub fn stratified_split(y: &[usize], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    // BTreeMap keeps class iteration order stable so one seeded rng stream
    // yields the same split every run.
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &class) in y.iter().enumerate() {
        by_class.entry(class).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut indices) in by_class {
        let n = indices.len();
        indices.shuffle(&mut rng);

        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };

        test.extend(indices.drain(..n_test));
        train.extend(indices);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
