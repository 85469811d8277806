// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles labelled samples and splits them into two sets:
//   - Training set: used to fit the classifier
//   - Test set:     used to measure it on unseen messages
//
// Each label is split on its own, so both sets keep the label
// mix of the corpus even when it is small. The shuffle is
// seeded from config: same corpus + seed ⇒ same split.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom on a
// StdRng seeded with seed_from_u64.
//
// Reference: rand crate documentation

use indexmap::IndexMap;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Split `samples` into (train, test), stratified by `label_of`.
///
/// # Arguments
/// * `samples`       - All available samples (consumed)
/// * `label_of`      - Extracts the stratification key
/// * `test_fraction` - Share of each label moved to the test set, e.g. 0.25
/// * `seed`          - RNG seed; same seed ⇒ same split
pub fn stratified_split<T, F>(
    samples:       Vec<T>,
    label_of:      F,
    test_fraction: f64,
    seed:          u64,
) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> &str,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let fraction = test_fraction.clamp(0.0, 1.0);

    // Group by label in order of first appearance so the
    // result does not depend on hash ordering
    let mut groups: IndexMap<String, Vec<T>> = IndexMap::new();
    for sample in samples {
        let key = label_of(&sample).to_string();
        groups.entry(key).or_default().push(sample);
    }

    let mut train = Vec::new();
    let mut test  = Vec::new();

    for (_, mut group) in groups {
        group.shuffle(&mut rng);

        let n_test = ((group.len() as f64) * fraction).round() as usize;
        let n_test = n_test.min(group.len());

        // split_off(n) keeps [..n] in place and returns [n..]
        let rest = group.split_off(n_test);
        test.extend(group);
        train.extend(rest);
    }

    tracing::debug!(
        "Dataset split: {} training, {} test",
        train.len(),
        test.len()
    );

    (train, test)
}
