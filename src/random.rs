//! Random number generation and weighted sampling.
//!
//! Provides seeded RNG construction and weighted random sampling over
//! integer weights, with and without replacement.
//!
//! # Reproducibility
//!
//! For reproducible selections, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform, and every sampler here consumes the generator
//! in a fixed order.

use rand::Rng;

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++) for high performance.
/// The sequence is deterministic for a given seed on the same platform.
///
/// # Examples
/// ```
/// use cell_quota::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Selects a random index weighted by the given integer weights.
///
/// Uses the cumulative-weight method: a threshold is drawn uniformly
/// from `[0, total)` and the first index whose running sum exceeds it
/// is returned. Zero-weight entries are never selected.
///
/// # Complexity
/// Time: O(n) per sample
///
/// # Returns
/// - `None` if `weights` is empty or all weights are zero.
///
/// # Examples
/// ```
/// use cell_quota::random::{create_rng, weighted_choose};
/// let mut rng = create_rng(42);
/// let weights = [1, 2, 3]; // index 2 is most likely
/// let idx = weighted_choose(&weights, &mut rng).unwrap();
/// assert!(idx < 3);
/// ```
pub fn weighted_choose<R: Rng + ?Sized>(weights: &[u64], rng: &mut R) -> Option<usize> {
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return None;
    }

    let threshold = rng.random_range(0..total);
    let mut cumulative = 0u64;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return Some(i);
        }
    }

    // Unreachable for integer weights: the final cumulative equals total.
    None
}

/// Draws `k` distinct indices, each step weighted by the weights of the
/// entries not yet drawn.
///
/// # Algorithm
/// Successive weighted draws with removal and renormalization: after an
/// index is drawn, its weight is removed from the pool and the next draw
/// is proportional to the remaining weights only. The result is in draw
/// order, so drawing `k == weights.len()` yields a weighted permutation.
///
/// When all remaining weights are equal this degenerates to uniform
/// sampling without replacement.
///
/// # Complexity
/// Time: O(n·k), Space: O(n)
///
/// # Returns
/// - `None` if `k > weights.len()`, or if the remaining weight reaches
///   zero before `k` indices have been drawn (including an all-zero pool).
/// - `Some(vec![])` if `k == 0`.
///
/// # Examples
/// ```
/// use cell_quota::random::{create_rng, sample_without_replacement};
/// let mut rng = create_rng(7);
/// let drawn = sample_without_replacement(&[5, 1, 1, 3], 3, &mut rng).unwrap();
/// assert_eq!(drawn.len(), 3);
/// let mut sorted = drawn.clone();
/// sorted.sort();
/// sorted.dedup();
/// assert_eq!(sorted.len(), 3);
///
/// assert!(sample_without_replacement(&[0, 0], 1, &mut rng).is_none());
/// ```
pub fn sample_without_replacement<R: Rng + ?Sized>(
    weights: &[u64],
    k: usize,
    rng: &mut R,
) -> Option<Vec<usize>> {
    if k > weights.len() {
        return None;
    }

    let mut indices: Vec<usize> = (0..weights.len()).collect();
    let mut remaining: Vec<u64> = weights.to_vec();
    let mut drawn = Vec::with_capacity(k);

    for _ in 0..k {
        let pos = weighted_choose(&remaining, rng)?;
        drawn.push(indices.remove(pos));
        remaining.remove(pos);
    }

    Some(drawn)
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn weighted_choose_returns_positive_index(
            seed in 0_u64..10000,
            weights in proptest::collection::vec(0_u64..10, 1..20),
        ) {
            let has_positive = weights.iter().any(|&w| w > 0);
            let mut rng = create_rng(seed);
            let result = weighted_choose(&weights, &mut rng);
            if has_positive {
                let idx = result.unwrap();
                prop_assert!(idx < weights.len());
                prop_assert!(weights[idx] > 0);
            } else {
                prop_assert!(result.is_none());
            }
        }

        #[test]
        fn sample_draws_distinct_indices(
            seed in 0_u64..10000,
            weights in proptest::collection::vec(1_u64..50, 1..40),
            frac in 0.0_f64..1.0,
        ) {
            let k = ((weights.len() as f64) * frac) as usize;
            let mut rng = create_rng(seed);
            let drawn = sample_without_replacement(&weights, k, &mut rng).unwrap();
            prop_assert_eq!(drawn.len(), k);
            let mut sorted = drawn.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), k);
            prop_assert!(drawn.iter().all(|&i| i < weights.len()));
        }
    }
}
