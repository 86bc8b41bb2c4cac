//! Seeded series for unit tests. ChaCha streams are stable across platforms
//! and `rand` releases, unlike `StdRng`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `n` draws of standard normal noise.
pub fn noise(seed: u64, n: usize) -> Vec<f64> {
    let mut rng = rng(seed);
    StandardNormal.sample_iter(&mut rng).take(n).collect()
}

/// Gaussian random walk starting from `start`.
pub fn random_walk(seed: u64, start: f64, n: usize) -> Vec<f64> {
    noise(seed, n)
        .into_iter()
        .scan(start, |level, e: f64| {
            *level += e;
            Some(*level)
        })
        .collect()
}
