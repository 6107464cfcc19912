//! White noise source with a seeded RNG.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Uniform white noise in [-1.0, 1.0).
///
/// Each source owns its generator so a voice renders the same noise for the
/// same seed regardless of what else is playing.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: ChaCha8Rng,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Next noise sample.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }
}
