//! Dynamics: the master compressor and the output safety limiter.

/// Feed-forward peak compressor with a smoothed gain-reduction envelope (dB).
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    reduction_db: f32,
}

impl Compressor {
    pub const DEFAULT_THRESHOLD_DB: f32 = -24.0;
    pub const DEFAULT_RATIO: f32 = 12.0;
    pub const DEFAULT_ATTACK: f32 = 0.003;
    pub const DEFAULT_RELEASE: f32 = 0.25;

    pub fn new(
        threshold_db: f32,
        ratio: f32,
        attack: f32,
        release: f32,
        sample_rate: u32,
    ) -> Self {
        let sr = sample_rate as f32;
        Self {
            threshold_db,
            ratio: ratio.clamp(1.0, 20.0),
            attack_coeff: (-1.0 / (attack.max(0.0001) * sr)).exp(),
            release_coeff: (-1.0 / (release.max(0.001) * sr)).exp(),
            reduction_db: 0.0,
        }
    }

    /// Master bus settings: -24 dB threshold, 12:1, 3 ms attack, 250 ms release.
    pub fn master(sample_rate: u32) -> Self {
        Self::new(
            Self::DEFAULT_THRESHOLD_DB,
            Self::DEFAULT_RATIO,
            Self::DEFAULT_ATTACK,
            Self::DEFAULT_RELEASE,
            sample_rate,
        )
    }

    /// Current gain reduction in dB (non-negative).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let level_db = 20.0 * sample.abs().max(1e-10).log10();
        let over = level_db - self.threshold_db;
        let target = if over > 0.0 {
            over * (1.0 - 1.0 / self.ratio)
        } else {
            0.0
        };

        let coeff = if target > self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target;

        sample * 10f32.powf(-self.reduction_db / 20.0)
    }
}

/// Hard clamp at the very end of the chain.
#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    pub const DEFAULT_CEILING: f32 = 0.95;

    pub fn new(ceiling: f32) -> Self {
        Self {
            ceiling: ceiling.clamp(f32::EPSILON, 1.0),
        }
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Clamp a buffer in place. NaN samples become silence.
    pub fn process_block(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = if sample.is_nan() {
                0.0
            } else {
                sample.clamp(-self.ceiling, self.ceiling)
            };
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_signal_passes_untouched() {
        let mut comp = Compressor::master(44100);
        // -40 dB, well under threshold.
        for _ in 0..1000 {
            let out = comp.process(0.01);
            assert!((out - 0.01).abs() < 1e-6);
        }
        assert_eq!(comp.reduction_db(), 0.0);
    }

    #[test]
    fn loud_signal_is_reduced() {
        let mut comp = Compressor::master(44100);
        let mut out = 0.0;
        for _ in 0..44100 {
            out = comp.process(0.9);
        }
        assert!(comp.reduction_db() > 10.0);
        assert!(out < 0.2, "got {out}");
    }

    #[test]
    fn release_recovers() {
        let mut comp = Compressor::master(44100);
        for _ in 0..4410 {
            comp.process(0.9);
        }
        let loaded = comp.reduction_db();
        for _ in 0..44100 {
            comp.process(0.0);
        }
        assert!(comp.reduction_db() < loaded * 0.1);
    }

    #[test]
    fn ratio_is_clamped() {
        let mut comp = Compressor::new(-10.0, 0.5, 0.001, 0.1, 48000);
        // Ratio 1:1 means no reduction.
        for _ in 0..1000 {
            comp.process(1.0);
        }
        assert!(comp.reduction_db().abs() < 1e-4);
    }

    #[test]
    fn limiter_clamps_both_sides() {
        let limiter = Limiter::default();
        let mut buf = vec![0.0, 0.5, -0.5, 1.5, -1.5, f32::NAN];
        limiter.process_block(&mut buf);
        assert_eq!(buf, vec![0.0, 0.5, -0.5, 0.95, -0.95, 0.0]);
        assert_eq!(limiter.ceiling(), 0.95);
    }

    #[test]
    fn custom_ceiling() {
        let limiter = Limiter::new(0.5);
        let mut buf = vec![0.6, -0.6, 0.3];
        limiter.process_block(&mut buf);
        assert_eq!(buf, vec![0.5, -0.5, 0.3]);
    }
}
