//! Drum kit: kick, hi-hat and snare voices built from oscillators and noise.
//!
//! Noise partials take their seed from the caller's RNG, so a seeded engine
//! renders identical hits.

use rand::Rng;

use crate::music::Layer;

use super::envelope::Automation;
use super::filter::Filter;
use super::oscillator::Waveform;
use super::voice::{Partial, Route, Voice};

/// Kick: sine swept 150 -> 40 Hz with a short square click on top.
pub fn kick(start: f64) -> Voice {
    let body = Partial::tone(
        Waveform::Sine,
        Automation::constant(150.0).exp_to(0.1, 40.0),
    )
    .gain(Automation::decay(1.0, 0.3));

    let click = Partial::tone(Waveform::Square, Automation::constant(1000.0))
        .gain(Automation::decay(0.25, 0.02));

    Voice::new(Route::Layer(Layer::Kick), start)
        .with(body)
        .with(click)
}

/// Hi-hat: three detuned squares through a 7 kHz high-pass.
///
/// Accented hits are louder with a shorter tail.
pub fn hihat<R: Rng + ?Sized>(start: f64, accent: bool, rng: &mut R) -> Voice {
    let (peak, tail) = if accent { (0.3, 0.04) } else { (0.18, 0.08) };

    let mut voice = Voice::new(Route::Layer(Layer::HiHat), start)
        .filtered(Filter::highpass(Automation::constant(7000.0)))
        .level(peak);
    for _ in 0..3 {
        let freq = rng.gen_range(3000.0..6000.0);
        voice = voice.with(
            Partial::tone(Waveform::Square, Automation::constant(freq))
                .gain(Automation::decay(1.0 / 3.0, tail)),
        );
    }
    voice
}

/// Snare: falling triangle body plus high-passed noise.
pub fn snare<R: Rng + ?Sized>(start: f64, rng: &mut R) -> Voice {
    let body = Partial::tone(
        Waveform::Triangle,
        Automation::constant(200.0).exp_to(0.1, 100.0),
    )
    .gain(Automation::decay(0.6, 0.15));

    let rattle = Partial::noise(rng.gen())
        .filter(Filter::highpass(Automation::constant(1000.0)))
        .gain(Automation::decay(0.45, 0.12));

    Voice::new(Route::Layer(Layer::Snare), start)
        .with(body)
        .with(rattle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SR: u32 = 44100;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn kick_shape() {
        let v = kick(2.0);
        assert_eq!(v.route(), Route::Layer(Layer::Kick));
        assert_eq!(v.start(), 2.0);
        assert!((v.duration() - 0.3).abs() < 1e-9);
        assert_eq!(v.partial_count(), 2);
    }

    #[test]
    fn kick_is_audible() {
        let out = kick(0.0).render_to_vec(SR);
        assert!(peak(&out) > 0.5);
    }

    #[test]
    fn hihat_accent_is_shorter_and_louder() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let accented = hihat(0.0, true, &mut rng);
        let plain = hihat(0.0, false, &mut rng);
        assert!(accented.duration() < plain.duration());
        assert_eq!(accented.partial_count(), 3);
        assert_eq!(plain.route(), Route::Layer(Layer::HiHat));
    }

    #[test]
    fn hihat_deterministic_for_seed() {
        let a = hihat(0.0, true, &mut ChaCha8Rng::seed_from_u64(9)).render_to_vec(SR);
        let b = hihat(0.0, true, &mut ChaCha8Rng::seed_from_u64(9)).render_to_vec(SR);
        assert_eq!(a, b);
    }

    #[test]
    fn snare_lasts_body_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let v = snare(0.0, &mut rng);
        assert!((v.duration() - 0.15).abs() < 1e-9);
        assert!(peak(&v.render_to_vec(SR)) > 0.1);
    }
}
