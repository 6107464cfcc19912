//! Arpeggio synthesizer: short sawtooth plucks through a resonant low-pass.

use crate::music::Layer;

use super::envelope::Automation;
use super::filter::Filter;
use super::oscillator::{pitch_to_freq, Waveform};
use super::voice::{Partial, Route, Voice};

const RESONANCE: f32 = 6.0;

/// Resonant cutoff for the arpeggio at `intensity`.
pub fn arp_cutoff(intensity: f64) -> f64 {
    800.0 + intensity * 3200.0
}

/// One arpeggio note decaying over three sixteenth steps.
pub fn arp(start: f64, pitch: i32, intensity: f64, step_seconds: f64) -> Voice {
    let freq = pitch_to_freq(pitch);
    let note = Partial::tone(Waveform::Saw, Automation::constant(freq))
        .gain(Automation::decay(0.2, step_seconds * 3.0));

    Voice::new(Route::Layer(Layer::Arp), start)
        .with(note)
        .filtered(Filter::lowpass(Automation::constant(arp_cutoff(intensity))).with_q(RESONANCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn decays_over_three_steps() {
        let v = arp(0.0, 72, 0.5, 0.12);
        assert_approx_eq!(v.duration(), 0.36);
        assert_eq!(v.route(), Route::Layer(Layer::Arp));
    }

    #[test]
    fn cutoff_scales_with_intensity() {
        assert!(arp_cutoff(0.9) > arp_cutoff(0.4));
    }

    #[test]
    fn output_is_finite_at_high_resonance() {
        let out = arp(0.0, 84, 1.0, 0.1).render_to_vec(44100);
        assert!(out.iter().all(|s| s.is_finite()));
        assert!(out.iter().any(|s| s.abs() > 0.01));
    }
}
