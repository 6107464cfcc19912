//! Lead synthesizer: sawtooth with a closing filter sweep.

use crate::music::Layer;

use super::envelope::Automation;
use super::filter::Filter;
use super::oscillator::{pitch_to_freq, Waveform};
use super::voice::{Partial, Route, Voice};

pub const LEAD_LENGTH: f64 = 0.25;

pub fn lead(start: f64, pitch: i32) -> Voice {
    let freq = pitch_to_freq(pitch);
    let note = Partial::tone(Waveform::Saw, Automation::constant(freq))
        .gain(Automation::decay(0.25, LEAD_LENGTH));
    let sweep = Automation::constant(4000.0).exp_to(LEAD_LENGTH, 1000.0);

    Voice::new(Route::Layer(Layer::Lead), start)
        .with(note)
        .filtered(Filter::lowpass(sweep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lead_length() {
        let v = lead(0.5, 76);
        assert_approx_eq!(v.duration(), LEAD_LENGTH);
        assert_eq!(v.route(), Route::Layer(Layer::Lead));
    }

    #[test]
    fn renders() {
        let out = lead(0.0, 76).render_to_vec(44100);
        assert!(out.iter().any(|s| s.abs() > 0.01));
    }
}
