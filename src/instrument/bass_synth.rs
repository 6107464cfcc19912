//! Bass synthesizer: sawtooth plus sub-octave square through a low-pass.

use crate::music::Layer;

use super::envelope::{Automation, SILENCE};
use super::filter::Filter;
use super::oscillator::{pitch_to_freq, Waveform};
use super::voice::{Partial, Route, Voice};

/// Total length of a bass note.
pub const BASS_LENGTH: f64 = 0.4;

/// Low-pass cutoff for the bass at `intensity`; opens up as the music builds.
pub fn bass_cutoff(intensity: f64) -> f64 {
    300.0 + intensity * 500.0
}

/// One bass note at `pitch`.
///
/// Two-stage decay: a fast drop from the attack to a body level, then a
/// slower tail that reaches silence at [`BASS_LENGTH`].
pub fn bass(start: f64, pitch: i32, intensity: f64) -> Voice {
    let freq = pitch_to_freq(pitch);
    let envelope = Automation::constant(0.5)
        .exp_to(0.08, 0.25)
        .exp_to(BASS_LENGTH, SILENCE);

    let saw = Partial::tone(Waveform::Saw, Automation::constant(freq)).gain(envelope.clone());
    let sub = Partial::tone(Waveform::Square, Automation::constant(freq / 2.0))
        .gain(envelope.scaled(0.5));

    Voice::new(Route::Layer(Layer::Bass), start)
        .with(saw)
        .with(sub)
        .filtered(Filter::lowpass(Automation::constant(bass_cutoff(intensity))))
}
