//! Pad synthesizer: sustained chords from sine and detuned triangle pairs.

use crate::music::Layer;

use super::envelope::Automation;
use super::filter::Filter;
use super::oscillator::{pitch_to_freq, Waveform};
use super::voice::{Partial, Route, Voice};

const ATTACK: f64 = 0.2;
const RELEASE: f64 = 0.3;
const DETUNE_RATIO: f64 = 1.004;
const CUTOFF_HZ: f64 = 1800.0;

/// A chord held for `hold` seconds (about one bar).
///
/// Level is split across chord tones so three- and four-note chords sit at
/// the same loudness.
pub fn pad(start: f64, chord: &[i32], hold: f64) -> Voice {
    let hold = hold.max(ATTACK + RELEASE);
    let per_note = 0.3 / chord.len().max(1) as f64;

    let mut voice = Voice::new(Route::Layer(Layer::Pad), start)
        .filtered(Filter::lowpass(Automation::constant(CUTOFF_HZ)));
    for &pitch in chord {
        let freq = pitch_to_freq(pitch);
        let envelope = Automation::swell(ATTACK, per_note, RELEASE, hold);
        voice = voice
            .with(Partial::tone(Waveform::Sine, Automation::constant(freq)).gain(envelope.clone()))
            .with(
                Partial::tone(Waveform::Triangle, Automation::constant(freq * DETUNE_RATIO))
                    .gain(envelope.scaled(0.6)),
            );
    }
    voice
}
