//! Waveforms and pitch conversion.

use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    /// Value at `phase` in cycles, `[0, 1)`. Output stays within `[-1, 1]`.
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square if phase < 0.5 => 1.0,
            Waveform::Square => -1.0,
            Waveform::Triangle => 1.0 - 4.0 * ((phase + 0.25).fract() - 0.5).abs(),
        }
    }
}

/// Pitch number to Hz, A4 = 69 = 440 Hz. Pitches below zero are allowed.
pub fn pitch_to_freq(pitch: i32) -> f64 {
    440.0 * ((pitch - 69) as f64 / 12.0).exp2()
}
