//! Musical clock: sixteenth-note steps, bars, sections and chord position.
//!
//! The clock only counts; wall-clock timing lives in the scheduler, which asks
//! [`step_duration`] for the length of the next step at the current tempo.

use std::time::Duration;

/// Sixteenth-note steps per bar.
pub const STEPS_PER_BAR: u32 = 16;

/// Bars per section (arpeggio pattern rotation period).
pub const BARS_PER_SECTION: u64 = 4;

/// Position of the music clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockState {
    /// Step within the bar, `0..STEPS_PER_BAR`.
    pub beat: u32,
    pub bar: u64,
    pub section: u64,
    /// Index into the active progression.
    pub chord_index: usize,
}

impl ClockState {
    /// Clock at the very start: everything zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one step.
    ///
    /// On bar wrap the chord index cycles modulo `progression_len`, and every
    /// [`BARS_PER_SECTION`] bars the section advances. Returns `true` when a
    /// bar boundary was crossed.
    pub fn advance(&mut self, progression_len: usize) -> bool {
        self.beat = (self.beat + 1) % STEPS_PER_BAR;
        if self.beat != 0 {
            return false;
        }

        self.bar += 1;
        self.chord_index = (self.chord_index + 1) % progression_len.max(1);
        if self.bar % BARS_PER_SECTION == 0 {
            self.section += 1;
        }
        true
    }

    /// Whether the current step starts a bar.
    pub fn is_downbeat(&self) -> bool {
        self.beat == 0
    }
}

/// Seconds per sixteenth-note step at `tempo_bpm`.
pub fn step_seconds(tempo_bpm: f64) -> f64 {
    60.0 / tempo_bpm / 4.0
}

/// Duration of one sixteenth-note step at `tempo_bpm`.
pub fn step_duration(tempo_bpm: f64) -> Duration {
    Duration::from_secs_f64(step_seconds(tempo_bpm))
}
