//! Commands sent from the control side to the audio thread via ring buffer.

use crate::instrument::Voice;
use crate::music::LayerMix;

use super::output::SweepDirection;

#[derive(Debug)]
pub enum AudioCommand {
    /// Start rendering a voice. Boxed so finished voices can travel back to
    /// the control side for deallocation without copying.
    Voice(Box<Voice>),

    /// New target gains for the layer buses.
    SetLayerGains(LayerMix),

    /// New master gain (0.0 to 1.0).
    SetMasterGain(f32),

    /// Sweep the master low-pass filter.
    Sweep(SweepDirection),
}
