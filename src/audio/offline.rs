//! Offline backend: drives an [`OutputChain`] without a device.
//!
//! Everything sent to it is recorded, and the chain can be rendered on demand,
//! which makes it the backend for tests and for bouncing audio to a buffer.
//! Clones share the same state, so a test can keep one clone for inspection
//! while the engine owns another.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::instrument::{Route, Voice};
use crate::music::LayerMix;

use super::command::AudioCommand;
use super::output::{OutputChain, SweepDirection, DEFAULT_MAX_VOICES};
use super::{AudioBackend, AudioError};

/// A voice as it was handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledVoice {
    pub route: Route,
    pub start: f64,
    pub stop: f64,
}

struct OfflineState {
    chain: OutputChain,
    scheduled: Vec<ScheduledVoice>,
    sweeps: Vec<SweepDirection>,
    mix: Option<LayerMix>,
    master_gain: Option<f32>,
}

#[derive(Clone)]
pub struct OfflineBackend {
    state: Arc<Mutex<OfflineState>>,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_max_voices(sample_rate, DEFAULT_MAX_VOICES)
    }

    pub fn with_max_voices(sample_rate: u32, max_voices: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(OfflineState {
                chain: OutputChain::new(sample_rate, max_voices),
                scheduled: Vec::new(),
                sweeps: Vec::new(),
                mix: None,
                master_gain: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OfflineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Render `frames` mono frames through the chain, advancing the clock.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.lock().chain.render(&mut out, drop);
        out
    }

    /// Advance the clock by `seconds`, discarding the audio.
    pub fn advance(&self, seconds: f64) {
        let frames = {
            let state = self.lock();
            (seconds * state.chain.sample_rate() as f64).round() as usize
        };
        self.render(frames);
    }

    /// Every voice scheduled so far, in order.
    pub fn scheduled(&self) -> Vec<ScheduledVoice> {
        self.lock().scheduled.clone()
    }

    /// Number of scheduled voices routed to `route`.
    pub fn count(&self, route: Route) -> usize {
        self.lock()
            .scheduled
            .iter()
            .filter(|v| v.route == route)
            .count()
    }

    pub fn sweeps(&self) -> Vec<SweepDirection> {
        self.lock().sweeps.clone()
    }

    /// Most recent layer mix, if any.
    pub fn last_mix(&self) -> Option<LayerMix> {
        self.lock().mix
    }

    pub fn master_gain(&self) -> Option<f32> {
        self.lock().master_gain
    }

    /// Voices currently rendering in the chain.
    pub fn active_voices(&self) -> usize {
        self.lock().chain.voice_count()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.scheduled.clear();
        state.sweeps.clear();
        state.mix = None;
        state.master_gain = None;
    }
}

impl AudioBackend for OfflineBackend {
    fn current_time(&self) -> f64 {
        self.lock().chain.time()
    }

    fn schedule(&mut self, voice: Voice) -> Result<(), AudioError> {
        let mut state = self.lock();
        state.scheduled.push(ScheduledVoice {
            route: voice.route(),
            start: voice.start(),
            stop: voice.stop_time(),
        });
        // A voice over the cap is simply dropped, as on the audio thread.
        let _ = state.chain.apply(AudioCommand::Voice(Box::new(voice)));
        Ok(())
    }

    fn set_layer_gains(&mut self, mix: LayerMix) -> Result<(), AudioError> {
        let mut state = self.lock();
        state.mix = Some(mix);
        state.chain.apply(AudioCommand::SetLayerGains(mix));
        Ok(())
    }

    fn set_master_gain(&mut self, gain: f32) -> Result<(), AudioError> {
        let mut state = self.lock();
        state.master_gain = Some(gain);
        state.chain.apply(AudioCommand::SetMasterGain(gain));
        Ok(())
    }

    fn sweep_filter(&mut self, direction: SweepDirection) -> Result<(), AudioError> {
        let mut state = self.lock();
        state.sweeps.push(direction);
        state.chain.apply(AudioCommand::Sweep(direction));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::kick;
    use crate::music::Layer;

    #[test]
    fn records_and_renders() {
        let mut backend = OfflineBackend::new(44100);
        backend.set_layer_gains(LayerMix::compute(1.0, 1.0)).unwrap();
        backend.schedule(kick(0.0)).unwrap();

        assert_eq!(backend.count(Route::Layer(Layer::Kick)), 1);
        assert_eq!(backend.active_voices(), 1);

        let out = backend.render(44100 / 2);
        assert!(out.iter().any(|s| s.abs() > 0.01));
        assert_eq!(backend.active_voices(), 0);
    }

    #[test]
    fn clones_share_state() {
        let inspector = OfflineBackend::new(44100);
        let mut owned = inspector.clone();
        owned.sweep_filter(SweepDirection::Down).unwrap();
        owned.set_master_gain(0.4).unwrap();
        assert_eq!(inspector.sweeps(), vec![SweepDirection::Down]);
        assert_eq!(inspector.master_gain(), Some(0.4));
    }

    #[test]
    fn advance_moves_the_clock() {
        let backend = OfflineBackend::new(1000);
        assert_eq!(backend.current_time(), 0.0);
        backend.advance(1.5);
        assert!((backend.current_time() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn clear_forgets_history() {
        let mut backend = OfflineBackend::new(44100);
        backend.schedule(kick(0.0)).unwrap();
        backend.clear();
        assert!(backend.scheduled().is_empty());
        assert_eq!(backend.last_mix(), None);
    }
}
