//! Conductor: the per-tick music generator.
//!
//! Owns the clock, the intensity controller, the active theme and the volume
//! settings. [`Conductor::tick`] performs one sixteenth-note step: smooth the
//! intensity, push the layer mix, schedule whatever voices this step calls
//! for, advance the clock and report how long to wait until the next step.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::audio::AudioBackend;
use crate::instrument::{arp, bass, hihat, kick, lead, pad, snare, Voice};
use crate::sfx::{IntensityNudge, SfxContext};

use super::clock::{step_duration, step_seconds, ClockState, STEPS_PER_BAR};
use super::intensity::Intensity;
use super::mix::LayerMix;
use super::rhythm::{arp_step, density_tier, hihat_accent, hits, Drum};
use super::theory::{theme, wrap_theme_index, ThemeBinding};

const BASS_OCTAVE: i32 = 2;
const PAD_OCTAVE: i32 = 4;
const ARP_OCTAVE: i32 = 5;
const LEAD_OCTAVE: i32 = 5;

/// Lead only plays above this intensity.
const LEAD_THRESHOLD: f64 = 0.6;
const LEAD_PROBABILITY: f64 = 0.3;

/// Master, music and effects levels, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volumes {
    pub master: f64,
    pub music: f64,
    pub sfx: f64,
}

impl Volumes {
    pub fn new(master: f64, music: f64, sfx: f64) -> Self {
        Self {
            master: clamp_unit(master),
            music: clamp_unit(music),
            sfx: clamp_unit(sfx),
        }
    }

    /// Level applied to the layer buses.
    pub fn music_level(&self) -> f64 {
        self.music * self.master
    }

    /// Level applied to one-shot effects.
    pub fn sfx_level(&self) -> f64 {
        self.sfx * self.master
    }
}

impl Default for Volumes {
    fn default() -> Self {
        Self::new(0.7, 0.6, 0.8)
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub struct Conductor {
    theme_index: usize,
    clock: ClockState,
    intensity: Intensity,
    volumes: Volumes,
    playing: bool,
}

impl Conductor {
    pub fn new(theme_index: usize, volumes: Volumes) -> Self {
        Self {
            theme_index: wrap_theme_index(theme_index),
            clock: ClockState::new(),
            intensity: Intensity::new(),
            volumes,
            playing: false,
        }
    }

    /// Begin playing from the top. Returns `false` if already playing.
    pub fn start(&mut self) -> bool {
        if self.playing {
            return false;
        }
        self.playing = true;
        self.clock = ClockState::new();
        self.intensity.reset();
        info!(theme = self.theme().display_name, "music started");
        true
    }

    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        self.playing = false;
        info!(bar = self.clock.bar, "music stopped");
        true
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn theme(&self) -> &'static ThemeBinding {
        theme(self.theme_index)
    }

    pub fn theme_index(&self) -> usize {
        self.theme_index
    }

    /// Select a theme, wrapping out-of-range indices. Tempo and harmony apply
    /// from the next tick.
    pub fn set_theme(&mut self, index: usize) {
        self.theme_index = wrap_theme_index(index);
        debug!(
            index = self.theme_index,
            theme = self.theme().display_name,
            "theme selected"
        );
    }

    pub fn clock(&self) -> ClockState {
        self.clock
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn set_intensity_target(&mut self, value: f64) {
        self.intensity.set_target(value);
    }

    pub fn apply_nudge(&mut self, nudge: IntensityNudge) {
        match nudge {
            IntensityNudge::Unchanged => {}
            IntensityNudge::Raise(delta) => self.intensity.raise(delta),
            IntensityNudge::Saturate => self.intensity.saturate(),
        }
    }

    pub fn volumes(&self) -> Volumes {
        self.volumes
    }

    pub fn set_volumes(&mut self, volumes: Volumes) {
        self.volumes = volumes;
    }

    /// Duration of one step at the current theme's tempo.
    pub fn step_duration(&self) -> Duration {
        step_duration(self.theme().tempo_bpm)
    }

    /// Musical state for a sound effect starting at `start`.
    pub fn sfx_context(&self, start: f64) -> SfxContext<'static> {
        SfxContext {
            start,
            theme: self.theme(),
            chord_index: self.clock.chord_index,
            intensity: self.intensity.current(),
            volume: self.volumes.sfx_level() as f32,
        }
    }

    /// Run one step and return the delay until the next one.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        backend: &mut dyn AudioBackend,
        rng: &mut R,
    ) -> Duration {
        let theme = self.theme();
        let now = backend.current_time();
        let step = step_seconds(theme.tempo_bpm);
        let beat = self.clock.beat;

        self.intensity.smooth();
        let i = self.intensity.current();

        let mix = LayerMix::compute(i, self.volumes.music_level());
        if let Err(e) = backend.set_layer_gains(mix) {
            debug!("layer mix dropped: {e}");
        }

        let tier = density_tier(i);
        if hits(Drum::Kick, tier, beat) {
            send(backend, kick(now));
        }
        if hits(Drum::HiHat, tier, beat) {
            send(backend, hihat(now, hihat_accent(beat), rng));
        }
        if hits(Drum::Snare, tier, beat) {
            send(backend, snare(now, rng));
        }

        if beat % 4 == 0 {
            let root = theme.resolve_chord(self.clock.chord_index, BASS_OCTAVE)[0];
            send(backend, bass(now, root, i));
        }

        let suppressed = beat % 2 == 1 && rng.gen_bool(0.5);
        if !suppressed {
            let chord = theme.resolve_chord(self.clock.chord_index, ARP_OCTAVE);
            let pitch = chord[arp_step(self.clock.section, beat, chord.len())];
            send(backend, arp(now, pitch, i, step));
        }

        if beat == 0 {
            let chord = theme.resolve_chord(self.clock.chord_index, PAD_OCTAVE);
            send(backend, pad(now, &chord, step * STEPS_PER_BAR as f64));
        }

        if i > LEAD_THRESHOLD && beat % 2 == 0 && rng.gen_bool(LEAD_PROBABILITY) {
            let chord = theme.resolve_chord(self.clock.chord_index, LEAD_OCTAVE);
            let pitch = chord[rng.gen_range(0..chord.len())];
            send(backend, lead(now, pitch));
        }

        self.clock.advance(theme.progression.len());
        step_duration(theme.tempo_bpm)
    }
}

fn send(backend: &mut dyn AudioBackend, voice: Voice) {
    if let Err(e) = backend.schedule(voice) {
        debug!("voice dropped: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;
    use crate::instrument::Route;
    use crate::music::Layer;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn playing(theme_index: usize) -> (Conductor, OfflineBackend, ChaCha8Rng) {
        let mut conductor = Conductor::new(theme_index, Volumes::new(1.0, 1.0, 1.0));
        conductor.start();
        (conductor, OfflineBackend::new(8000), ChaCha8Rng::seed_from_u64(7))
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut c = Conductor::new(0, Volumes::default());
        assert!(c.start());
        assert!(!c.start());
        assert!(c.stop());
        assert!(!c.stop());
    }

    #[test]
    fn start_resets_clock_and_intensity() {
        let (mut c, mut backend, mut rng) = playing(0);
        c.set_intensity_target(1.0);
        for _ in 0..40 {
            c.tick(&mut backend, &mut rng);
        }
        c.stop();
        c.start();
        assert_eq!(c.clock(), ClockState::new());
        assert_approx_eq!(c.intensity().current(), 0.3);
        assert_approx_eq!(c.intensity().target(), 0.3);
    }

    #[test]
    fn tick_returns_step_at_theme_tempo() {
        let (mut c, mut backend, mut rng) = playing(0);
        let delay = c.tick(&mut backend, &mut rng);
        assert_eq!(delay, step_duration(125.0));
        c.set_theme(2);
        let delay = c.tick(&mut backend, &mut rng);
        assert_eq!(delay, step_duration(140.0));
    }

    #[test]
    fn tick_smooths_intensity_and_pushes_mix() {
        let (mut c, mut backend, mut rng) = playing(0);
        c.set_intensity_target(1.0);
        c.tick(&mut backend, &mut rng);
        let i = c.intensity().current();
        assert_approx_eq!(i, 0.3 + 0.7 * 0.02);
        assert_eq!(backend.last_mix(), Some(LayerMix::compute(i, 1.0)));
    }

    #[test]
    fn downbeat_schedules_kick_bass_and_pad() {
        let (mut c, mut backend, mut rng) = playing(0);
        c.tick(&mut backend, &mut rng);
        assert_eq!(backend.count(Route::Layer(Layer::Kick)), 1);
        assert_eq!(backend.count(Route::Layer(Layer::Bass)), 1);
        assert_eq!(backend.count(Route::Layer(Layer::Pad)), 1);
        // Arp is never suppressed on even beats.
        assert_eq!(backend.count(Route::Layer(Layer::Arp)), 1);
    }

    #[test]
    fn bass_every_fourth_step_pad_once_per_bar() {
        let (mut c, mut backend, mut rng) = playing(0);
        for _ in 0..(STEPS_PER_BAR * 2) {
            c.tick(&mut backend, &mut rng);
        }
        assert_eq!(backend.count(Route::Layer(Layer::Bass)), 8);
        assert_eq!(backend.count(Route::Layer(Layer::Pad)), 2);
        let arps = backend.count(Route::Layer(Layer::Arp));
        assert!((16..=32).contains(&arps));
    }

    #[test]
    fn no_lead_at_low_intensity() {
        let (mut c, mut backend, mut rng) = playing(0);
        for _ in 0..256 {
            c.tick(&mut backend, &mut rng);
        }
        assert_eq!(backend.count(Route::Layer(Layer::Lead)), 0);
    }

    #[test]
    fn lead_appears_at_high_intensity() {
        let (mut c, mut backend, mut rng) = playing(0);
        c.set_intensity_target(1.0);
        for _ in 0..512 {
            c.tick(&mut backend, &mut rng);
        }
        assert!(c.intensity().current() > LEAD_THRESHOLD);
        assert!(backend.count(Route::Layer(Layer::Lead)) > 0);
    }

    #[test]
    fn percussion_density_follows_tier() {
        let (mut c, mut backend, mut rng) = playing(0);
        for _ in 0..STEPS_PER_BAR {
            c.tick(&mut backend, &mut rng);
        }
        // Intensity 0.3 is tier 0: four hats per bar, one snare.
        assert_eq!(backend.count(Route::Layer(Layer::HiHat)), 4);
        assert_eq!(backend.count(Route::Layer(Layer::Snare)), 1);
    }

    #[test]
    fn clock_advances_with_progression() {
        let (mut c, mut backend, mut rng) = playing(0);
        for _ in 0..(STEPS_PER_BAR * 5) {
            c.tick(&mut backend, &mut rng);
        }
        let clock = c.clock();
        assert_eq!(clock.beat, 0);
        assert_eq!(clock.bar, 5);
        assert_eq!(clock.section, 1);
        assert_eq!(clock.chord_index, 1);
    }

    #[test]
    fn seeded_runs_schedule_identically() {
        let run = || {
            let (mut c, mut backend, mut rng) = playing(3);
            c.set_intensity_target(0.9);
            for _ in 0..200 {
                c.tick(&mut backend, &mut rng);
            }
            backend.scheduled()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn nudges_raise_target() {
        let mut c = Conductor::new(0, Volumes::default());
        c.apply_nudge(IntensityNudge::Raise(0.1));
        assert_approx_eq!(c.intensity().target(), 0.4);
        c.apply_nudge(IntensityNudge::Saturate);
        assert_approx_eq!(c.intensity().target(), 1.0);
        c.apply_nudge(IntensityNudge::Unchanged);
        assert_approx_eq!(c.intensity().target(), 1.0);
    }

    #[test]
    fn theme_wraps() {
        let mut c = Conductor::new(10, Volumes::default());
        assert_eq!(c.theme_index(), 2);
        c.set_theme(99);
        assert_eq!(c.theme_index(), 3);
    }

    #[test]
    fn volumes_clamp() {
        let v = Volumes::new(2.0, -1.0, f64::NAN);
        assert_eq!(v, Volumes::new(1.0, 0.0, 0.0));
        let v = Volumes::new(0.5, 0.8, 0.4);
        assert_approx_eq!(v.music_level(), 0.4);
        assert_approx_eq!(v.sfx_level(), 0.2);
    }
}
