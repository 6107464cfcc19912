//! Sound engine facade: the public API games call into.
//!
//! Construction never fails: if no output device can be opened the engine is
//! created unavailable and every method quietly does nothing. Nothing here
//! returns an error; problems are logged and swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, AudioEngine};
use crate::config::SoundConfig;
use crate::music::{ClockState, Conductor, Intensity, ThemeBinding, Volumes};
use crate::scheduler::{lock_core, EngineCore, Scheduler, SharedCore};
use crate::sfx::{self, Sfx};

struct Inner {
    core: SharedCore,
    scheduler: Mutex<Scheduler>,
    /// Device stream, absent when driving a custom backend.
    device: Option<AudioEngine>,
    resumed: AtomicBool,
    enabled: AtomicBool,
    music_enabled: AtomicBool,
}

/// Adaptive music and sound-effect engine.
///
/// When opened on the audio device the engine owns the device stream and must
/// stay on the thread that created it.
pub struct SoundEngine {
    inner: Option<Inner>,
}

impl SoundEngine {
    /// Open the default output device with `config`. Falls back to an
    /// unavailable engine if the device cannot be opened.
    pub fn new(config: &SoundConfig) -> Self {
        match AudioEngine::open(config.device_options()) {
            Ok((device, handle)) => Self::build(config, Box::new(handle), Some(device)),
            Err(e) => {
                warn!("audio unavailable, sound disabled: {e}");
                Self::unavailable()
            }
        }
    }

    /// Drive a custom backend instead of the device.
    pub fn with_backend(config: &SoundConfig, backend: Box<dyn AudioBackend>) -> Self {
        Self::build(config, backend, None)
    }

    /// An engine with no backend; every call is a no-op.
    pub fn unavailable() -> Self {
        Self { inner: None }
    }

    fn build(
        config: &SoundConfig,
        mut backend: Box<dyn AudioBackend>,
        device: Option<AudioEngine>,
    ) -> Self {
        let config = config.clone().clamped();
        let volumes = config.volumes();
        if let Err(e) = backend.set_master_gain(volumes.master as f32) {
            debug!("initial master gain dropped: {e}");
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let core = Arc::new(Mutex::new(EngineCore {
            conductor: Conductor::new(config.theme, volumes),
            backend,
            rng,
        }));

        Self {
            inner: Some(Inner {
                scheduler: Mutex::new(Scheduler::new(Arc::clone(&core))),
                core,
                device,
                resumed: AtomicBool::new(false),
                enabled: AtomicBool::new(config.enabled),
                music_enabled: AtomicBool::new(config.music_enabled),
            }),
        }
    }

    /// Whether a backend is attached.
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    /// Resume the device stream now. Also happens on the first call to any
    /// other method.
    pub fn resume(&self) {
        if let Some(inner) = &self.inner {
            inner.touch();
        }
    }

    /// Start the music loop. No-op if already playing or if sound or music
    /// is switched off.
    pub fn play_music(&self) {
        let Some(inner) = self.active() else { return };
        if !inner.music_enabled.load(Ordering::Acquire) {
            return;
        }
        inner.start_music();
    }

    /// Stop the music loop. Voices already scheduled ring out.
    pub fn stop_music(&self) {
        if let Some(inner) = &self.inner {
            inner.touch();
            inner.stop_music();
        }
    }

    /// Set the intensity target, clamped to `[0.1, 1.0]`.
    pub fn set_intensity(&self, value: f64) {
        if let Some(inner) = &self.inner {
            inner.touch();
            lock_core(&inner.core).conductor.set_intensity_target(value);
        }
    }

    /// Select a theme; indices wrap around the theme table.
    pub fn set_tier(&self, index: usize) {
        if let Some(inner) = &self.inner {
            inner.touch();
            lock_core(&inner.core).conductor.set_theme(index);
        }
    }

    /// Fire a one-shot sound effect.
    pub fn play(&self, effect: Sfx) {
        let Some(inner) = self.active() else { return };
        let mut core = lock_core(&inner.core);
        let EngineCore {
            conductor,
            backend,
            rng,
        } = &mut *core;

        let ctx = conductor.sfx_context(backend.current_time());
        let plan = sfx::render(effect, &ctx, rng);
        if let Err(e) = backend.schedule(plan.voice) {
            debug!(sfx = %effect, "effect dropped: {e}");
        }
        if let Some(direction) = plan.sweep {
            if let Err(e) = backend.sweep_filter(direction) {
                debug!("sweep dropped: {e}");
            }
        }
        conductor.apply_nudge(plan.nudge);
    }

    /// Fire a sound effect by name. Unknown names are logged and ignored.
    pub fn play_named(&self, name: &str) {
        match name.parse::<Sfx>() {
            Ok(effect) => self.play(effect),
            Err(e) => debug!("{e}"),
        }
    }

    /// Flip the master switch. Switching off stops the music. Returns the new
    /// state; always `false` when unavailable.
    pub fn toggle(&self) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        inner.touch();
        let enabled = !inner.enabled.fetch_xor(true, Ordering::AcqRel);
        if !enabled {
            inner.stop_music();
        }
        info!(enabled, "sound toggled");
        enabled
    }

    /// Flip the music switch. Switching on starts the music (when sound is
    /// on); switching off stops it. Returns the new state.
    pub fn toggle_music(&self) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        inner.touch();
        let music_enabled = !inner.music_enabled.fetch_xor(true, Ordering::AcqRel);
        if music_enabled {
            if inner.enabled.load(Ordering::Acquire) {
                inner.start_music();
            }
        } else {
            inner.stop_music();
        }
        info!(music_enabled, "music toggled");
        music_enabled
    }

    /// Set the master volume, clamped to `[0, 1]`.
    pub fn set_volume(&self, level: f64) {
        let Some(inner) = &self.inner else { return };
        inner.touch();
        let mut core = lock_core(&inner.core);
        let current = core.conductor.volumes();
        let volumes = Volumes::new(level, current.music, current.sfx);
        core.conductor.set_volumes(volumes);
        if let Err(e) = core.backend.set_master_gain(volumes.master as f32) {
            debug!("master gain dropped: {e}");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.enabled.load(Ordering::Acquire))
    }

    pub fn is_music_enabled(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.music_enabled.load(Ordering::Acquire))
    }

    pub fn is_music_playing(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| lock_core(&inner.core).conductor.is_playing())
    }

    /// Active theme.
    pub fn theme(&self) -> Option<&'static ThemeBinding> {
        self.with_conductor(|c| c.theme())
    }

    pub fn intensity(&self) -> Option<Intensity> {
        self.with_conductor(|c| c.intensity())
    }

    pub fn clock(&self) -> Option<ClockState> {
        self.with_conductor(|c| c.clock())
    }

    pub fn volume(&self) -> Option<f64> {
        self.with_conductor(|c| c.volumes().master)
    }

    /// Ticks run since the engine was created.
    pub fn ticks(&self) -> u64 {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.scheduler().ticks())
    }

    fn with_conductor<T>(&self, f: impl FnOnce(&Conductor) -> T) -> Option<T> {
        self.inner
            .as_ref()
            .map(|inner| f(&lock_core(&inner.core).conductor))
    }

    /// Inner state if sound is available and switched on, after resuming.
    fn active(&self) -> Option<&Inner> {
        let inner = self.inner.as_ref()?;
        inner.touch();
        inner.enabled.load(Ordering::Acquire).then_some(inner)
    }
}

impl Inner {
    /// Resume the device on first interaction. Retried until it succeeds.
    fn touch(&self) {
        if self.resumed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(device) = &self.device else { return };
        match device.resume() {
            Ok(()) => debug!("audio output resumed"),
            Err(e) => {
                warn!("could not resume audio output: {e}");
                self.resumed.store(false, Ordering::Release);
            }
        }
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Scheduler lock is always taken before the core lock.
    fn start_music(&self) {
        let mut scheduler = self.scheduler();
        let started = lock_core(&self.core).conductor.start();
        if started || !scheduler.is_running() {
            scheduler.start();
        }
    }

    fn stop_music(&self) {
        let mut scheduler = self.scheduler();
        lock_core(&self.core).conductor.stop();
        scheduler.stop();
    }
}

impl Drop for SoundEngine {
    fn drop(&mut self) {
        if let Some(inner) = &self.inner {
            inner.stop_music();
        }
    }
}
