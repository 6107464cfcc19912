//! Tick scheduler: a dedicated thread that runs the conductor once per step.
//!
//! The loop waits on a cancellation channel with a deadline. Each deadline is
//! the previous one plus the step length at the current tempo, so wake-up
//! jitter does not accumulate and tempo changes land on the next step. A loop
//! that falls behind resyncs to the present instead of firing a burst of
//! catch-up ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::audio::AudioBackend;
use crate::music::Conductor;

/// State shared between the facade and the tick thread.
pub(crate) struct EngineCore {
    pub conductor: Conductor,
    pub backend: Box<dyn AudioBackend>,
    pub rng: ChaCha8Rng,
}

impl EngineCore {
    /// One conductor step against this core's backend and RNG.
    fn tick(&mut self) -> std::time::Duration {
        let EngineCore {
            conductor,
            backend,
            rng,
        } = self;
        conductor.tick(backend.as_mut(), rng)
    }
}

pub(crate) type SharedCore = Arc<Mutex<EngineCore>>;

/// Lock the core, recovering from a poisoned lock.
pub(crate) fn lock_core(core: &SharedCore) -> MutexGuard<'_, EngineCore> {
    core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct TickLoop {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns at most one tick loop.
pub(crate) struct Scheduler {
    core: SharedCore,
    tick_loop: Option<TickLoop>,
    ticks: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(core: SharedCore) -> Self {
        Self {
            core,
            tick_loop: None,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.tick_loop
            .as_ref()
            .is_some_and(|tick_loop| !tick_loop.handle.is_finished())
    }

    /// Total ticks run by every loop this scheduler has started.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Spawn the loop. Returns `false` if one is already running.
    ///
    /// The conductor must already be playing; the loop exits on its own once
    /// it observes the conductor stopped.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.reap();

        let (cancel, cancelled) = bounded::<()>(1);
        let core = Arc::clone(&self.core);
        let ticks = Arc::clone(&self.ticks);

        let spawned = thread::Builder::new()
            .name("adaptune-tick".into())
            .spawn(move || {
                let mut deadline = Instant::now();
                loop {
                    let step = {
                        let mut core = lock_core(&core);
                        if !core.conductor.is_playing() {
                            break;
                        }
                        core.tick()
                    };
                    ticks.fetch_add(1, Ordering::Relaxed);

                    deadline += step;
                    let now = Instant::now();
                    if deadline < now {
                        debug!(behind = ?(now - deadline), "tick loop resynced");
                        deadline = now;
                    }

                    match cancelled.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("tick loop exited");
            });

        match spawned {
            Ok(handle) => {
                self.tick_loop = Some(TickLoop { cancel, handle });
                true
            }
            Err(e) => {
                warn!("failed to spawn tick thread: {e}");
                false
            }
        }
    }

    /// Cancel the loop and wait for it to exit. Returns `false` if none was
    /// running. Must not be called while holding the core lock.
    pub fn stop(&mut self) -> bool {
        let Some(tick_loop) = self.tick_loop.take() else {
            return false;
        };
        let _ = tick_loop.cancel.try_send(());
        if tick_loop.handle.join().is_err() {
            warn!("tick thread panicked");
        }
        true
    }

    /// Join a loop that already exited on its own.
    fn reap(&mut self) {
        if let Some(tick_loop) = self.tick_loop.take() {
            let _ = tick_loop.handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;
    use crate::music::Volumes;
    use rand::SeedableRng;
    use std::time::Duration;

    fn core(theme: usize) -> SharedCore {
        Arc::new(Mutex::new(EngineCore {
            conductor: Conductor::new(theme, Volumes::default()),
            backend: Box::new(OfflineBackend::new(8000)),
            rng: ChaCha8Rng::seed_from_u64(1),
        }))
    }

    #[test]
    fn stop_without_start_is_noop() {
        let mut scheduler = Scheduler::new(core(0));
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());
    }

    #[test]
    fn second_start_is_rejected() {
        let shared = core(0);
        lock_core(&shared).conductor.start();
        let mut scheduler = Scheduler::new(Arc::clone(&shared));
        assert!(scheduler.start());
        assert!(!scheduler.start());
        lock_core(&shared).conductor.stop();
        assert!(scheduler.stop());
    }

    #[test]
    fn first_tick_is_immediate() {
        let shared = core(0);
        lock_core(&shared).conductor.start();
        let mut scheduler = Scheduler::new(Arc::clone(&shared));
        scheduler.start();
        thread::sleep(Duration::from_millis(50));
        assert!(scheduler.ticks() >= 1);
        scheduler.stop();
    }

    #[test]
    fn tick_rate_follows_tempo() {
        // 125 bpm: one step every 120 ms.
        let shared = core(0);
        lock_core(&shared).conductor.start();
        let mut scheduler = Scheduler::new(Arc::clone(&shared));
        scheduler.start();
        thread::sleep(Duration::from_millis(500));
        scheduler.stop();
        let ticks = scheduler.ticks();
        assert!((3..=6).contains(&ticks), "ticks = {ticks}");
    }

    #[test]
    fn stop_is_prompt() {
        let shared = core(6);
        lock_core(&shared).conductor.start();
        let mut scheduler = Scheduler::new(Arc::clone(&shared));
        scheduler.start();
        thread::sleep(Duration::from_millis(20));
        let begun = Instant::now();
        scheduler.stop();
        assert!(begun.elapsed() < Duration::from_millis(100));
        let after = scheduler.ticks();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(scheduler.ticks(), after);
    }

    #[test]
    fn loop_exits_when_conductor_stops() {
        let shared = core(0);
        lock_core(&shared).conductor.start();
        let mut scheduler = Scheduler::new(Arc::clone(&shared));
        scheduler.start();
        lock_core(&shared).conductor.stop();
        thread::sleep(Duration::from_millis(300));
        assert!(!scheduler.is_running());
        // A fresh loop can start afterwards.
        lock_core(&shared).conductor.start();
        assert!(scheduler.start());
        scheduler.stop();
    }
}
