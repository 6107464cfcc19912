//! Audio engine: cpal output stream, lock-free command queue, output chain.
//!
//! The control side talks to the audio thread only through [`AudioCommand`]s
//! pushed onto a ring buffer. Finished voices come back on a second ring and
//! are dropped on the control side. The audio clock is the number of frames
//! the callback has rendered, shared through an atomic.

pub mod callback;
pub mod command;
pub mod dynamics;
pub mod offline;
pub mod output;
pub mod reverb;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapRb,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::instrument::Voice;
use crate::music::LayerMix;

pub use command::AudioCommand;
pub use offline::OfflineBackend;
pub use output::{OutputChain, SweepDirection, DEFAULT_MAX_VOICES};

use callback::AudioCallback;

/// Command ring capacity.
const RING_BUFFER_CAPACITY: usize = 1024;

/// Return ring capacity for finished voices.
const GRAVEYARD_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,
    #[error("device config error: {0}")]
    DeviceConfig(String),
    #[error("stream build error: {0}")]
    StreamBuild(String),
    #[error("stream play error: {0}")]
    StreamPlay(String),
    /// The audio thread is not draining commands fast enough.
    #[error("audio command queue is full")]
    QueueFull,
}

/// Where voices and mix changes go. Implemented by the device output and by
/// [`OfflineBackend`].
pub trait AudioBackend: Send {
    /// Audio clock in seconds.
    fn current_time(&self) -> f64;

    fn schedule(&mut self, voice: Voice) -> Result<(), AudioError>;

    fn set_layer_gains(&mut self, mix: LayerMix) -> Result<(), AudioError>;

    fn set_master_gain(&mut self, gain: f32) -> Result<(), AudioError>;

    fn sweep_filter(&mut self, direction: SweepDirection) -> Result<(), AudioError>;
}

/// Settings for opening the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Override the device's default sample rate.
    pub sample_rate: Option<u32>,
    pub max_voices: usize,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            sample_rate: None,
            max_voices: DEFAULT_MAX_VOICES,
        }
    }
}

/// Owns the cpal stream. Stays on the thread that opened it; the paired
/// [`OutputHandle`] is what gets shared.
pub struct AudioEngine {
    stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioEngine {
    /// Open the default output device. The stream starts paused; call
    /// [`resume`](AudioEngine::resume) on the first user interaction.
    pub fn open(options: DeviceOptions) -> Result<(Self, OutputHandle), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let sample_rate = options.sample_rate.unwrap_or(config.sample_rate().0);
        let channels = config.channels();

        Self::build_with_device(&device, sample_rate, channels, options.max_voices)
    }

    fn build_with_device(
        device: &cpal::Device,
        sample_rate: u32,
        channels: u16,
        max_voices: usize,
    ) -> Result<(Self, OutputHandle), AudioError> {
        let (producer, consumer) = HeapRb::<AudioCommand>::new(RING_BUFFER_CAPACITY).split();
        let (grave_prod, grave_cons) = HeapRb::<Box<Voice>>::new(GRAVEYARD_CAPACITY).split();
        let clock = Arc::new(AtomicU64::new(0));

        let mut audio_callback = AudioCallback::new(
            consumer,
            grave_prod,
            OutputChain::new(sample_rate, max_voices),
            channels,
            Arc::clone(&clock),
        );

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_fn = |err: cpal::StreamError| {
            error!("audio stream error: {err}");
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    audio_callback.process(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        // Some hosts start streams on build.
        if let Err(e) = stream.pause() {
            debug!("could not pause new stream: {e}");
        }

        info!(sample_rate, channels, max_voices, "audio output opened");

        let handle = OutputHandle {
            producer,
            graveyard: grave_cons,
            clock,
            sample_rate,
        };
        Ok((
            Self {
                stream,
                sample_rate,
                channels,
            },
            handle,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Start (or restart) the device stream.
    pub fn resume(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))
    }
}

/// Control-side end of the device output: command producer, graveyard
/// consumer and a view of the audio clock.
pub struct OutputHandle {
    producer: ringbuf::HeapProd<AudioCommand>,
    graveyard: ringbuf::HeapCons<Box<Voice>>,
    clock: Arc<AtomicU64>,
    sample_rate: u32,
}

impl OutputHandle {
    fn send(&mut self, command: AudioCommand) -> Result<(), AudioError> {
        self.reap();
        self.producer
            .try_push(command)
            .map_err(|_| AudioError::QueueFull)
    }

    /// Drop voices the audio thread has finished with.
    fn reap(&mut self) {
        while self.graveyard.try_pop().is_some() {}
    }
}

impl AudioBackend for OutputHandle {
    fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn schedule(&mut self, voice: Voice) -> Result<(), AudioError> {
        self.send(AudioCommand::Voice(Box::new(voice)))
    }

    fn set_layer_gains(&mut self, mix: LayerMix) -> Result<(), AudioError> {
        self.send(AudioCommand::SetLayerGains(mix))
    }

    fn set_master_gain(&mut self, gain: f32) -> Result<(), AudioError> {
        self.send(AudioCommand::SetMasterGain(gain))
    }

    fn sweep_filter(&mut self, direction: SweepDirection) -> Result<(), AudioError> {
        self.send(AudioCommand::Sweep(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Route;

    type Rig = (
        OutputHandle,
        ringbuf::HeapCons<AudioCommand>,
        ringbuf::HeapProd<Box<Voice>>,
    );

    fn handle(capacity: usize) -> Rig {
        let (producer, consumer) = HeapRb::<AudioCommand>::new(capacity).split();
        let (grave_prod, grave_cons) = HeapRb::<Box<Voice>>::new(capacity).split();
        let handle = OutputHandle {
            producer,
            graveyard: grave_cons,
            clock: Arc::new(AtomicU64::new(0)),
            sample_rate: 48000,
        };
        (handle, consumer, grave_prod)
    }

    #[test]
    fn clock_reads_frames_as_seconds() {
        let (handle, _cons, _grave) = handle(4);
        handle.clock.store(96000, Ordering::Release);
        assert_eq!(handle.current_time(), 2.0);
    }

    #[test]
    fn full_queue_is_reported() {
        let (mut handle, _cons, _grave) = handle(1);
        handle.set_master_gain(1.0).unwrap();
        assert!(matches!(
            handle.set_master_gain(0.5),
            Err(AudioError::QueueFull)
        ));
    }

    #[test]
    fn sending_reaps_the_graveyard() {
        let (mut handle, _cons, mut grave) = handle(4);
        grave.try_push(Box::new(Voice::new(Route::Direct, 0.0))).unwrap();
        handle.sweep_filter(SweepDirection::Up).unwrap();
        assert!(handle.graveyard.try_pop().is_none());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            AudioError::NoOutputDevice.to_string(),
            "no audio output device found"
        );
        assert_eq!(
            AudioError::QueueFull.to_string(),
            "audio command queue is full"
        );
        assert_eq!(
            AudioError::DeviceConfig("test".to_string()).to_string(),
            "device config error: test"
        );
    }

    #[test]
    #[ignore] // Requires audio device; run manually with `cargo test -- --ignored`
    fn open_default_device() {
        let (engine, mut handle) =
            AudioEngine::open(DeviceOptions::default()).expect("no audio device");
        assert!(engine.sample_rate() > 0);
        assert!(engine.channels() > 0);
        engine.resume().unwrap();
        handle.schedule(Voice::new(Route::Direct, 0.0)).unwrap();
        engine.pause().unwrap();
    }
}
