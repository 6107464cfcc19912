//! Output chain: voice pool, layer buses, master filter, reverb, compressor,
//! master gain and limiter.
//!
//! ```text
//! layer voices -> layer bus gain -> master low-pass -+-> compressor -> master gain -+-> limiter
//!                                                    '-> reverb ----'              |
//! direct voices -----------------------------------------------------------------'
//! ```
//!
//! Everything here runs on the audio thread and renders mono; the callback
//! copies the result to every device channel.

use crate::instrument::{Automation, Filter, Route, Voice};
use crate::music::{Layer, LayerMix};

use super::command::AudioCommand;
use super::dynamics::{Compressor, Limiter};
use super::reverb::Reverb;

/// Default cap on simultaneously rendering voices.
pub const DEFAULT_MAX_VOICES: usize = 256;

/// Master cutoff when no sweep is in progress.
pub const OPEN_CUTOFF_HZ: f64 = 20000.0;

/// Lowest point of a sweep.
pub const CLOSED_CUTOFF_HZ: f64 = 500.0;

/// Time constant for bus and master gain changes.
const GAIN_SMOOTHING_SECONDS: f32 = 0.02;

/// Master filter sweep shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// Jump closed, open up to full range over 0.8 s.
    Up,
    /// Close down over 0.3 s, reopen by 0.8 s.
    Down,
}

impl SweepDirection {
    fn automation(self, from_hz: f64) -> Automation {
        match self {
            SweepDirection::Up => {
                Automation::constant(CLOSED_CUTOFF_HZ).exp_to(0.8, OPEN_CUTOFF_HZ)
            }
            SweepDirection::Down => Automation::constant(from_hz)
                .exp_to(0.3, CLOSED_CUTOFF_HZ)
                .exp_to(0.8, OPEN_CUTOFF_HZ),
        }
    }
}

/// Audio-thread mixing state.
pub struct OutputChain {
    sample_rate: u32,
    frames: u64,
    max_voices: usize,
    voices: Vec<Box<Voice>>,

    bus_buffers: Vec<Vec<f32>>,
    direct_buffer: Vec<f32>,
    bus_target: [f32; Layer::COUNT],
    bus_gain: [f32; Layer::COUNT],

    master_filter: Filter,
    /// Frame at which the current sweep automation started.
    sweep_origin: u64,
    reverb: Reverb,
    compressor: Compressor,
    master_target: f32,
    master_gain: f32,
    smoothing: f32,
    limiter: Limiter,
}

impl OutputChain {
    pub fn new(sample_rate: u32, max_voices: usize) -> Self {
        let sample_rate = sample_rate.max(1);
        Self {
            sample_rate,
            frames: 0,
            max_voices,
            voices: Vec::with_capacity(max_voices),
            bus_buffers: vec![Vec::new(); Layer::COUNT],
            direct_buffer: Vec::new(),
            bus_target: [0.0; Layer::COUNT],
            bus_gain: [0.0; Layer::COUNT],
            master_filter: Filter::lowpass(Automation::constant(OPEN_CUTOFF_HZ)),
            sweep_origin: 0,
            reverb: Reverb::new(sample_rate),
            compressor: Compressor::master(sample_rate),
            master_target: 1.0,
            master_gain: 1.0,
            smoothing: 1.0 - (-1.0 / (GAIN_SMOOTHING_SECONDS * sample_rate as f32)).exp(),
            limiter: Limiter::default(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds rendered so far; the audio clock.
    pub fn time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Current (smoothed) gain of a layer bus.
    pub fn bus_gain(&self, layer: Layer) -> f32 {
        self.bus_gain[layer.index()]
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn master_cutoff(&self) -> f32 {
        self.master_filter.current_cutoff()
    }

    /// Apply one command. A voice that cannot be accepted is handed back so
    /// the caller can release it off the audio thread.
    pub fn apply(&mut self, command: AudioCommand) -> Option<Box<Voice>> {
        match command {
            AudioCommand::Voice(mut voice) => {
                if self.voices.len() >= self.max_voices {
                    return Some(voice);
                }
                voice.rebase(self.time());
                self.voices.push(voice);
                None
            }
            AudioCommand::SetLayerGains(mix) => {
                self.bus_target = *mix.gains();
                None
            }
            AudioCommand::SetMasterGain(gain) => {
                self.master_target = gain.clamp(0.0, 1.0);
                None
            }
            AudioCommand::Sweep(direction) => {
                let from = self.master_filter.current_cutoff() as f64;
                self.master_filter.retarget(direction.automation(from));
                self.sweep_origin = self.frames;
                None
            }
        }
    }

    /// Render `out.len()` mono frames. Finished voices are passed to `retire`.
    pub fn render(&mut self, out: &mut [f32], mut retire: impl FnMut(Box<Voice>)) {
        let len = out.len();
        for bus in &mut self.bus_buffers {
            bus.clear();
            bus.resize(len, 0.0);
        }
        self.direct_buffer.clear();
        self.direct_buffer.resize(len, 0.0);

        let block_start = self.frames;
        let sample_rate = self.sample_rate;
        let mut i = 0;
        while i < self.voices.len() {
            let target = match self.voices[i].route() {
                Route::Layer(layer) => &mut self.bus_buffers[layer.index()],
                Route::Direct => &mut self.direct_buffer,
            };
            let finished = self.voices[i].render(target, block_start, sample_rate);
            if finished {
                retire(self.voices.swap_remove(i));
            } else {
                i += 1;
            }
        }

        let sr = sample_rate as f32;
        for (n, sample) in out.iter_mut().enumerate() {
            let mut bus_sum = 0.0f32;
            for (layer, buffer) in self.bus_buffers.iter().enumerate() {
                let gain = &mut self.bus_gain[layer];
                *gain += (self.bus_target[layer] - *gain) * self.smoothing;
                bus_sum += buffer[n] * *gain;
            }

            let frame = block_start + n as u64;
            let t = (frame - self.sweep_origin) as f64 / sample_rate as f64;
            let filtered = self.master_filter.process(bus_sum, t, sr);
            let wet = self.reverb.process(filtered);
            let compressed = self.compressor.process(filtered + wet);

            self.master_gain += (self.master_target - self.master_gain) * self.smoothing;
            *sample = compressed * self.master_gain + self.direct_buffer[n];
        }

        self.limiter.process_block(out);
        self.frames += len as u64;
    }
}
