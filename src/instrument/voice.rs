//! Voices: short-lived synthesis graphs with explicit start and stop times.
//!
//! A [`Voice`] is built by a recipe on the control side, handed to the output
//! chain, rendered until its stop time and then released. It never outlives
//! its stop time and nothing else keeps a reference to it.
//!
//! Graph shape: every [`Partial`] is `source -> [filter] -> gain envelope`;
//! partials are summed, optionally passed through a voice-level filter, and
//! scaled by the voice level before reaching the voice's [`Route`].

use crate::music::Layer;

use super::envelope::Automation;
use super::filter::Filter;
use super::noise_gen::NoiseSource;
use super::oscillator::Waveform;

/// Where a voice's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Into a layer bus, then the master filter, reverb and compressor.
    Layer(Layer),
    /// Straight to the device output (one-shot sound effects).
    Direct,
}

/// Signal source of a partial.
#[derive(Debug, Clone)]
pub enum Source {
    Oscillator {
        waveform: Waveform,
        frequency: Automation,
        phase: f64,
    },
    Noise(NoiseSource),
}

/// One source with its own envelope, optional filter and time window.
#[derive(Debug, Clone)]
pub struct Partial {
    source: Source,
    gain: Automation,
    filter: Option<Filter>,
    /// Start, relative to the voice start.
    offset: f64,
    /// Length from the partial's own start.
    length: f64,
}

impl Partial {
    /// An oscillator partial.
    pub fn tone(waveform: Waveform, frequency: Automation) -> Self {
        Self::from_source(Source::Oscillator {
            waveform,
            frequency,
            phase: 0.0,
        })
    }

    /// A white noise partial.
    pub fn noise(seed: u64) -> Self {
        Self::from_source(Source::Noise(NoiseSource::new(seed)))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            gain: Automation::constant(1.0),
            filter: None,
            offset: 0.0,
            length: 0.0,
        }
    }

    /// Amplitude envelope. Also sets the length to the envelope's end if no
    /// length has been given.
    pub fn gain(mut self, gain: Automation) -> Self {
        if self.length <= 0.0 {
            self.length = gain.end_time();
        }
        self.gain = gain;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Delay the partial's start relative to the voice.
    pub fn delayed(mut self, offset: f64) -> Self {
        self.offset = offset.max(0.0);
        self
    }

    /// Stop the partial `length` seconds after it starts.
    pub fn lasting(mut self, length: f64) -> Self {
        self.length = length.max(0.0);
        self
    }

    /// End of this partial relative to the voice start.
    pub fn end(&self) -> f64 {
        self.offset + self.length
    }

    fn next_sample(&mut self, t: f64, sample_rate: f32) -> f32 {
        let local = t - self.offset;
        if local < 0.0 || local >= self.length {
            return 0.0;
        }

        let raw: f64 = match &mut self.source {
            Source::Oscillator {
                waveform,
                frequency,
                phase,
            } => {
                let value = waveform.sample(*phase);
                let freq = frequency.value_at(local);
                *phase = (*phase + freq / sample_rate as f64).rem_euclid(1.0);
                value
            }
            Source::Noise(noise) => noise.next_sample(),
        };
        let raw = raw as f32;

        let shaped = match self.filter.as_mut() {
            Some(filter) => filter.process(raw, local, sample_rate),
            None => raw,
        };
        shaped * self.gain.value_at(local) as f32
    }
}

/// An ephemeral synthesis graph.
#[derive(Debug, Clone)]
pub struct Voice {
    route: Route,
    /// Absolute start on the audio clock, in seconds.
    start: f64,
    partials: Vec<Partial>,
    filter: Option<Filter>,
    level: f32,
}

impl Voice {
    pub fn new(route: Route, start: f64) -> Self {
        Self {
            route,
            start,
            partials: Vec::new(),
            filter: None,
            level: 1.0,
        }
    }

    /// Add a partial.
    pub fn with(mut self, partial: Partial) -> Self {
        self.partials.push(partial);
        self
    }

    /// Filter applied to the sum of all partials.
    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Overall output level.
    pub fn level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Time from start until the last partial stops.
    pub fn duration(&self) -> f64 {
        self.partials.iter().map(Partial::end).fold(0.0, f64::max)
    }

    /// Absolute stop time on the audio clock.
    pub fn stop_time(&self) -> f64 {
        self.start + self.duration()
    }

    /// Move a late voice forward so it starts no earlier than `earliest`.
    ///
    /// All partial timing is relative, so the whole voice shifts intact.
    pub fn rebase(&mut self, earliest: f64) {
        if self.start < earliest {
            self.start = earliest;
        }
    }

    /// Mix this voice into `out` (mono), where `out[0]` is frame `block_start`.
    ///
    /// Returns `true` once the voice has rendered past its stop time.
    pub fn render(&mut self, out: &mut [f32], block_start: u64, sample_rate: u32) -> bool {
        let sr = sample_rate as f64;
        let start_frame = (self.start * sr).round().max(0.0) as u64;
        let end_frame = start_frame + (self.duration() * sr).ceil() as u64;
        let block_end = block_start + out.len() as u64;

        if block_end <= start_frame {
            return false;
        }

        let first = start_frame.saturating_sub(block_start) as usize;
        for (i, sample) in out.iter_mut().enumerate().skip(first) {
            let frame = block_start + i as u64;
            if frame >= end_frame {
                break;
            }
            let t = (frame - start_frame) as f64 / sr;

            let mut sum = 0.0f32;
            for partial in &mut self.partials {
                sum += partial.next_sample(t, sample_rate as f32);
            }
            if let Some(filter) = self.filter.as_mut() {
                sum = filter.process(sum, t, sample_rate as f32);
            }
            *sample += sum * self.level;
        }

        block_end >= end_frame
    }

    /// Render the whole voice into a fresh buffer starting at its start time.
    pub fn render_to_vec(mut self, sample_rate: u32) -> Vec<f32> {
        self.start = 0.0;
        let frames = (self.duration() * sample_rate as f64).ceil() as usize;
        let mut out = vec![0.0f32; frames];
        self.render(&mut out, 0, sample_rate);
        out
    }
}
