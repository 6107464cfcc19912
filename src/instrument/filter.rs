//! Biquad filter node with an automatable cutoff.
//!
//! Coefficients are recomputed at control rate (every [`CONTROL_INTERVAL`]
//! samples) rather than per sample; a sweep over a few hundred milliseconds
//! stays smooth while the per-voice cost stays low.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};

use super::envelope::Automation;

/// Samples between cutoff re-evaluations.
pub const CONTROL_INTERVAL: u32 = 16;

/// Lowest cutoff the filter will accept.
const MIN_CUTOFF_HZ: f32 = 10.0;

/// Filter response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

/// A biquad filter whose cutoff follows an [`Automation`].
#[derive(Debug, Clone)]
pub struct Filter {
    kind: FilterKind,
    cutoff: Automation,
    q: f32,
    state: Option<DirectForm2Transposed<f32>>,
    last_cutoff: f32,
    countdown: u32,
}

impl Filter {
    pub fn new(kind: FilterKind, cutoff: Automation, q: f32) -> Self {
        let last_cutoff = cutoff.value_at(0.0) as f32;
        Self {
            kind,
            cutoff,
            q,
            state: None,
            last_cutoff,
            countdown: 0,
        }
    }

    /// Butterworth low-pass.
    pub fn lowpass(cutoff: Automation) -> Self {
        Self::new(FilterKind::LowPass, cutoff, Q_BUTTERWORTH_F32)
    }

    /// Butterworth high-pass.
    pub fn highpass(cutoff: Automation) -> Self {
        Self::new(FilterKind::HighPass, cutoff, Q_BUTTERWORTH_F32)
    }

    /// Band-pass centred on the cutoff.
    pub fn bandpass(cutoff: Automation, q: f32) -> Self {
        Self::new(FilterKind::BandPass, cutoff, q)
    }

    /// Override the resonance.
    pub fn with_q(mut self, q: f32) -> Self {
        self.q = q;
        self
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Cutoff most recently applied to the coefficients.
    pub fn current_cutoff(&self) -> f32 {
        self.last_cutoff
    }

    /// Replace the cutoff automation. Time `0.0` of the new automation is the
    /// next call to [`process`](Filter::process) with `t == 0.0`.
    pub fn retarget(&mut self, cutoff: Automation) {
        self.cutoff = cutoff;
        self.countdown = 0;
    }

    /// Filter one sample at time `t` (seconds since the automation origin).
    pub fn process(&mut self, input: f32, t: f64, sample_rate: f32) -> f32 {
        if self.countdown == 0 || self.state.is_none() {
            self.update(t, sample_rate);
            self.countdown = CONTROL_INTERVAL;
        }
        self.countdown -= 1;

        match self.state.as_mut() {
            Some(filter) => filter.run(input),
            None => input,
        }
    }

    fn update(&mut self, t: f64, sample_rate: f32) {
        let cutoff = self.cutoff.value_at(t) as f32;
        let unchanged = (cutoff - self.last_cutoff).abs() < 0.5;
        if unchanged && self.state.is_some() {
            return;
        }

        let Some(coeffs) = coefficients(self.kind, sample_rate, cutoff, self.q) else {
            return;
        };
        match self.state.as_mut() {
            Some(filter) => filter.update_coefficients(coeffs),
            None => self.state = Some(DirectForm2Transposed::<f32>::new(coeffs)),
        }
        self.last_cutoff = cutoff;
    }
}

/// Compute biquad coefficients, keeping the cutoff below Nyquist.
fn coefficients(
    kind: FilterKind,
    sample_rate: f32,
    cutoff: f32,
    q: f32,
) -> Option<Coefficients<f32>> {
    let ceiling = sample_rate * 0.45;
    let f0 = cutoff.clamp(MIN_CUTOFF_HZ, ceiling.max(MIN_CUTOFF_HZ)).hz();
    let fs = sample_rate.hz();
    let q = q.max(0.05);
    let coeffs = match kind {
        FilterKind::LowPass => Coefficients::<f32>::from_params(Type::LowPass, fs, f0, q),
        FilterKind::HighPass => Coefficients::<f32>::from_params(Type::HighPass, fs, f0, q),
        FilterKind::BandPass => Coefficients::<f32>::from_params(Type::BandPass, fs, f0, q),
    };
    coeffs.ok()
}
