//! Parameter automation: scheduled jumps and ramps for gains, pitches and cutoffs.
//!
//! An [`Automation`] starts at an initial value and then follows a list of
//! segments in time order. Ramps begin where the previous segment ended, so a
//! percussive envelope is just `constant(peak).exp_to(decay, silence)`.
//! All times are seconds relative to the start of the owning sound.

/// Smallest magnitude an exponential ramp may start from or reach.
pub const EXP_FLOOR: f64 = 0.0001;

/// Level used as "silence" at the end of exponential decays.
pub const SILENCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Set { at: f64, value: f64 },
    Linear { end: f64, value: f64 },
    Exponential { end: f64, value: f64 },
}

/// A time-varying parameter value.
#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    initial: f64,
    segments: Vec<Segment>,
}

impl Automation {
    /// A value that never changes.
    pub fn constant(value: f64) -> Self {
        Self {
            initial: value,
            segments: Vec::new(),
        }
    }

    /// Percussive envelope: jump to `peak`, decay exponentially to silence by `end`.
    pub fn decay(peak: f64, end: f64) -> Self {
        Self::constant(peak).exp_to(end, SILENCE)
    }

    /// Linear attack to `level`, hold, then linear release reaching zero at `end`.
    pub fn swell(attack: f64, level: f64, release: f64, end: f64) -> Self {
        let release_start = (end - release).max(attack);
        Self::constant(0.0)
            .linear_to(attack, level)
            .linear_to(release_start, level)
            .linear_to(end, 0.0)
    }

    /// Jump to `value` at time `at`.
    pub fn set(mut self, at: f64, value: f64) -> Self {
        self.segments.push(Segment::Set { at, value });
        self
    }

    /// Ramp linearly from the previous value, arriving at `value` at `end`.
    pub fn linear_to(mut self, end: f64, value: f64) -> Self {
        self.segments.push(Segment::Linear { end, value });
        self
    }

    /// Ramp exponentially from the previous value, arriving at `value` at `end`.
    pub fn exp_to(mut self, end: f64, value: f64) -> Self {
        self.segments.push(Segment::Exponential { end, value });
        self
    }

    /// Whether the value is the same at every point in time.
    pub fn is_constant(&self) -> bool {
        self.segments.is_empty()
    }

    /// Time at which the last scheduled change completes.
    pub fn end_time(&self) -> f64 {
        self.segments
            .iter()
            .map(|seg| match *seg {
                Segment::Set { at, .. } => at,
                Segment::Linear { end, .. } | Segment::Exponential { end, .. } => end,
            })
            .fold(0.0, f64::max)
    }

    /// Scale every level (initial and targets) by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.initial *= factor;
        for seg in &mut self.segments {
            match seg {
                Segment::Set { value, .. }
                | Segment::Linear { value, .. }
                | Segment::Exponential { value, .. } => *value *= factor,
            }
        }
        self
    }

    /// Evaluate the automation at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.initial;

        for seg in &self.segments {
            match *seg {
                Segment::Set { at, value } => {
                    if t < at {
                        return prev_value;
                    }
                    prev_time = at;
                    prev_value = value;
                }
                Segment::Linear { end, value } => {
                    if t < end {
                        let span = end - prev_time;
                        if span <= 0.0 {
                            return value;
                        }
                        let x = ((t - prev_time) / span).clamp(0.0, 1.0);
                        return prev_value + (value - prev_value) * x;
                    }
                    prev_time = end;
                    prev_value = value;
                }
                Segment::Exponential { end, value } => {
                    if t < end {
                        let span = end - prev_time;
                        if span <= 0.0 {
                            return value;
                        }
                        let from = prev_value.max(EXP_FLOOR);
                        let to = value.max(EXP_FLOOR);
                        let x = ((t - prev_time) / span).clamp(0.0, 1.0);
                        return from * (to / from).powf(x);
                    }
                    prev_time = end;
                    prev_value = value;
                }
            }
        }

        prev_value
    }
}
