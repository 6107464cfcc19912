//! Intensity controller: a smoothed 0–1 excitement signal.
//!
//! Gameplay sets a target; the current value chases it a little every tick.

/// Value of both `current` and `target` when music (re)starts.
pub const INITIAL_INTENSITY: f64 = 0.3;

/// Fraction of the remaining distance covered per tick.
pub const SMOOTHING: f64 = 0.02;

/// Lowest target accepted from [`Intensity::set_target`].
pub const MIN_TARGET: f64 = 0.1;

/// Highest target.
pub const MAX_TARGET: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intensity {
    current: f64,
    target: f64,
}

impl Intensity {
    pub fn new() -> Self {
        Self {
            current: INITIAL_INTENSITY,
            target: INITIAL_INTENSITY,
        }
    }

    /// Back to the initial state. The only way `current` is set directly.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Move `current` one step toward `target`.
    pub fn smooth(&mut self) {
        self.current += (self.target - self.current) * SMOOTHING;
    }

    /// Set the target, clamped to `[MIN_TARGET, MAX_TARGET]`. NaN is ignored.
    pub fn set_target(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.target = value.clamp(MIN_TARGET, MAX_TARGET);
    }

    /// Nudge the target upward, saturating at [`MAX_TARGET`].
    pub fn raise(&mut self, delta: f64) {
        self.target = (self.target + delta.max(0.0)).min(MAX_TARGET);
    }

    /// Force the target to [`MAX_TARGET`].
    pub fn saturate(&mut self) {
        self.target = MAX_TARGET;
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::new()
    }
}
