//! Music: clock, theory, rhythm, intensity, layer mix and the conductor that
//! turns them into voices every tick.

pub mod clock;
pub mod conductor;
pub mod intensity;
pub mod mix;
pub mod rhythm;
pub mod theory;

pub use clock::{step_duration, ClockState, STEPS_PER_BAR};
pub use conductor::{Conductor, Volumes};
pub use intensity::Intensity;
pub use mix::{Layer, LayerMix};
pub use rhythm::{density_tier, Drum};
pub use theory::{theme, ProgressionKind, ScaleKind, ThemeBinding, THEMES};
