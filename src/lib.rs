//! adaptune: procedural adaptive music and sound-effect synthesis.
//!
//! A [`SoundEngine`] plays a layered soundtrack whose mix and rhythmic density
//! follow a gameplay intensity signal, and fires one-shot sound effects drawn
//! from the current harmony.

pub mod audio;
pub mod config;
pub mod engine;
pub mod instrument;
pub mod music;
pub(crate) mod scheduler;
pub mod sfx;

pub use config::{ConfigError, SoundConfig};
pub use engine::SoundEngine;
pub use sfx::{Sfx, UnknownSfx};
