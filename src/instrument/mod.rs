//! Instruments: synthesis primitives and the per-role note recipes.
//!
//! Every recipe returns a [`Voice`] with an explicit start and stop time.
//! Recipes never touch the audio device; the caller hands the voice to an
//! [`AudioBackend`](crate::audio::AudioBackend).

pub mod arp_synth;
pub mod bass_synth;
pub mod drum_kit;
pub mod envelope;
pub mod filter;
pub mod lead_synth;
pub mod noise_gen;
pub mod oscillator;
pub mod pad_synth;
pub mod voice;

pub use arp_synth::arp;
pub use bass_synth::bass;
pub use drum_kit::{hihat, kick, snare};
pub use envelope::Automation;
pub use filter::{Filter, FilterKind};
pub use lead_synth::lead;
pub use noise_gen::NoiseSource;
pub use oscillator::{pitch_to_freq, Waveform};
pub use pad_synth::pad;
pub use voice::{Partial, Route, Voice};
