//! Audio callback: runs on the cpal audio thread.
//!
//! Drains commands from the ring buffer, renders the output chain, fans the
//! mono mix out to every channel and publishes the frame clock. Finished
//! voices go back through the graveyard ring so they are freed elsewhere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};

use crate::instrument::Voice;

use super::command::AudioCommand;
use super::output::OutputChain;

/// State that lives on the audio thread. Accessed only from the cpal callback.
pub struct AudioCallback {
    commands: HeapCons<AudioCommand>,
    graveyard: HeapProd<Box<Voice>>,
    chain: OutputChain,
    mono: Vec<f32>,
    channels: usize,
    clock: Arc<AtomicU64>,
}

impl AudioCallback {
    pub fn new(
        commands: HeapCons<AudioCommand>,
        graveyard: HeapProd<Box<Voice>>,
        chain: OutputChain,
        channels: u16,
        clock: Arc<AtomicU64>,
    ) -> Self {
        Self {
            commands,
            graveyard,
            chain,
            mono: Vec::with_capacity(4096),
            channels: channels.max(1) as usize,
            clock,
        }
    }

    /// Fill an interleaved output buffer.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.commands.try_pop() {
            if let Some(rejected) = self.chain.apply(cmd) {
                bury(&mut self.graveyard, rejected);
            }
        }

        let frames = output.len() / self.channels;
        self.mono.clear();
        self.mono.resize(frames, 0.0);

        let graveyard = &mut self.graveyard;
        self.chain.render(&mut self.mono, |voice| bury(graveyard, voice));

        for (frame, &sample) in output.chunks_mut(self.channels).zip(&self.mono) {
            frame.fill(sample);
        }

        self.clock.store(self.chain.frames(), Ordering::Release);
    }

    pub fn chain(&self) -> &OutputChain {
        &self.chain
    }
}

/// Hand a voice back to the control side; if the return ring is full it is
/// dropped here instead.
fn bury(graveyard: &mut HeapProd<Box<Voice>>, voice: Box<Voice>) {
    let _ = graveyard.try_push(voice);
}
