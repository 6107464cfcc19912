//! Percussion patterns and arpeggio orderings.
//!
//! Three density tiers of 16-step patterns per percussive role. The tier is
//! chosen from the current intensity each tick.

use super::clock::STEPS_PER_BAR;

/// Percussive roles with step patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drum {
    Kick,
    HiHat,
    Snare,
}

type Pattern = [bool; STEPS_PER_BAR as usize];

const X: bool = true;
const O: bool = false;

const KICK: [Pattern; 3] = [
    [X, O, O, O, O, O, O, O, X, O, O, O, O, O, O, O],
    [X, O, O, O, X, O, O, O, X, O, O, O, X, O, O, O],
    [X, O, O, O, X, O, O, X, X, O, O, O, X, O, X, O],
];

const HIHAT: [Pattern; 3] = [
    [O, O, X, O, O, O, X, O, O, O, X, O, O, O, X, O],
    [X, O, X, O, X, O, X, O, X, O, X, O, X, O, X, O],
    [X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X],
];

const SNARE: [Pattern; 3] = [
    [O, O, O, O, O, O, O, O, O, O, O, O, X, O, O, O],
    [O, O, O, O, X, O, O, O, O, O, O, O, X, O, O, O],
    [O, O, O, O, X, O, O, O, O, O, O, X, X, O, O, X],
];

/// Arpeggio orderings as chord-tone indices; one is picked per section.
pub const ARP_PATTERNS: [[usize; 4]; 4] = [[0, 1, 2, 1], [0, 2, 1, 2], [0, 1, 2, 3], [2, 1, 0, 1]];

/// Density tier for `intensity`: `clamp(floor(i * 3), 0, 2)`.
pub fn density_tier(intensity: f64) -> usize {
    (intensity * 3.0).floor().clamp(0.0, 2.0) as usize
}

/// Whether `drum` fires on `beat` at `tier`.
pub fn hits(drum: Drum, tier: usize, beat: u32) -> bool {
    let patterns = match drum {
        Drum::Kick => &KICK,
        Drum::HiHat => &HIHAT,
        Drum::Snare => &SNARE,
    };
    patterns[tier.min(2)][(beat % STEPS_PER_BAR) as usize]
}

/// Hi-hat hits on even steps are accented.
pub fn hihat_accent(beat: u32) -> bool {
    beat % 2 == 0
}

/// Index into a chord of `chord_len` notes for the arpeggio at `beat`,
/// using the pattern rotated by `section`.
pub fn arp_step(section: u64, beat: u32, chord_len: usize) -> usize {
    let pattern = &ARP_PATTERNS[(section % ARP_PATTERNS.len() as u64) as usize];
    pattern[beat as usize % pattern.len()] % chord_len.max(1)
}
