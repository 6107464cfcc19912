//! Scales, chord progressions and the theme table.
//!
//! Pitches are MIDI note numbers. Scale notes and chords share the same anchor
//! (C0), so `resolve_scale_note(0, o)` and the root of a tonic chord at octave
//! `o` are the same pitch.

/// MIDI note of C0. Added to every resolved pitch.
pub const PITCH_ANCHOR: i32 = 12;

/// Scale kinds, each an ordered list of semitone offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Major,
    Minor,
    Dorian,
    Mixolydian,
    Pentatonic,
}

impl ScaleKind {
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::Pentatonic => &[0, 2, 4, 7, 9],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
            ScaleKind::Dorian => "dorian",
            ScaleKind::Mixolydian => "mixolydian",
            ScaleKind::Pentatonic => "pentatonic",
        }
    }
}

/// Named chord progressions. Chords are key-relative semitone intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionKind {
    Epic,
    Dreamy,
    Intense,
    Uplifting,
    Mystical,
}

impl ProgressionKind {
    pub fn chords(self) -> &'static [&'static [i32]] {
        match self {
            ProgressionKind::Epic => &[&[0, 3, 7], &[8, 12, 15], &[3, 7, 10], &[10, 14, 17]],
            ProgressionKind::Dreamy => &[
                &[0, 4, 7, 11],
                &[9, 12, 16, 19],
                &[5, 9, 12, 16],
                &[7, 11, 14, 17],
            ],
            ProgressionKind::Intense => &[&[0, 3, 7], &[5, 8, 12], &[7, 10, 14], &[0, 3, 7, 10]],
            ProgressionKind::Uplifting => &[&[0, 4, 7], &[7, 11, 14], &[9, 12, 16], &[5, 9, 12]],
            ProgressionKind::Mystical => &[&[0, 3, 7, 10], &[1, 5, 8], &[10, 14, 17], &[2, 5, 9]],
        }
    }

    pub fn len(self) -> usize {
        self.chords().len()
    }

    pub fn name(self) -> &'static str {
        match self {
            ProgressionKind::Epic => "epic",
            ProgressionKind::Dreamy => "dreamy",
            ProgressionKind::Intense => "intense",
            ProgressionKind::Uplifting => "uplifting",
            ProgressionKind::Mystical => "mystical",
        }
    }
}

/// Key, scale, progression and tempo for one gameplay theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeBinding {
    /// Root pitch class, 0 = C.
    pub key: i32,
    pub scale: ScaleKind,
    pub progression: ProgressionKind,
    pub tempo_bpm: f64,
    pub display_name: &'static str,
}

impl ThemeBinding {
    /// Pitch of scale `degree` at `octave`. Degrees outside the scale wrap
    /// into neighbouring octaves, negative ones included.
    pub fn resolve_scale_note(&self, degree: i32, octave: i32) -> i32 {
        let scale = self.scale.intervals();
        let len = scale.len() as i32;
        let offset = scale[degree.rem_euclid(len) as usize];
        let octave_shift = degree.div_euclid(len);
        PITCH_ANCHOR + self.key + offset + (octave + octave_shift) * 12
    }

    /// Pitches of the progression chord at `chord_index` (cyclic) at `octave`.
    pub fn resolve_chord(&self, chord_index: usize, octave: i32) -> Vec<i32> {
        let chords = self.progression.chords();
        let chord = chords[chord_index % chords.len()];
        chord
            .iter()
            .map(|interval| PITCH_ANCHOR + self.key + interval + octave * 12)
            .collect()
    }
}

/// The theme table, indexed by tier.
pub const THEMES: [ThemeBinding; 8] = [
    ThemeBinding {
        key: 0,
        scale: ScaleKind::Major,
        progression: ProgressionKind::Uplifting,
        tempo_bpm: 125.0,
        display_name: "Neon Dawn",
    },
    ThemeBinding {
        key: 9,
        scale: ScaleKind::Minor,
        progression: ProgressionKind::Dreamy,
        tempo_bpm: 110.0,
        display_name: "Crystal Caverns",
    },
    ThemeBinding {
        key: 2,
        scale: ScaleKind::Minor,
        progression: ProgressionKind::Intense,
        tempo_bpm: 140.0,
        display_name: "Storm Front",
    },
    ThemeBinding {
        key: 7,
        scale: ScaleKind::Mixolydian,
        progression: ProgressionKind::Uplifting,
        tempo_bpm: 128.0,
        display_name: "Sky Garden",
    },
    ThemeBinding {
        key: 5,
        scale: ScaleKind::Dorian,
        progression: ProgressionKind::Mystical,
        tempo_bpm: 118.0,
        display_name: "Deep Current",
    },
    ThemeBinding {
        key: 4,
        scale: ScaleKind::Minor,
        progression: ProgressionKind::Epic,
        tempo_bpm: 132.0,
        display_name: "Ember Rush",
    },
    ThemeBinding {
        key: 3,
        scale: ScaleKind::Pentatonic,
        progression: ProgressionKind::Dreamy,
        tempo_bpm: 105.0,
        display_name: "Starlight",
    },
    ThemeBinding {
        key: 10,
        scale: ScaleKind::Major,
        progression: ProgressionKind::Epic,
        tempo_bpm: 145.0,
        display_name: "Final Ascent",
    },
];

/// Theme index wrapped into the table.
pub fn wrap_theme_index(index: usize) -> usize {
    index % THEMES.len()
}

/// Theme at `index`, wrapped into the table.
pub fn theme(index: usize) -> &'static ThemeBinding {
    &THEMES[wrap_theme_index(index)]
}
