//! One-shot sound effects.
//!
//! Each effect renders to a single direct-routed [`Voice`] plus the side
//! effects it has on the music: an optional master filter sweep and an
//! optional push on the intensity target. Effects are independent of the
//! music clock but borrow the current theme's harmony.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use crate::audio::SweepDirection;
use crate::instrument::envelope::SILENCE;
use crate::instrument::{pitch_to_freq, Automation, Filter, Partial, Route, Voice, Waveform};
use crate::music::ThemeBinding;

/// Every sound effect a game can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Drop,
    Coin,
    Score,
    Bonus,
    Powerup,
    Levelup,
    Hit,
    Ability,
    Jackpot,
    Combo,
}

impl Sfx {
    pub const ALL: [Sfx; 10] = [
        Sfx::Drop,
        Sfx::Coin,
        Sfx::Score,
        Sfx::Bonus,
        Sfx::Powerup,
        Sfx::Levelup,
        Sfx::Hit,
        Sfx::Ability,
        Sfx::Jackpot,
        Sfx::Combo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sfx::Drop => "drop",
            Sfx::Coin => "coin",
            Sfx::Score => "score",
            Sfx::Bonus => "bonus",
            Sfx::Powerup => "powerup",
            Sfx::Levelup => "levelup",
            Sfx::Hit => "hit",
            Sfx::Ability => "ability",
            Sfx::Jackpot => "jackpot",
            Sfx::Combo => "combo",
        }
    }

    /// How this effect moves the intensity target.
    pub fn nudge(self) -> IntensityNudge {
        match self {
            Sfx::Coin => IntensityNudge::Raise(0.03),
            Sfx::Bonus => IntensityNudge::Raise(0.1),
            Sfx::Powerup => IntensityNudge::Raise(0.15),
            Sfx::Ability => IntensityNudge::Raise(0.1),
            Sfx::Combo => IntensityNudge::Raise(0.05),
            Sfx::Jackpot => IntensityNudge::Saturate,
            Sfx::Drop | Sfx::Score | Sfx::Levelup | Sfx::Hit => IntensityNudge::Unchanged,
        }
    }

    /// Master filter sweep fired alongside this effect.
    pub fn sweep(self) -> Option<SweepDirection> {
        match self {
            Sfx::Bonus | Sfx::Levelup | Sfx::Jackpot => Some(SweepDirection::Up),
            Sfx::Ability => Some(SweepDirection::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Sfx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sound effect: {0}")]
pub struct UnknownSfx(pub String);

impl FromStr for Sfx {
    type Err = UnknownSfx;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Sfx::ALL
            .into_iter()
            .find(|sfx| sfx.name() == lower)
            .ok_or_else(|| UnknownSfx(s.to_string()))
    }
}

/// Effect of a sound effect on the intensity target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntensityNudge {
    Unchanged,
    /// Add to the target, saturating at 1.0.
    Raise(f64),
    /// Force the target to 1.0.
    Saturate,
}

/// Musical state a sound effect is rendered against.
#[derive(Debug, Clone, Copy)]
pub struct SfxContext<'a> {
    /// Start on the audio clock.
    pub start: f64,
    pub theme: &'a ThemeBinding,
    /// Current chord position; 0 when music has never played.
    pub chord_index: usize,
    pub intensity: f64,
    /// Output level (sfx volume × master volume).
    pub volume: f32,
}

/// A rendered sound effect and its side effects.
#[derive(Debug, Clone)]
pub struct SfxPlan {
    pub voice: Voice,
    pub sweep: Option<SweepDirection>,
    pub nudge: IntensityNudge,
}

/// Build `sfx` for `ctx`.
pub fn render<R: Rng + ?Sized>(sfx: Sfx, ctx: &SfxContext<'_>, rng: &mut R) -> SfxPlan {
    let voice = Voice::new(Route::Direct, ctx.start).level(ctx.volume);
    let voice = match sfx {
        Sfx::Drop => drop_click(voice),
        Sfx::Coin => coin(voice, ctx),
        Sfx::Score => score(voice),
        Sfx::Bonus => bonus(voice, ctx),
        Sfx::Powerup => powerup(voice),
        Sfx::Levelup => levelup(voice, ctx),
        Sfx::Hit => hit(voice, ctx, rng),
        Sfx::Ability => ability(voice, ctx, rng),
        Sfx::Jackpot => jackpot(voice, ctx),
        Sfx::Combo => combo(voice, ctx),
    };

    SfxPlan {
        voice,
        sweep: sfx.sweep(),
        nudge: sfx.nudge(),
    }
}

fn blip(waveform: Waveform, pitch: i32, peak: f64, length: f64) -> Partial {
    Partial::tone(waveform, Automation::constant(pitch_to_freq(pitch)))
        .gain(Automation::decay(peak, length))
}

fn arpeggiate(
    mut voice: Voice,
    notes: &[i32],
    stagger: f64,
    waveform: Waveform,
    peak: f64,
    length: f64,
) -> Voice {
    for (i, &pitch) in notes.iter().enumerate() {
        voice = voice.with(blip(waveform, pitch, peak, length).delayed(i as f64 * stagger));
    }
    voice
}

fn drop_click(voice: Voice) -> Voice {
    voice.with(
        Partial::tone(Waveform::Sine, Automation::constant(600.0).exp_to(0.08, 90.0))
            .gain(Automation::decay(0.45, 0.1)),
    )
}

fn coin(voice: Voice, ctx: &SfxContext<'_>) -> Voice {
    let chord = ctx.theme.resolve_chord(ctx.chord_index, 5);
    let notes: Vec<i32> = chord.iter().copied().take(3).collect();
    arpeggiate(voice, &notes, 0.04, Waveform::Square, 0.12, 0.15)
}

fn score(voice: Voice) -> Voice {
    voice.with(
        Partial::tone(Waveform::Triangle, Automation::constant(800.0).exp_to(0.1, 1600.0))
            .gain(Automation::decay(0.35, 0.12)),
    )
}

fn bonus(voice: Voice, ctx: &SfxContext<'_>) -> Voice {
    let mut notes = ctx.theme.resolve_chord(ctx.chord_index, 5);
    notes.push(notes[0] + 12);
    arpeggiate(voice, &notes, 0.06, Waveform::Triangle, 0.3, 0.25)
}

fn powerup(voice: Voice) -> Voice {
    let envelope = Automation::constant(0.0)
        .linear_to(0.05, 0.25)
        .exp_to(0.5, SILENCE);
    voice
        .with(
            Partial::tone(Waveform::Saw, Automation::constant(200.0).exp_to(0.4, 800.0))
                .gain(envelope.clone()),
        )
        .with(
            Partial::tone(Waveform::Square, Automation::constant(201.0).exp_to(0.4, 803.0))
                .gain(envelope.scaled(0.6)),
        )
        .filtered(Filter::lowpass(
            Automation::constant(800.0).exp_to(0.4, 6000.0),
        ))
}

fn levelup(voice: Voice, ctx: &SfxContext<'_>) -> Voice {
    let chord = ctx.theme.resolve_chord(ctx.chord_index, 5);
    let mut notes = chord.clone();
    notes.push(chord[0] + 12);
    notes.push(chord[1] + 12);
    notes.push(chord[0] + 24);

    let stagger = 0.08;
    let last = notes.len() - 1;
    let voice = arpeggiate(voice, &notes[..last], stagger, Waveform::Square, 0.15, 0.2);
    voice.with(blip(Waveform::Square, notes[last], 0.18, 0.5).delayed(last as f64 * stagger))
}

fn hit<R: Rng + ?Sized>(voice: Voice, ctx: &SfxContext<'_>, rng: &mut R) -> Voice {
    let degree = rng.gen_range(0..ctx.theme.scale.intervals().len()) as i32;
    let pitch = ctx.theme.resolve_scale_note(degree, 3);
    voice.with(blip(Waveform::Triangle, pitch, 0.4, 0.08))
}

fn ability<R: Rng + ?Sized>(voice: Voice, ctx: &SfxContext<'_>, rng: &mut R) -> Voice {
    let whoosh = Partial::noise(rng.gen())
        .filter(Filter::bandpass(
            Automation::constant(400.0).exp_to(0.4, 4000.0),
            1.5,
        ))
        .gain(Automation::swell(0.15, 0.35, 0.3, 0.5));

    let root = ctx.theme.resolve_chord(ctx.chord_index, 3)[0];
    let stab = Automation::swell(0.01, 0.12, 0.25, 0.7);
    let mut voice = voice.with(whoosh);
    for pitch in [root, root + 7, root + 12] {
        voice = voice.with(
            Partial::tone(Waveform::Saw, Automation::constant(pitch_to_freq(pitch)))
                .gain(stab.clone())
                .delayed(0.1),
        );
    }
    voice
}

fn jackpot(mut voice: Voice, ctx: &SfxContext<'_>) -> Voice {
    let mut previous_root = i32::MIN;
    for k in 0..4 {
        let mut chord = ctx.theme.resolve_chord(ctx.chord_index + k, 4);
        while chord[0] <= previous_root {
            for pitch in chord.iter_mut() {
                *pitch += 12;
            }
        }
        previous_root = chord[0];

        let chord_start = k as f64 * 0.2;
        for (i, &pitch) in chord.iter().enumerate() {
            voice = voice.with(
                blip(Waveform::Square, pitch, 0.1, 0.35).delayed(chord_start + i as f64 * 0.03),
            );
        }
    }
    voice
}

fn combo(voice: Voice, ctx: &SfxContext<'_>) -> Voice {
    let degree = (ctx.intensity * 7.0).floor() as i32;
    let freq = pitch_to_freq(ctx.theme.resolve_scale_note(degree, 5));
    voice.with(
        Partial::tone(Waveform::Sine, Automation::constant(freq).exp_to(0.08, freq * 1.5))
            .gain(Automation::decay(0.3, 0.12)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::theme;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx(intensity: f64) -> SfxContext<'static> {
        SfxContext {
            start: 1.0,
            theme: theme(0),
            chord_index: 0,
            intensity,
            volume: 0.7,
        }
    }

    #[test]
    fn names_parse_back() {
        for sfx in Sfx::ALL {
            assert_eq!(sfx.name().parse::<Sfx>().unwrap(), sfx);
        }
        assert_eq!(" Coin ".parse::<Sfx>().unwrap(), Sfx::Coin);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = "kazoo".parse::<Sfx>().unwrap_err();
        assert_eq!(err, UnknownSfx("kazoo".into()));
        assert_eq!(err.to_string(), "unknown sound effect: kazoo");
    }

    #[test]
    fn every_effect_is_direct_and_finite() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for sfx in Sfx::ALL {
            let plan = render(sfx, &ctx(0.5), &mut rng);
            assert_eq!(plan.voice.route(), Route::Direct, "{sfx}");
            assert_eq!(plan.voice.start(), 1.0, "{sfx}");
            assert!(plan.voice.duration() > 0.0, "{sfx}");
            assert!(plan.voice.duration() < 2.0, "{sfx}");
            let out = plan.voice.render_to_vec(44100);
            assert!(out.iter().all(|s| s.is_finite()), "{sfx}");
            assert!(out.iter().any(|s| s.abs() > 1e-3), "{sfx} silent");
        }
    }

    #[test]
    fn nudges() {
        assert_eq!(Sfx::Coin.nudge(), IntensityNudge::Raise(0.03));
        assert_eq!(Sfx::Jackpot.nudge(), IntensityNudge::Saturate);
        assert_eq!(Sfx::Drop.nudge(), IntensityNudge::Unchanged);
        for sfx in [Sfx::Coin, Sfx::Bonus, Sfx::Powerup, Sfx::Ability, Sfx::Combo] {
            assert!(matches!(sfx.nudge(), IntensityNudge::Raise(d) if d > 0.0));
        }
    }

    #[test]
    fn sweeps() {
        assert_eq!(Sfx::Bonus.sweep(), Some(SweepDirection::Up));
        assert_eq!(Sfx::Ability.sweep(), Some(SweepDirection::Down));
        assert_eq!(Sfx::Hit.sweep(), None);
    }

    #[test]
    fn coin_is_three_staggered_notes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plan = render(Sfx::Coin, &ctx(0.3), &mut rng);
        assert_eq!(plan.voice.partial_count(), 3);
        assert!((plan.voice.duration() - (0.08 + 0.15)).abs() < 1e-9);
    }

    #[test]
    fn levelup_fanfare_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // Three-note chord plus three octave jumps.
        let plan = render(Sfx::Levelup, &ctx(0.3), &mut rng);
        assert_eq!(plan.voice.partial_count(), 6);
        let four_note = SfxContext {
            theme: theme(1),
            ..ctx(0.3)
        };
        let plan = render(Sfx::Levelup, &four_note, &mut rng);
        assert_eq!(plan.voice.partial_count(), 7);
    }

    #[test]
    fn jackpot_has_four_arpeggiated_chords() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plan = render(Sfx::Jackpot, &ctx(0.3), &mut rng);
        let expected: usize = (0..4)
            .map(|k| theme(0).resolve_chord(k, 4).len())
            .sum();
        assert_eq!(plan.voice.partial_count(), expected);
    }

    #[test]
    fn hit_is_deterministic_for_seed() {
        let a = render(Sfx::Hit, &ctx(0.3), &mut ChaCha8Rng::seed_from_u64(11));
        let b = render(Sfx::Hit, &ctx(0.3), &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a.voice.render_to_vec(44100), b.voice.render_to_vec(44100));
    }
}
