//! Integration tests for conductor ticks rendered through the output chain.

use adaptune::audio::{AudioBackend, OfflineBackend};
use adaptune::instrument::Route;
use adaptune::music::{Conductor, Layer, Volumes, STEPS_PER_BAR};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SAMPLE_RATE: u32 = 8000;

/// Play `bars` bars, rendering one step of audio between ticks.
fn play(theme: usize, target: f64, bars: u32, seed: u64) -> (OfflineBackend, Vec<f32>) {
    let mut backend = OfflineBackend::new(SAMPLE_RATE);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut conductor = Conductor::new(theme, Volumes::default());
    conductor.start();
    conductor.set_intensity_target(target);

    let mut audio = Vec::new();
    for _ in 0..bars * STEPS_PER_BAR {
        let step = conductor.tick(&mut backend, &mut rng);
        let frames = (step.as_secs_f64() * SAMPLE_RATE as f64).round() as usize;
        audio.extend(backend.render(frames));
    }
    (backend, audio)
}

#[test]
fn same_seed_same_performance() {
    let (a, audio_a) = play(2, 0.8, 2, 11);
    let (b, audio_b) = play(2, 0.8, 2, 11);
    assert_eq!(a.scheduled(), b.scheduled());
    assert_eq!(audio_a, audio_b);
}

#[test]
fn different_seeds_diverge() {
    let (a, _) = play(2, 0.8, 2, 11);
    let (b, _) = play(2, 0.8, 2, 12);
    assert_ne!(a.scheduled(), b.scheduled());
}

#[test]
fn rendered_audio_is_finite_and_limited() {
    let (_, audio) = play(5, 1.0, 2, 3);
    assert!(!audio.is_empty());
    assert!(audio.iter().all(|s| s.is_finite() && s.abs() <= 0.95 + 1e-6));
    assert!(audio.iter().any(|s| s.abs() > 0.01));
}

#[test]
fn every_bar_has_a_pad_and_four_bass_notes() {
    let (backend, _) = play(0, 0.3, 3, 1);
    assert_eq!(backend.count(Route::Layer(Layer::Pad)), 3);
    assert_eq!(backend.count(Route::Layer(Layer::Bass)), 12);
}

#[test]
fn higher_intensity_adds_percussion() {
    let (calm, _) = play(0, 0.1, 4, 5);
    let (wild, _) = play(0, 1.0, 4, 5);
    let drums = |b: &OfflineBackend| {
        b.count(Route::Layer(Layer::Kick))
            + b.count(Route::Layer(Layer::HiHat))
            + b.count(Route::Layer(Layer::Snare))
    };
    assert!(drums(&wild) > drums(&calm));
    assert_eq!(calm.count(Route::Layer(Layer::Lead)), 0);
}

#[test]
fn voices_never_start_in_the_past() {
    let (backend, _) = play(1, 0.6, 2, 9);
    let mut last_start = 0.0;
    for voice in backend.scheduled() {
        assert!(voice.start >= last_start);
        assert!(voice.stop > voice.start);
        last_start = voice.start;
    }
    assert!(backend.current_time() > 0.0);
}
