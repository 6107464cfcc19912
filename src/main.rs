//! adaptune: play the adaptive soundtrack from the command line.
//!
//! ```bash
//! adaptune --theme 2 --intensity 0.8 --seconds 30
//! adaptune --sfx coin,combo,jackpot --seed 7
//! adaptune --list-themes
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use adaptune::music::THEMES;
use adaptune::{Sfx, SoundConfig, SoundEngine};

#[derive(Parser)]
#[command(name = "adaptune")]
#[command(author, version, about = "Procedural adaptive music and sound effects")]
struct Args {
    /// Theme index (wraps around the theme table)
    #[arg(long, short = 't')]
    theme: Option<usize>,

    /// Intensity target, 0.1 to 1.0
    #[arg(long, short = 'i', default_value = "0.3")]
    intensity: f64,

    /// How long to play
    #[arg(long, short = 's', default_value = "20")]
    seconds: f64,

    /// Comma-separated effects fired in turn, one per second
    #[arg(long, value_delimiter = ',')]
    sfx: Vec<Sfx>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the theme table and exit
    #[arg(long)]
    list_themes: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list_themes {
        for (i, theme) in THEMES.iter().enumerate() {
            println!(
                "{i}: {:<16} key {:>2}  {:<10} {:<9} {} bpm",
                theme.display_name,
                theme.key,
                theme.scale.name(),
                theme.progression.name(),
                theme.tempo_bpm
            );
        }
        return Ok(());
    }

    let mut config = SoundConfig::load();
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.enabled = true;
    config.music_enabled = true;

    let engine = SoundEngine::new(&config);
    if !engine.is_available() {
        anyhow::bail!("no audio output available");
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    engine.set_intensity(args.intensity);
    engine.play_music();
    if let Some(theme) = engine.theme() {
        println!(
            "adaptune v{}: {} at {} bpm, Ctrl-C to stop",
            env!("CARGO_PKG_VERSION"),
            theme.display_name,
            theme.tempo_bpm
        );
    }

    let began = Instant::now();
    let length = Duration::from_secs_f64(args.seconds.max(0.0));
    let mut next_effect = Duration::from_secs(1);
    let mut effects = args.sfx.iter().cycle();

    while running.load(Ordering::SeqCst) && began.elapsed() < length {
        if began.elapsed() >= next_effect {
            if let Some(&effect) = effects.next() {
                engine.play(effect);
            }
            next_effect += Duration::from_secs(1);
        }
        thread::sleep(Duration::from_millis(20));
    }

    engine.stop_music();
    // Let scheduled voices ring out.
    thread::sleep(Duration::from_millis(800));
    println!("done.");
    Ok(())
}
