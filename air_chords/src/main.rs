//! air_chords — entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use air_chords::app::{run, RunOptions};
use air_chords::config::Config;

#[derive(Parser, Debug)]
#[command(name = "air_chords", version, about = "Play guitar chords with hand poses")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay recorded detector output (JSON lines) instead of the simulator.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Loop the replay forever.
    #[arg(long, requires = "replay")]
    replay_loop: bool,

    /// Sampling period in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// General MIDI instrument name or program number.
    #[arg(long)]
    instrument: Option<String>,

    /// Run without a window (replay only).
    #[arg(long)]
    no_window: bool,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("air_chords={default_level},chord_gesture={default_level}"))
            }),
        )
        .with_target(false)
        .init();

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&cli, &mut cfg);
    cfg.validate()?;

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    tracing::debug!(?cfg, "effective configuration");

    run(cfg, RunOptions { headless: cli.no_window })?;
    Ok(())
}

/// Command-line flags win over the config file, but only when given.
fn apply_overrides(cli: &Cli, cfg: &mut Config) {
    if let Some(path) = &cli.replay {
        cfg.use_replay(path.clone());
        if cli.replay_loop {
            cfg.source.replay_loop = true;
        }
    }
    if let Some(ms) = cli.tick_ms {
        cfg.pipeline.tick_ms = ms;
    }
    if let Some(instrument) = &cli.instrument {
        cfg.midi.instrument = instrument.clone();
    }
}
