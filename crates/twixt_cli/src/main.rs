//! Twixt CLI
//!
//! Simulate tweens frame by frame and inspect easing curves.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use twixt_animation::Easing;
use twixt_core::{Properties, Value};

mod config;
mod simulate;

use config::{OutputFormat, RepeatSetting, TweenConfig, TwixtConfig, DEFAULT_CONFIG_FILE};
use simulate::Simulation;

#[derive(Parser)]
#[command(name = "twixt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Twixt tweening CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate tweens on a manual clock and print every frame
    Run {
        /// Config file (defaults to ./twixt.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames per simulated second
        #[arg(long)]
        fps: Option<u32>,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        #[command(flatten)]
        tween: TweenArgs,
    },

    /// List the easing catalogue with sampled values
    Easings {
        /// Intervals to sample between 0 and 1
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
        samples: u32,
    },
}

/// A tween given on the command line, added after any configured ones
#[derive(Args)]
struct TweenArgs {
    /// Initial target field, repeatable
    #[arg(long = "from", value_name = "FIELD=VALUE")]
    from: Vec<String>,

    /// End value, repeatable. Giving any adds a tween.
    #[arg(long = "to", value_name = "FIELD=VALUE")]
    to: Vec<String>,

    /// Duration in milliseconds
    #[arg(long)]
    duration: Option<f64>,

    /// Delay in milliseconds
    #[arg(long)]
    delay: Option<f64>,

    /// Extra cycles, a count or "infinite"
    #[arg(long)]
    repeat: Option<RepeatSetting>,

    /// Reverse direction on every repeat
    #[arg(long)]
    yoyo: bool,

    /// Easing name or cubic-bezier(x1, y1, x2, y2)
    #[arg(long)]
    easing: Option<String>,
}

impl TweenArgs {
    fn into_config(self) -> Result<Option<TweenConfig>> {
        if self.to.is_empty() {
            return Ok(None);
        }

        let defaults = TweenConfig::default();
        Ok(Some(TweenConfig {
            name: None,
            from: parse_assignments(&self.from)?,
            to: parse_assignments(&self.to)?,
            duration: self.duration.unwrap_or(defaults.duration),
            delay: self.delay.unwrap_or(defaults.delay),
            repeat: self.repeat.unwrap_or(defaults.repeat),
            yoyo: self.yoyo,
            easing: self.easing.unwrap_or(defaults.easing),
        }))
    }
}

fn parse_assignments(pairs: &[String]) -> Result<IndexMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            Properties::parse_assignment(pair)
                .with_context(|| format!("Invalid field assignment '{}'", pair))
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            config,
            fps,
            max_frames,
            format,
            tween,
        } => {
            let mut config = TwixtConfig::load_or_default(config.as_deref())?;
            if let Some(fps) = fps {
                config.simulation.fps = fps;
            }
            if let Some(max_frames) = max_frames {
                config.simulation.max_frames = max_frames;
            }
            if let Some(format) = format {
                config.simulation.format = format;
            }
            if let Some(extra) = tween.into_config()? {
                config.tweens.push(extra);
            }
            cmd_run(&config)
        }

        Commands::Easings { samples } => cmd_easings(samples),
    }
}

fn cmd_run(config: &TwixtConfig) -> Result<()> {
    if config.tweens.is_empty() {
        anyhow::bail!(
            "No tweens to run. Add [[tween]] entries to {} or pass --to FIELD=VALUE.",
            DEFAULT_CONFIG_FILE
        );
    }

    info!(
        "Simulating {} tween(s) at {} fps",
        config.tweens.len(),
        config.simulation.fps
    );

    let mut simulation = Simulation::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for frame in simulation.by_ref() {
        writeln!(out, "{}", simulate::render(&frame, config.simulation.format)?)?;
    }

    info!("Finished after {} frame(s)", simulation.frames());
    Ok(())
}

fn cmd_easings(samples: u32) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for easing in Easing::named() {
        let values: Vec<String> = (0..=samples)
            .map(|i| format!("{:.3}", easing.apply(f64::from(i) / f64::from(samples))))
            .collect();
        writeln!(out, "{:<20} {}", easing.to_string(), values.join(" "))?;
    }

    Ok(())
}
