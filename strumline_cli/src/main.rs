use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use strumline_chart::{Chart, Side};

mod simulate;

#[derive(Debug, Parser)]
#[command(name = "strumline")]
#[command(about = "Rhythm chart checker and headless simulator", long_about = None)]
struct Cli {
    /// Log engine internals (debug level) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a chart and print a summary
    Check { chart: PathBuf },
    /// Play a chart against a simulated clock
    Simulate {
        chart: PathBuf,
        /// Engine config (JSON); defaults apply to anything omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Play no input at all instead of bot play
        #[arg(long)]
        idle: bool,
        /// Simulated frame length in ms
        #[arg(long, default_value_t = 16.0)]
        step_ms: f64,
        /// Print the final result as JSON
        #[arg(long)]
        json: bool,
        /// Print every judgment as it happens
        #[arg(long)]
        timeline: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    match cli.command {
        Command::Check { chart } => {
            let parsed = load_chart(&chart)?;
            print_summary(&parsed);
        }
        Command::Simulate {
            chart,
            config,
            idle,
            step_ms,
            json,
            timeline,
        } => {
            let parsed = load_chart(&chart)?;
            let config = match config {
                Some(path) => strumline_core::EngineConfig::from_path(&path)?,
                None => strumline_core::EngineConfig::default(),
            };
            let options = simulate::Options {
                idle,
                step_ms,
                timeline,
            };
            let report = simulate::run_simulation(parsed, config, &options)?;
            if json {
                let out = serde_json::to_string_pretty(&report).context("failed to serialize result")?;
                println!("{out}");
            } else {
                simulate::print_report(&report);
            }
        }
    }

    Ok(())
}

fn load_chart(path: &Path) -> anyhow::Result<Chart> {
    strumline_chart::parse_file(path).with_context(|| format!("failed to load chart: {}", path.display()))
}

fn print_summary(chart: &Chart) {
    println!("song:          {}", chart.song.as_deref().unwrap_or("(untitled)"));
    println!("bpm:           {}", chart.bpm);
    println!("speed:         {}", chart.speed);
    println!(
        "notes:         {} (player {}, opponent {})",
        chart.notes.len(),
        chart.notes_for(Side::Player).count(),
        chart.notes_for(Side::Opponent).count()
    );
    println!("holds:         {}", chart.hold_count());
    println!("bpm changes:   {}", chart.bpm_changes.len());
    println!("script events: {}", chart.events.len());
    println!("needs voices:  {}", chart.needs_voices);
    println!("length:        {:.0} ms", chart.last_note_end());
}
