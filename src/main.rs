use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lireta::evaluate_with_config;

/// Renders a lireta script into a WAV file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Script to evaluate.
    input: PathBuf,

    /// Where to write the rendered audio.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Instrument configuration, overriding the script's `config` directive.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let audio = evaluate_with_config(&source, args.config.as_deref())
        .with_context(|| format!("evaluating {}", args.input.display()))?;
    info!(seconds = audio.duration(), "script evaluated");

    match &args.output {
        Some(path) => {
            audio
                .export_wav(path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "audio written");
        }
        None => info!("no output path given, discarding audio"),
    }
    Ok(())
}
