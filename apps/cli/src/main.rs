//! STARWATCH-X CLI - model lifecycle for the detection engine
//!
//! Provides a `starwatch` command with two independent stages: `train`
//! fine-tunes a YOLOv8 checkpoint on the project dataset, and `export`
//! converts a checkpoint into the ONNX graph loaded by the Java engine.

mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{export, train, CommandContext, ExportArgs, TrainArgs};

/// STARWATCH-X model pipeline
///
/// Run `train` first, inspect the result, then run `export` pointing at it.
#[derive(Parser, Debug)]
#[command(
    name = "starwatch",
    author,
    version,
    about = "STARWATCH-X - train and export the object detector",
    long_about = "Fine-tunes a YOLOv8 detector on the STARWATCH-X dataset and exports it to ONNX for the Java inference engine.\nBoth stages are independent and can be re-run; each overwrites its own artifact."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Project root all default paths derive from (overrides STARWATCH_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Configuration file (replaces ./starwatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Python interpreter with Ultralytics installed (overrides STARWATCH_PYTHON)
    #[arg(long, global = true)]
    python: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fine-tune the base model and copy the best checkpoint to a stable path
    ///
    /// Fails if the training run does not leave a fresh weights/best.pt
    /// in its run directory.
    Train(TrainArgs),

    /// Convert a trained checkpoint to ONNX for the inference engine
    ///
    /// Fails immediately if the checkpoint does not exist.
    Export(ExportArgs),
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cli_config = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing. Logs go to stderr so stdout stays clean for --json.
    let level = parse_level(args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("info"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(python) = args.python {
        cli_config.runtime.python = Some(python);
    }

    let root = match args.root.or_else(|| cli_config.root.clone()) {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let root = std::path::absolute(&root).context("Failed to resolve the project root")?;
    tracing::debug!(root = %root.display(), "project root");

    let ctx = CommandContext::new(&root, cli_config);

    match args.command {
        Command::Train(args) => train::execute(args, &ctx).await,
        Command::Export(args) => export::execute(args, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_export_flags() {
        let args = Args::parse_from(["starwatch", "--root", "/p", "export", "--dynamic", "--opset", "13"]);
        assert_eq!(args.root, Some(PathBuf::from("/p")));
        match args.command {
            Command::Export(e) => {
                assert!(e.dynamic);
                assert_eq!(e.opset, Some(13));
                assert_eq!(e.imgsz, None);
            }
            Command::Train(_) => panic!("expected export"),
        }
    }

    #[test]
    fn test_parse_level_falls_back_to_info() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("loud"), Level::INFO);
    }
}
