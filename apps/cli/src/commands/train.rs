//! Training command implementation.

use super::{pick_path, progress_sink, CommandContext, TrainArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use starwatch_core::UltralyticsBackend;
use starwatch_training::{ModelRef, TrainingRunSpec, TrainingStage, DEFAULT_BASE_MODEL, DEFAULT_RUN_NAME};

pub async fn execute(args: TrainArgs, ctx: &CommandContext) -> Result<()> {
    let spec = build_spec(&args, ctx);

    // Inputs are checked before the framework is touched.
    let stage = TrainingStage::prepare(spec)?;

    if !args.json {
        println!();
        println!("{}", "STARWATCH-X :: YOLOv8 fine-tuning".bold().cyan());
        println!();
    }

    let backend = UltralyticsBackend::acquire(ctx.runtime(args.json))
        .await
        .context("Failed to initialize the training framework")?;
    if !args.json {
        println!("  {} ultralytics {}", "Framework:".dimmed(), backend.version());
    }
    let trainer = backend.trainer();
    let sink = progress_sink(args.json);

    let report = stage.run(&trainer, sink.as_ref()).await.context("Training failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", "✓ Training complete".bold().green());
    println!("  Best weights: {}", report.checkpoint.path.display().to_string().cyan());
    println!("  Run directory: {}", report.save_dir.display().to_string().dimmed());
    println!("  Manifest: {}", report.manifest.display().to_string().dimmed());
    println!();
    println!(
        "  {}",
        format!("Next: starwatch export --weights {}", report.checkpoint.path.display()).dimmed()
    );
    println!();
    Ok(())
}

/// Merge CLI flags over config values over built-in defaults.
pub fn build_spec(args: &TrainArgs, ctx: &CommandContext) -> TrainingRunSpec {
    let cfg = &ctx.config.train;
    let layout = &ctx.layout;

    let base_model = args
        .base_model
        .clone()
        .or_else(|| cfg.base_model.clone())
        .unwrap_or_else(|| DEFAULT_BASE_MODEL.to_string());
    let run_name = args
        .run_name
        .clone()
        .or_else(|| cfg.run_name.clone())
        .unwrap_or_else(|| DEFAULT_RUN_NAME.to_string());

    let mut spec = TrainingRunSpec::new(
        ModelRef(base_model),
        pick_path(args.data.as_ref(), cfg.data.as_ref(), ctx, layout.data_config()),
        run_name,
        pick_path(args.project.as_ref(), cfg.project.as_ref(), ctx, layout.runs_dir()),
        pick_path(args.output.as_ref(), cfg.output.as_ref(), ctx, layout.checkpoint()),
    );

    let hp = &mut spec.hyperparams;
    if let Some(epochs) = args.epochs.or(cfg.epochs) {
        hp.epochs = epochs;
    }
    if let Some(imgsz) = args.imgsz.or(cfg.imgsz) {
        hp.imgsz = imgsz;
    }
    if let Some(batch) = args.batch.or(cfg.batch) {
        hp.batch = batch;
    }
    if let Some(workers) = args.workers.or(cfg.workers) {
        hp.workers = workers;
    }
    hp.device = args.device.clone().or_else(|| cfg.device.clone());

    spec
}
