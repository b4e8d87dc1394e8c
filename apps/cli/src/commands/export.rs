//! Export command implementation.

use super::{pick_path, progress_sink, CommandContext, ExportArgs};
use anyhow::{Context, Result};
use colored::Colorize;
use starwatch_core::UltralyticsBackend;
use starwatch_training::{ExportRunSpec, ExportStage};

pub async fn execute(args: ExportArgs, ctx: &CommandContext) -> Result<()> {
    let spec = build_spec(&args, ctx);

    // A missing checkpoint fails here, before any framework work.
    let stage = ExportStage::prepare(spec)?;

    if !args.json {
        println!();
        println!("{}", "STARWATCH-X :: Exporting YOLOv8 weights to ONNX".bold().cyan());
        println!();
    }

    let backend = UltralyticsBackend::acquire(ctx.runtime(args.json))
        .await
        .context("Failed to initialize the export framework")?;
    if !args.json {
        println!("  {} ultralytics {}", "Framework:".dimmed(), backend.version());
    }
    let exporter = backend.exporter();
    let sink = progress_sink(args.json);

    let report = stage.run(&exporter, sink.as_ref()).await.context("Export failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", "✓ ONNX export complete".bold().green());
    println!("  Model written to: {}", report.graph.path.display().to_string().cyan());
    println!("  sha256: {}", report.graph.sha256.dimmed());
    if let Some(intermediate) = &report.intermediate {
        println!("  Intermediate kept at: {}", intermediate.display().to_string().dimmed());
    }
    println!();
    Ok(())
}

pub fn build_spec(args: &ExportArgs, ctx: &CommandContext) -> ExportRunSpec {
    let cfg = &ctx.config.export;
    let layout = &ctx.layout;

    let mut spec = ExportRunSpec::new(
        pick_path(args.weights.as_ref(), cfg.weights.as_ref(), ctx, layout.checkpoint()),
        pick_path(args.output.as_ref(), cfg.output.as_ref(), ctx, layout.exported_model()),
    );

    if let Some(imgsz) = args.imgsz.or(cfg.imgsz) {
        spec.params.imgsz = imgsz;
    }
    if let Some(opset) = args.opset.or(cfg.opset) {
        spec.params.opset = opset;
    }
    spec.params.dynamic = args.dynamic || cfg.dynamic.unwrap_or(false);
    spec.keep_intermediate = args.keep_intermediate || cfg.keep_intermediate.unwrap_or(false);

    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use starwatch_core::StarwatchConfig;
    use std::path::{Path, PathBuf};

    fn ctx(config: &str) -> CommandContext {
        CommandContext::new(Path::new("/srv/sw"), toml::from_str::<StarwatchConfig>(config).unwrap())
    }

    #[test]
    fn test_defaults_target_engine_resources() {
        let spec = build_spec(&ExportArgs::default(), &ctx(""));

        assert_eq!(spec.weights, PathBuf::from("/srv/sw/python-ml/weights/best.pt"));
        assert_eq!(
            spec.output,
            PathBuf::from("/srv/sw/java-engine/src/main/resources/model/starwatchx_yolov8.onnx")
        );
        assert_eq!(spec.params.imgsz, 640);
        assert_eq!(spec.params.opset, 12);
        assert!(!spec.params.dynamic);
        assert!(!spec.keep_intermediate);
    }

    #[test]
    fn test_cli_flags_override_config() {
        let ctx = ctx("[export]\nopset = 17\nimgsz = 320\nweights = \"models/last.pt\"\n");
        let args = ExportArgs { opset: Some(13), dynamic: true, ..ExportArgs::default() };

        let spec = build_spec(&args, &ctx);

        assert_eq!(spec.params.opset, 13);
        assert_eq!(spec.params.imgsz, 320);
        assert!(spec.params.dynamic);
        assert_eq!(spec.weights, PathBuf::from("/srv/sw/models/last.pt"));
    }
}
