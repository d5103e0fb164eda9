//! LEO Orbit Processing Pipeline CLI
//!
//! Usage:
//!   orbit-pipeline run-all --input catalog.json --output-dir out/
//!   orbit-pipeline stage3 --input catalog.json --output-dir out/ --config config.json
//!
//! Each `stageN` subcommand re-runs every stage up to and including N in one
//! process and writes every intermediate artifact along the way - stage
//! inputs (propagated time series with look angles) don't round-trip
//! losslessly through the JSON artifact schema, so "resume from stage N's
//! artifact" isn't offered; "one invocation per stage boundary" is.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orbit_model::config::PipelineConfig;
use orbit_model::error::PipelineError;
use orbit_model::stats::StatsCollector;
use orbit_pipeline::{run_stage2, run_stage3, run_stage4, run_stage5, ArtifactWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "orbit-pipeline", about = "LEO satellite orbit processing pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the Stage-1 TLE catalog input.
    #[arg(short, long, global = true, default_value = "input.json")]
    input: PathBuf,

    /// Directory intermediate and final artifacts are written to.
    #[arg(short, long, global = true, default_value = "out")]
    output_dir: PathBuf,

    /// Path to a JSON configuration file; falls back to documented defaults
    /// for any key it omits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `PipelineConfig::workers`.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// `trace`/`debug`/`info`/`warn`/`error`.
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage 2: propagation + frame transforms + look angles.
    Stage2,
    /// Stages 2-3: + visibility gating, signal estimation, link feasibility.
    Stage3,
    /// Stages 2-4: + 3GPP event detection on the feasible subset.
    Stage4,
    /// Stages 2-5: + pool verification, handover evaluation, RL datasets.
    Stage5,
    /// The full pipeline, equivalent to `stage5`.
    RunAll,
}

fn load_config(path: Option<&PathBuf>, workers_override: Option<usize>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("reading config file {}", p.display()))?;
            serde_json::from_str(&raw).with_context(|| "parsing config JSON")?
        }
        None => PipelineConfig::default(),
    };
    if let Some(w) = workers_override {
        config.workers = w;
    }
    Ok(config)
}

fn report_and_exit(err: PipelineError) -> ExitCode {
    let report = err.to_report("orbit-pipeline-cli");
    eprintln!(
        "{}",
        serde_json::to_string(&report).unwrap_or_else(|_| "{\"error_kind\":\"SerializationFailure\"}".to_string())
    );
    ExitCode::from(err.exit_code() as u8)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(args.log_level).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a global tracing subscriber was already installed");
    }

    let config = match load_config(args.config.as_ref(), args.workers) {
        Ok(c) => c,
        Err(e) => {
            return report_and_exit(PipelineError::InputMalformed(e.to_string()));
        }
    };

    let started_at = chrono::Utc::now();
    let writer = ArtifactWriter::new(&args.output_dir, started_at);

    info!(stage = ?args.command, input = %args.input.display(), "starting pipeline run");

    let result = run(&args.command, &args.input, &config, &writer);

    match result {
        Ok(()) => {
            info!("pipeline run complete");
            ExitCode::SUCCESS
        }
        Err(e) => report_and_exit(e),
    }
}

fn run(
    command: &Command,
    input: &PathBuf,
    config: &PipelineConfig,
    writer: &ArtifactWriter,
) -> std::result::Result<(), PipelineError> {
    let stats = StatsCollector::new();
    let catalog = orbit_pipeline::load_input(input)?;

    let (mut series_list, stage2_artifact) = run_stage2(&catalog, config, &stats)?;
    writer.write_stage(2, &stage2_artifact)?;
    if matches!(command, Command::Stage2) {
        return Ok(());
    }

    let stage3_artifact = run_stage3(&mut series_list, config);
    writer.write_stage(3, &stage3_artifact)?;
    if matches!(command, Command::Stage3) {
        return Ok(());
    }

    let stage4_artifact = run_stage4(
        &series_list,
        &stage3_artifact.data,
        config,
        config.serving_sat_id.as_deref(),
    );
    writer.write_stage(4, &stage4_artifact)?;
    if matches!(command, Command::Stage4) {
        return Ok(());
    }

    let stage5_artifact = run_stage5(&series_list, &stage3_artifact.data, config)?;
    writer.write_stage(5, &stage5_artifact)?;

    Ok(())
}
