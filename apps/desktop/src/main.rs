use std::{
    collections::VecDeque,
    io::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

use analysis_engine::MockAnalysisEngine;
use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::{apply_env_overrides, load_settings_from},
    display::{render_intake_banner, render_progress, render_results, step_marker},
    load_settings, ControllerEvent, ControllerSettings, IntakeOutcome, ProgressController,
    UploadIntake,
};
use shared::{
    domain::{AnalysisStep, DocumentAnalysis, RunId},
    protocol::FileDescriptor,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Terminal front-end for the document analyzer.
#[derive(Parser, Debug)]
struct Args {
    /// Documents to analyze. Without any, paths are read from stdin.
    paths: Vec<PathBuf>,
    /// Settings file; defaults to `analysis.toml` or `APP__SETTINGS_PATH`.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    step_delay_ms: Option<u64>,
    #[arg(long)]
    result_delay_ms: Option<u64>,
    /// Print each result as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    info!(
        "desktop: step_delay_ms={} result_delay_ms={} step_timeout_ms={:?}",
        settings.step_delay_ms, settings.result_delay_ms, settings.step_timeout_ms
    );

    let engine = Arc::new(MockAnalysisEngine::new(settings.mock_engine_options()));
    let controller = ProgressController::new_with_settings(engine, settings);
    let intake = UploadIntake::new(Arc::clone(&controller));

    let interactive = args.paths.is_empty();
    let mut queued: VecDeque<PathBuf> = args.paths.into();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    print!("{}", render_intake_banner(false));
    loop {
        let path = match queued.pop_front() {
            Some(path) => path,
            None if interactive => {
                print!("Document path (blank to quit): ");
                std::io::stdout().flush()?;
                match stdin.next_line().await? {
                    Some(line) if !line.trim().is_empty() => PathBuf::from(line.trim()),
                    _ => break,
                }
            }
            None => break,
        };

        if let Err(err) = analyze(&intake, &path, args.json).await {
            error!("desktop: {err:#}");
            eprintln!("Error: {err:#}");
        }

        // Back to idle for the next document.
        controller.reset().await;
        if interactive {
            println!();
            print!("{}", render_intake_banner(false));
        }
    }

    Ok(())
}

fn resolve_settings(args: &Args) -> Result<ControllerSettings> {
    let mut settings = match &args.config {
        Some(path) => apply_env_overrides(load_settings_from(path)?, |key| {
            std::env::var(key).ok()
        }),
        None => load_settings(),
    };
    if let Some(ms) = args.step_delay_ms {
        settings.step_delay_ms = ms;
    }
    if let Some(ms) = args.result_delay_ms {
        settings.result_delay_ms = ms;
    }
    Ok(settings)
}

async fn read_document(path: &Path) -> Result<FileDescriptor> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(FileDescriptor::new(name, mime_type, content))
}

async fn analyze(intake: &UploadIntake, path: &Path, json: bool) -> Result<()> {
    let file = read_document(path).await?;
    let controller = intake.controller();
    let mut events = controller.event_stream();

    let run = match intake.submit(file).await {
        Ok(IntakeOutcome::Started(run)) => run,
        Ok(IntakeOutcome::Ignored) => {
            println!("An analysis is already running; try again when it finishes.");
            return Ok(());
        }
        Err(err) => {
            println!("Rejected: {}", err.report().message);
            return Ok(());
        }
    };

    tokio::select! {
        outcome = follow_run(run, &mut events) => {
            let analysis = outcome?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!();
                print!("{}", render_results(&analysis));
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            warn!("desktop: run={run} interrupted");
            controller.reset().await;
            println!("\nAnalysis cancelled.");
        }
    }
    Ok(())
}

/// Prints progress for `run` until it ends and returns its final record.
async fn follow_run(
    run: RunId,
    events: &mut BroadcastStream<ControllerEvent>,
) -> Result<DocumentAnalysis> {
    let mut steps: Vec<AnalysisStep> = Vec::new();
    loop {
        let event = match events.next().await {
            Some(Ok(event)) => event,
            Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                warn!("desktop: skipped {skipped} progress events");
                continue;
            }
            None => bail!("controller event channel closed"),
        };
        if event.run() != run {
            continue;
        }

        match event {
            ControllerEvent::RunStarted { steps: planned, .. } => {
                steps = planned;
                print!("{}", render_intake_banner(true));
                println!();
                print!("{}", render_progress(&steps));
            }
            ControllerEvent::StepChanged { index, status, .. } => {
                if let Some(step) = steps.get_mut(index) {
                    step.status = status;
                    println!("{} {}", step_marker(index, status), step.title);
                }
            }
            ControllerEvent::Finalizing { .. } => println!("Preparing results..."),
            ControllerEvent::RunCompleted { analysis, .. } => return Ok(analysis),
            ControllerEvent::RunFailed { analysis, .. } => return Ok(analysis),
            ControllerEvent::RunAborted { .. } => bail!("run {run} was aborted"),
        }
    }
}
