//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::adapters::{FFprobeAdapter, TomlConfigAdapter};
use crate::cli::args::{BatchArgs, ConfigArgs, PlanArgs, ProbeArgs};
use crate::cli::Commands;
use crate::domain::model::CancelToken;
use crate::engine::progress::{ConsoleProgressCallback, JsonProgressCallback, NoOpProgressCallback};
use crate::engine::{EditOperation, EngineConfig, VideoEditor};
use crate::plan::PlanGenerator;
use crate::ports::ProbePort;
use crate::utils::path::{default_output_path, is_video_file};
use crate::utils::time::format_seconds;

/// State shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: EngineConfig,
    pub cancel: CancelToken,
    pub json: bool,
    pub quiet: bool,
}

impl CommandContext {
    pub fn editor(&self) -> VideoEditor {
        VideoEditor::from_config(self.config.clone(), self.cancel.clone())
    }
}

/// Execute one of the single-file edit commands
pub fn edit(command: Commands, ctx: &CommandContext) -> Result<()> {
    let config = &ctx.config;
    let (operation, input, output) = match command {
        Commands::Speed(args) => (
            EditOperation::Speed {
                multiplier: args.multiplier,
                keep_audio: !args.no_audio,
            },
            args.input,
            args.output,
        ),
        Commands::Remix(args) => (
            EditOperation::Remix {
                clip_count: args.clips.unwrap_or(config.remix.clip_count),
                clip_length: args.length.unwrap_or(config.remix.clip_length),
                seed: args.seed,
            },
            args.input,
            args.output,
        ),
        Commands::Round(args) => {
            let mut ctx = ctx.clone();
            if let Some(size) = args.size {
                ctx.config.round_mask.size = size;
            }
            return run_single(&ctx, EditOperation::RoundMask, &args.input, args.output);
        }
        Commands::Stutter(args) => (EditOperation::Stutter, args.input, args.output),
        other => bail!("{:?} is not an edit command", other),
    };
    run_single(ctx, operation, &input, output)
}

fn run_single(
    ctx: &CommandContext,
    operation: EditOperation,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    if !input.is_file() {
        bail!("Input file does not exist: {}", input.display());
    }
    let output = output.unwrap_or_else(|| {
        default_output_path(
            input,
            operation.slug(),
            &operation.output_extension(input, &ctx.config),
        )
    });

    info!(
        operation = operation.slug(),
        input = %input.display(),
        output = %output.display(),
        "Starting edit"
    );

    let editor = ctx.editor();
    let result = if ctx.json {
        let progress = JsonProgressCallback::new(job_name(input));
        editor.run_operation(&operation, input, &output, &progress)
    } else if ctx.quiet {
        editor.run_operation(&operation, input, &output, &NoOpProgressCallback)
    } else {
        let progress = ConsoleProgressCallback::new(operation.slug());
        let result = editor.run_operation(&operation, input, &output, &progress);
        progress.finish();
        result
    };

    result
        .into_result()
        .with_context(|| format!("{} edit of {} failed", operation.slug(), input.display()))?;

    report_output(ctx, input, &output);
    Ok(())
}

/// Execute the probe command
pub fn probe(args: &ProbeArgs, ctx: &CommandContext) -> Result<()> {
    let probe = FFprobeAdapter::new(ctx.config.ffprobe_path.clone())
        .with_timeout(ctx.config.timeout())
        .with_cancel_token(ctx.cancel.clone());
    let duration = probe.duration(&args.input);

    if ctx.json {
        let event = serde_json::json!({
            "event": "probe",
            "input": args.input.display().to_string(),
            "duration": duration,
        });
        println!("{}", event);
    } else {
        match duration {
            Some(seconds) => println!("{}", format_seconds(seconds)),
            None => println!("unknown"),
        }
    }
    Ok(())
}

/// Execute the plan command
pub fn plan(args: &PlanArgs) -> Result<()> {
    let mut generator = match args.seed {
        Some(seed) => PlanGenerator::new(seed),
        None => PlanGenerator::from_entropy(),
    };
    let text = generator.generate(&args.options());

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            info!(path = %path.display(), "Plan written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Execute the config command
pub fn config(args: &ConfigArgs, ctx: &CommandContext) -> Result<()> {
    let text = TomlConfigAdapter::to_toml(&ctx.config)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            info!(path = %path.display(), "Config written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Execute the batch command
pub async fn batch(args: BatchArgs, ctx: CommandContext) -> Result<()> {
    let inputs = collect_inputs(&args.dir, args.recursive)?;
    if inputs.is_empty() {
        warn!(dir = %args.dir.display(), "No video files found");
        return Ok(());
    }
    if let Some(out_dir) = &args.out_dir {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    }

    let jobs = args.jobs.unwrap_or_else(|| ctx.config.parallel_jobs());
    info!(files = inputs.len(), jobs, "Starting batch");

    let editor = Arc::new(ctx.editor());
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut set = JoinSet::new();
    let total = inputs.len();

    for (index, input) in inputs.into_iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Batch scheduler closed")?;

        let operation = args.operation(&ctx.config, index);
        let output = batch_output_path(&input, args.out_dir.as_deref(), &operation, &ctx.config);
        let editor = Arc::clone(&editor);
        let json = ctx.json;

        set.spawn_blocking(move || {
            let _permit = permit;
            let result = if json {
                let progress = JsonProgressCallback::new(job_name(&input));
                editor.run_operation(&operation, &input, &output, &progress)
            } else {
                editor.run_operation(&operation, &input, &output, &NoOpProgressCallback)
            };
            (input, output, result)
        });
    }

    let mut failures = 0;
    let mut finished = 0;
    while let Some(joined) = set.join_next().await {
        let (input, output, result) = joined.context("Batch job panicked")?;
        finished += 1;
        match result.error() {
            None => report_output(&ctx, &input, &output),
            Some(e) => {
                failures += 1;
                if ctx.json {
                    let event = serde_json::json!({
                        "event": "failed",
                        "input": input.display().to_string(),
                        "kind": e.kind(),
                        "error": e.to_string(),
                    });
                    println!("{}", event);
                } else {
                    eprintln!("failed: {}: {}", input.display(), e);
                }
            }
        }
    }

    if ctx.cancel.is_cancelled() && finished < total {
        bail!("Batch cancelled after {} of {} files", finished, total);
    }
    if failures > 0 {
        bail!("{} of {} batch jobs failed", failures, total);
    }
    info!(files = total, "Batch completed");
    Ok(())
}

/// Video files directly in `dir`, or anywhere below it when `recursive`
pub fn collect_inputs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut inputs = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if entry.file_type().is_file() && is_video_file(entry.path()) {
            inputs.push(entry.into_path());
        }
    }
    Ok(inputs)
}

fn batch_output_path(
    input: &Path,
    out_dir: Option<&Path>,
    operation: &EditOperation,
    config: &EngineConfig,
) -> PathBuf {
    let next_to_input =
        default_output_path(input, operation.slug(), &operation.output_extension(input, config));
    match (out_dir, next_to_input.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => next_to_input,
    }
}

fn report_output(ctx: &CommandContext, input: &Path, output: &Path) {
    if ctx.json {
        let event = serde_json::json!({
            "event": "completed",
            "input": input.display().to_string(),
            "output": output.display().to_string(),
        });
        println!("{}", event);
    } else {
        println!("{}", output.display());
    }
}

fn job_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}
