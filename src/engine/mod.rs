//! Edit engine: configuration, shared plumbing and the four edit pipelines

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::adapters::{FFmpegAdapter, FFprobeAdapter};
use crate::domain::model::{CancelToken, ClipSpec, CommandSpec, RunResult};
use crate::error::{EngineError, EngineResult};
use crate::ports::{ExecutePort, ProbePort};
use crate::utils::path::container_extension;
use crate::utils::time::{format_elapsed, format_seconds};

pub mod manifest;
pub mod progress;
pub mod remix;
pub mod round;
pub mod scratch;
pub mod speed;
pub mod stutter;

pub use manifest::ConcatManifestBuilder;
pub use progress::{ProgressCallback, ProgressTracker};
pub use scratch::ScratchSpace;
pub use speed::SpeedOptions;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Transcoding engine binary
    pub ffmpeg_path: String,
    /// Metadata probe binary
    pub ffprobe_path: String,
    /// Per-invocation timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Where scratch directories are created (system temp dir when unset)
    pub scratch_root: Option<PathBuf>,
    /// Concurrent jobs in batch mode (CPU count when unset)
    pub max_parallel_jobs: Option<usize>,
    pub remix: RemixConfig,
    pub stutter: StutterConfig,
    pub round_mask: RoundMaskConfig,
    pub logging: LoggingConfig,
}

/// Defaults for the random remix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemixConfig {
    pub clip_count: usize,
    pub clip_length: f64,
}

/// Stutter preset parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StutterConfig {
    /// Speed-up applied before cutting
    pub multiplier: f64,
    /// Length of every stutter clip in seconds
    pub clip_length: f64,
    /// Upper bound on extracted clips, which bounds process fan-out
    pub max_parts: usize,
}

/// Round mask parameters; `filter` is handed to the engine as-is after `{size}` substitution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoundMaskConfig {
    pub size: u32,
    pub filter: String,
    pub video_codec: String,
    pub pixel_format: String,
    pub audio_codec: String,
    pub extension: String,
}

/// Logging options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: None,
            scratch_root: None,
            max_parallel_jobs: None,
            remix: RemixConfig::default(),
            stutter: StutterConfig::default(),
            round_mask: RoundMaskConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RemixConfig {
    fn default() -> Self {
        Self {
            clip_count: 6,
            clip_length: 2.0,
        }
    }
}

impl Default for StutterConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.75,
            clip_length: 0.08,
            max_parts: 80,
        }
    }
}

impl Default for RoundMaskConfig {
    fn default() -> Self {
        Self {
            size: 720,
            filter: "crop='min(iw,ih)':'min(iw,ih)',scale={size}:{size},format=rgba,\
                     geq=r='r(X,Y)':g='g(X,Y)':b='b(X,Y)':\
                     a='if(lt(pow(X-W/2,2)+pow(Y-H/2,2),pow(min(W,H)/2,2)),255,0)'"
                .to_string(),
            video_codec: "libvpx-vp9".to_string(),
            pixel_format: "yuva420p".to_string(),
            audio_codec: "libopus".to_string(),
            extension: "webm".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Per-invocation timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Number of concurrent batch jobs
    pub fn parallel_jobs(&self) -> usize {
        self.max_parallel_jobs.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Reject values no pipeline can work with
    pub fn validate(&self) -> EngineResult<()> {
        if self.ffmpeg_path.trim().is_empty() || self.ffprobe_path.trim().is_empty() {
            return Err(EngineError::Config("engine and probe paths must not be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(EngineError::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.max_parallel_jobs == Some(0) {
            return Err(EngineError::Config("max_parallel_jobs must be at least 1".to_string()));
        }
        if self.remix.clip_count == 0 || !is_positive(self.remix.clip_length) {
            return Err(EngineError::Config(
                "remix needs clip_count >= 1 and clip_length > 0".to_string(),
            ));
        }
        if !is_positive(self.stutter.multiplier)
            || !is_positive(self.stutter.clip_length)
            || self.stutter.max_parts == 0
        {
            return Err(EngineError::Config(
                "stutter needs multiplier > 0, clip_length > 0 and max_parts >= 1".to_string(),
            ));
        }
        if self.round_mask.size == 0 {
            return Err(EngineError::Config("round_mask.size must be positive".to_string()));
        }
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(EngineError::Config(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                other
            ))),
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// One user-facing transform
#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation {
    Speed { multiplier: f64, keep_audio: bool },
    Remix {
        clip_count: usize,
        clip_length: f64,
        seed: Option<u64>,
    },
    RoundMask,
    Stutter,
}

impl EditOperation {
    /// Name used in default output file names
    pub fn slug(&self) -> &'static str {
        match self {
            EditOperation::Speed { .. } => "speed",
            EditOperation::Remix { .. } => "random",
            EditOperation::RoundMask => "round",
            EditOperation::Stutter => "annoying",
        }
    }

    /// Output container extension for this operation
    pub fn output_extension(&self, input: &Path, config: &EngineConfig) -> String {
        match self {
            EditOperation::RoundMask => config.round_mask.extension.clone(),
            _ => container_extension(input),
        }
    }
}

/// Runs edit pipelines against an execution port and a probe port
pub struct VideoEditor {
    runner: Arc<dyn ExecutePort>,
    probe: Arc<dyn ProbePort>,
    config: EngineConfig,
    cancel: CancelToken,
}

impl VideoEditor {
    /// Create an editor over explicit ports
    pub fn new(runner: Arc<dyn ExecutePort>, probe: Arc<dyn ProbePort>, config: EngineConfig) -> Self {
        Self {
            runner,
            probe,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Create an editor that runs the configured engine binaries
    pub fn from_config(config: EngineConfig, cancel: CancelToken) -> Self {
        let runner = FFmpegAdapter::new()
            .with_timeout(config.timeout())
            .with_cancel_token(cancel.clone());
        let probe = FFprobeAdapter::new(config.ffprobe_path.clone())
            .with_timeout(config.timeout())
            .with_cancel_token(cancel.clone());
        Self {
            runner: Arc::new(runner),
            probe: Arc::new(probe),
            config,
            cancel,
        }
    }

    /// Check `token` between sub-steps
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run any operation; remixes without a seed draw from fresh entropy
    pub fn run_operation(
        &self,
        operation: &EditOperation,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> RunResult {
        match operation {
            EditOperation::Speed {
                multiplier,
                keep_audio,
            } => self.speed_change_with(
                input,
                output,
                SpeedOptions {
                    multiplier: *multiplier,
                    keep_audio: *keep_audio,
                },
                progress,
            ),
            EditOperation::Remix {
                clip_count,
                clip_length,
                seed,
            } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                self.random_remix(input, output, *clip_count, *clip_length, &mut rng, progress)
            }
            EditOperation::RoundMask => self.round_mask(input, output, progress),
            EditOperation::Stutter => self.stutter(input, output, progress),
        }
    }

    /// Engine command with overwrite enabled
    fn engine_command(&self) -> CommandSpec {
        CommandSpec::new(self.config.ffmpeg_path.clone()).arg("-y")
    }

    /// Lossless copy of one clip
    fn extract_clip_spec(&self, clip: &ClipSpec, destination: &Path) -> CommandSpec {
        self.engine_command()
            .arg("-ss")
            .arg(format_seconds(clip.start))
            .arg("-i")
            .path_arg(&clip.source)
            .arg("-t")
            .arg(format_seconds(clip.duration))
            .args(["-c", "copy"])
            .path_arg(destination)
            .expect_duration(Some(clip.duration))
    }

    /// Lossless merge of the clips listed in a manifest
    fn concat_spec(&self, manifest: &Path, output: &Path, expected: f64) -> CommandSpec {
        self.engine_command()
            .args(["-f", "concat", "-safe", "0", "-i"])
            .path_arg(manifest)
            .args(["-c", "copy"])
            .path_arg(output)
            .expect_duration(Some(expected))
    }

    /// Run one sub-step unless the pipeline has been cancelled
    fn invoke(&self, spec: &CommandSpec, progress: &dyn ProgressCallback) -> EngineResult<()> {
        self.cancel.check()?;
        self.runner.run(spec, progress).into_result()
    }

    fn acquire_scratch(&self, prefix: &str) -> EngineResult<ScratchSpace> {
        match &self.config.scratch_root {
            Some(root) => ScratchSpace::acquire_in(prefix, root),
            None => ScratchSpace::acquire(prefix),
        }
    }

    /// Duration probe with a log line for the unknown case
    fn probe_duration(&self, path: &Path) -> Option<f64> {
        let duration = self.probe.duration(path);
        if duration.is_none() {
            warn!(input = %path.display(), "Input duration unknown");
        }
        duration
    }

    /// Convert a pipeline outcome into its `RunResult` and terminal progress sample
    fn finish(
        &self,
        operation: &str,
        tracker: &ProgressTracker<'_>,
        result: EngineResult<()>,
        started: Instant,
    ) -> RunResult {
        match &result {
            Ok(()) => {
                tracker.report(1.0);
                info!(
                    operation,
                    elapsed = %format_elapsed(started.elapsed()),
                    "Edit completed"
                );
            }
            Err(e) => {
                let reached = tracker.current();
                tracker.fail();
                error!(operation, kind = e.kind(), reached, "Edit failed: {}", e);
            }
        }
        RunResult::from(result)
    }
}

/// Release a scratch tree, logging instead of failing the pipeline
fn release_scratch(scratch: &mut ScratchSpace) {
    if let Err(e) = scratch.release() {
        warn!(path = %scratch.path().display(), error = %e, "Failed to remove scratch space");
    }
}
