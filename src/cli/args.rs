//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use clap_num::number_range;

use crate::domain::rules::TempoRules;
use crate::engine::{EditOperation, EngineConfig};
use crate::plan::PlanOptions;

/// Arguments for the speed command
#[derive(Args, Debug)]
pub struct SpeedArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: auto-generated next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Playback speed multiplier (2.0 = twice as fast)
    #[arg(short, long, default_value_t = 2.0, value_parser = speed_multiplier)]
    pub multiplier: f64,

    /// Drop the audio track instead of re-timing it
    #[arg(long)]
    pub no_audio: bool,
}

/// Arguments for the remix command
#[derive(Args, Debug)]
pub struct RemixArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: auto-generated next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of clips (default from config)
    #[arg(long, value_parser = clip_count)]
    pub clips: Option<usize>,

    /// Length of every clip in seconds (default from config)
    #[arg(long, value_parser = positive_float)]
    pub length: Option<f64>,

    /// Seed for reproducible clip offsets
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the round command
#[derive(Args, Debug)]
pub struct RoundArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: auto-generated next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Edge length of the square output in pixels (default from config)
    #[arg(long, value_parser = mask_size)]
    pub size: Option<u32>,
}

/// Arguments for the stutter command
#[derive(Args, Debug)]
pub struct StutterArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: auto-generated next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file path
    #[arg(short, long)]
    pub input: PathBuf,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the effective configuration here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Seed for a reproducible plan
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of segments
    #[arg(long, default_value_t = 6, value_parser = segment_count)]
    pub segments: usize,

    /// Tempo suggestion in percent (50-200)
    #[arg(long, default_value_t = 100, value_parser = speed_percent)]
    pub speed: u32,

    /// Leave out YTP material
    #[arg(long)]
    pub no_ytp: bool,

    /// Leave out YTPMV material
    #[arg(long)]
    pub no_ytpmv: bool,

    /// Leave out remix material
    #[arg(long)]
    pub no_remix: bool,

    /// Suggest round loops
    #[arg(long)]
    pub round_loop: bool,

    /// Suggest annoying effects and shorter segments
    #[arg(long)]
    pub annoying: bool,

    /// Suggest a fake commercial insert
    #[arg(long)]
    pub commercial: bool,

    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    pub fn options(&self) -> PlanOptions {
        PlanOptions {
            include_ytp: !self.no_ytp,
            include_ytpmv: !self.no_ytpmv,
            include_remix: !self.no_remix,
            add_round_loop: self.round_loop,
            speed_percent: self.speed,
            annoying: self.annoying,
            add_commercial: self.commercial,
            segment_count: self.segments,
        }
    }
}

/// Edit applied by the batch command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOperation {
    Speed,
    Remix,
    Round,
    Stutter,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory to scan for videos
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Edit to apply
    #[arg(long, value_enum)]
    pub op: BatchOperation,

    /// Descend into sub-directories
    #[arg(short, long)]
    pub recursive: bool,

    /// Directory for outputs (default: next to each input)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Concurrent jobs (default from config, else CPU count)
    #[arg(short, long, value_parser = job_count)]
    pub jobs: Option<usize>,

    /// Speed multiplier for `--op speed`
    #[arg(short, long, default_value_t = 2.0, value_parser = speed_multiplier)]
    pub multiplier: f64,

    /// Base seed for `--op remix`; job `n` uses `seed + n`
    #[arg(long)]
    pub seed: Option<u64>,
}

impl BatchArgs {
    /// Operation for the `index`-th input
    pub fn operation(&self, config: &EngineConfig, index: usize) -> EditOperation {
        match self.op {
            BatchOperation::Speed => EditOperation::Speed {
                multiplier: self.multiplier,
                keep_audio: true,
            },
            BatchOperation::Remix => EditOperation::Remix {
                clip_count: config.remix.clip_count,
                clip_length: config.remix.clip_length,
                seed: self.seed.map(|seed| seed.wrapping_add(index as u64)),
            },
            BatchOperation::Round => EditOperation::RoundMask,
            BatchOperation::Stutter => EditOperation::Stutter,
        }
    }
}

fn speed_percent(s: &str) -> Result<u32, String> {
    number_range(s, 50, 200)
}

fn segment_count(s: &str) -> Result<usize, String> {
    number_range(s, 1, 100)
}

fn clip_count(s: &str) -> Result<usize, String> {
    number_range(s, 1, 1000)
}

fn job_count(s: &str) -> Result<usize, String> {
    number_range(s, 1, 256)
}

fn mask_size(s: &str) -> Result<u32, String> {
    number_range(s, 16, 8192)
}

pub(crate) fn positive_seconds(s: &str) -> Result<u64, String> {
    number_range(s, 1, u64::MAX)
}

fn positive_float(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("`{}` must be a positive number", s));
    }
    Ok(value)
}

fn speed_multiplier(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    TempoRules::validate_multiplier(value).map_err(|e| e.to_string())?;
    Ok(value)
}
