//! CLI module for nostalgia
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Nostalgia video remix tool
///
/// Drives ffmpeg through speed changes, random remixes, round masks and the
/// stutter preset, and generates plan text for manual edits.
#[derive(Parser, Debug)]
#[command(name = "nostalgia")]
#[command(about = "Nostalgia - speed, remix, round and stutter edits on top of ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Transcoding engine binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// Metadata probe binary
    #[arg(long, global = true)]
    pub ffprobe: Option<String>,

    /// Per-invocation timeout in seconds
    #[arg(long, global = true, value_parser = args::positive_seconds)]
    pub timeout: Option<u64>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit progress and results as JSON lines on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors and hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Change playback speed of a video
    Speed(args::SpeedArgs),
    /// Concatenate random clips of a video
    Remix(args::RemixArgs),
    /// Crop a video to a circle with transparent corners
    Round(args::RoundArgs),
    /// Speed up a video and chop it into a stutter
    Stutter(args::StutterArgs),
    /// Print the duration of a media file
    Probe(args::ProbeArgs),
    /// Generate an editing plan
    Plan(args::PlanArgs),
    /// Apply one edit to every video in a directory
    Batch(args::BatchArgs),
    /// Print the effective configuration as TOML
    Config(args::ConfigArgs),
}
