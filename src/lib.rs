//! Nostalgia video remix library
//!
//! Orchestrates multi-step ffmpeg pipelines (speed change, random remix,
//! round mask, stutter) with scratch-space management and a monotone
//! progress signal.

pub mod adapters;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod plan;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{CancelToken, ClipSpec, CommandSpec, ProgressSample, RunResult};
pub use engine::progress::ProgressCallback;
pub use engine::{EditOperation, EngineConfig, VideoEditor};
pub use error::{EngineError, EngineResult};
pub use ports::{ExecutePort, ProbePort};
