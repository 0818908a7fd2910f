// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};

/// Fraction-complete value in `[0.0, 1.0]` delivered to a progress observer
pub type ProgressSample = f64;

/// Immutable description of one external invocation
///
/// Built once by a pipeline, handed to an [`ExecutePort`](crate::ports::ExecutePort)
/// and dropped after the invocation completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
    expected_duration: Option<f64>,
}

impl CommandSpec {
    /// Start a command for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
            expected_duration: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the process from a specific directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable on top of the inherited environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Expected media duration of the output, used to turn `time=` markers into fractions
    pub fn expect_duration(mut self, seconds: Option<f64>) -> Self {
        self.expected_duration = seconds.filter(|s| s.is_finite() && *s > 0.0);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn expected_duration(&self) -> Option<f64> {
        self.expected_duration
    }

    /// Value following a flag such as `-ss`, if present
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Last argument, which is the output path for every engine invocation we build
    pub fn output_arg(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Terminal outcome of one invocation or one pipeline
#[derive(Debug)]
pub enum RunResult {
    /// Exit status zero / every sub-step succeeded
    Success,
    /// Launch failure, non-zero exit, I/O failure, timeout or cancellation
    Failed(EngineError),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success)
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&EngineError> {
        match self {
            RunResult::Success => None,
            RunResult::Failed(err) => Some(err),
        }
    }

    /// Convert into a `Result` so callers can use `?`
    pub fn into_result(self) -> EngineResult<()> {
        match self {
            RunResult::Success => Ok(()),
            RunResult::Failed(err) => Err(err),
        }
    }
}

impl From<EngineResult<()>> for RunResult {
    fn from(result: EngineResult<()>) -> Self {
        match result {
            Ok(()) => RunResult::Success,
            Err(err) => RunResult::Failed(err),
        }
    }
}

/// One extraction to perform
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    pub source: PathBuf,
    pub start: f64,
    pub duration: f64,
}

impl ClipSpec {
    /// Create a clip, rejecting negative starts and empty durations
    pub fn new(source: impl Into<PathBuf>, start: f64, duration: f64) -> EngineResult<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "clip start must be >= 0, got {}",
                start
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "clip duration must be > 0, got {}",
                duration
            )));
        }
        Ok(Self {
            source: source.into(),
            start,
            duration,
        })
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Shared flag used to abort a pipeline between sub-steps and kill its in-flight process
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has fired
    pub fn check(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
