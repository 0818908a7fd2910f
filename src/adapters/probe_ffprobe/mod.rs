//! FFprobe adapter for media duration probing
//!
//! Asks the probe binary for the container duration only and treats every
//! failure, including a timeout or cancellation, as "unknown".

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::adapters::exec_ffmpeg::{kill, POLL_INTERVAL};
use crate::domain::model::CancelToken;
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    program: PathBuf,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl FFprobeAdapter {
    /// Create new probe adapter for the given binary
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
            cancel: CancelToken::new(),
        }
    }

    /// Give up on probes that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the in-flight probe when `token` fires
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Arguments requesting nothing but the container duration as a bare number
    pub fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }

    /// Stdout of a successful run; `None` on launch failure, non-zero exit,
    /// timeout or cancellation
    fn capture_stdout(&self, mut command: Command) -> Option<String> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let mut child = match command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(probe = %self.program.display(), error = %e, "Duration probe could not be launched");
                return None;
            }
        };

        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let _ = stdout.read_to_end(&mut buffer);
                buffer
            })
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Duration probe could not be awaited");
                    kill(&mut child);
                    return None;
                }
            }
            if self.cancel.is_cancelled() {
                warn!("Duration probe cancelled");
                kill(&mut child);
                return None;
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    warn!(after = ?timeout, "Duration probe timed out");
                    kill(&mut child);
                    return None;
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            warn!(status = ?status.code(), "Duration probe reported failure");
            return None;
        }
        let stdout = reader.and_then(|r| r.join().ok()).unwrap_or_default();
        Some(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Default for FFprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl ProbePort for FFprobeAdapter {
    fn duration(&self, path: &Path) -> Option<f64> {
        let mut command = Command::new(&self.program);
        command.args(Self::probe_args(path));

        let duration = parse_duration_output(&self.capture_stdout(command)?);
        debug!(input = %path.display(), duration = ?duration, "Probed duration");
        duration
    }
}

/// Parse the single numeric token on the first line of a probe response
pub fn parse_duration_output(stdout: &str) -> Option<f64> {
    let first_line = stdout.lines().next()?;
    let mut tokens = first_line.split_whitespace();
    let token = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("12.5\n"), Some(12.5));
        assert_eq!(parse_duration_output("  60.000000  \n"), Some(60.0));
        assert_eq!(parse_duration_output(""), None);
        assert_eq!(parse_duration_output("N/A\n"), None);
        assert_eq!(parse_duration_output("12.5 13.0\n"), None);
        assert_eq!(parse_duration_output("-3\n"), None);
        assert_eq!(parse_duration_output("\n12.5\n"), None);
    }

    #[test]
    fn test_probe_args_end_with_input() {
        let args = FFprobeAdapter::probe_args(Path::new("/videos/in.mp4"));
        assert_eq!(args.last().map(String::as_str), Some("/videos/in.mp4"));
        assert!(args.contains(&"format=duration".to_string()));
    }

    #[test]
    fn test_missing_probe_binary_is_unknown() {
        let probe = FFprobeAdapter::new("/nonexistent/ffprobe");
        assert_eq!(probe.duration(Path::new("in.mp4")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_non_zero_exit_is_unknown() {
        let probe = FFprobeAdapter::new("false");
        assert_eq!(probe.duration(Path::new("in.mp4")), None);
    }

    #[test]
    fn test_cancelled_token_skips_launch() {
        let token = CancelToken::new();
        token.cancel();
        let probe = FFprobeAdapter::new("sh").with_cancel_token(token);
        let mut command = Command::new("sh");
        command.args(["-c", "echo 12.5"]);
        assert_eq!(probe.capture_stdout(command), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_stdout_of_successful_run() {
        let probe = FFprobeAdapter::new("sh");
        let mut command = Command::new("sh");
        command.args(["-c", "echo 12.5"]);
        let stdout = probe.capture_stdout(command).unwrap();
        assert_eq!(parse_duration_output(&stdout), Some(12.5));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_child() {
        let probe = FFprobeAdapter::new("sh").with_timeout(Some(Duration::from_millis(200)));
        let mut command = Command::new("sh");
        command.args(["-c", "exec sleep 5"]);

        let started = Instant::now();
        assert_eq!(probe.capture_stdout(command), None);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_hung_child() {
        let token = CancelToken::new();
        let probe = FFprobeAdapter::new("sh").with_cancel_token(token.clone());
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            token.cancel();
        });
        let mut command = Command::new("sh");
        command.args(["-c", "exec sleep 5"]);

        let started = Instant::now();
        assert_eq!(probe.capture_stdout(command), None);
        assert!(started.elapsed() < Duration::from_secs(4));
        trigger.join().unwrap();
    }
}
