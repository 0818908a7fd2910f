//! Process execution adapter
//!
//! Runs one engine command per call, mirrors its diagnostic output to the
//! log and turns it into a progress signal.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::model::{CancelToken, CommandSpec, RunResult};
use crate::engine::progress::ProgressCallback;
use crate::error::{EngineError, EngineResult};
use crate::ports::ExecutePort;
use crate::utils::time::{extract_progress_time, format_elapsed};

/// How often the wait loop checks for cancellation and the deadline
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Highest fraction reported from output parsing; `1.0` is reserved for exit success
const PARSED_PROGRESS_CEILING: f64 = 0.99;

/// Process-backed implementation of [`ExecutePort`]
#[derive(Debug, Clone, Default)]
pub struct FFmpegAdapter {
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl FFmpegAdapter {
    /// Create new execution adapter without timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill invocations that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the in-flight invocation when `token` fires
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    fn execute(&self, spec: &CommandSpec, progress: &dyn ProgressCallback) -> EngineResult<()> {
        self.cancel.check()?;

        let mut command = Command::new(spec.program());
        command
            .args(spec.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }
        for (key, value) in spec.envs() {
            command.env(key, value);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| EngineError::LaunchFailure {
            program: spec.program().to_string(),
            source,
        })?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || pump_lines(stdout, tx)));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || pump_lines(stderr, tx)));
        }
        drop(tx);

        let deadline = self.timeout.map(|timeout| started + timeout);
        let mut meter = ProgressMeter::new(spec.expected_duration());
        let mut read_error: Option<io::Error> = None;

        loop {
            self.check_interrupts(spec, &mut child, deadline)?;
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(line)) => {
                    debug!(target: "engine_output", "{}", line);
                    progress.on_progress(meter.observe(&line));
                }
                Ok(Err(e)) => {
                    read_error.get_or_insert(e);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            self.check_interrupts(spec, &mut child, deadline)?;
            thread::sleep(POLL_INTERVAL);
        };

        for reader in readers {
            let _ = reader.join();
        }

        if let Some(e) = read_error {
            return Err(EngineError::Io(e));
        }
        if !status.success() {
            return Err(EngineError::NonZeroExit {
                program: spec.program().to_string(),
                code: status.code(),
            });
        }

        debug!(elapsed = %format_elapsed(started.elapsed()), "Engine command finished");
        Ok(())
    }

    /// Kill the child and bail out on cancellation or an expired deadline
    fn check_interrupts(
        &self,
        spec: &CommandSpec,
        child: &mut Child,
        deadline: Option<Instant>,
    ) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            kill(child);
            return Err(EngineError::Cancelled);
        }
        if let (Some(deadline), Some(timeout)) = (deadline, self.timeout) {
            if Instant::now() >= deadline {
                kill(child);
                return Err(EngineError::TimedOut {
                    program: spec.program().to_string(),
                    after: timeout,
                });
            }
        }
        Ok(())
    }
}

impl ExecutePort for FFmpegAdapter {
    fn run(&self, spec: &CommandSpec, progress: &dyn ProgressCallback) -> RunResult {
        info!(command = %spec, "Running engine command");
        let result = self.execute(spec, progress);
        match &result {
            Ok(()) => progress.on_progress(1.0),
            Err(e) => {
                warn!(program = spec.program(), kind = e.kind(), "Engine command failed: {}", e);
                progress.on_progress(0.0);
            }
        }
        RunResult::from(result)
    }
}

/// Kill and reap a child; reader threads are left to finish on their own
pub(crate) fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Forward every `\n`- or `\r`-terminated line of `source` to `tx`
fn pump_lines<R: Read>(source: R, tx: Sender<io::Result<String>>) {
    let mut reader = BufReader::new(source);
    let mut pending = Vec::new();
    loop {
        let chunk = match reader.fill_buf() {
            Ok([]) => break,
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };

        let consumed = chunk.len();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !flush_line(&mut pending, &tx) {
                    return;
                }
            } else {
                pending.push(byte);
            }
        }
        reader.consume(consumed);
    }
    flush_line(&mut pending, &tx);
}

/// Send the buffered line, if any; `false` once the receiver is gone
fn flush_line(pending: &mut Vec<u8>, tx: &Sender<io::Result<String>>) -> bool {
    if pending.is_empty() {
        return true;
    }
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    tx.send(Ok(line)).is_ok()
}

/// Turns output lines into a non-decreasing fraction of one invocation
struct ProgressMeter {
    expected: Option<f64>,
    current: f64,
}

impl ProgressMeter {
    fn new(expected: Option<f64>) -> Self {
        Self {
            expected,
            current: 0.0,
        }
    }

    /// One sample per line: the parsed fraction, or the previous value for lines without a timestamp
    fn observe(&mut self, line: &str) -> f64 {
        if let (Some(total), Some(elapsed)) = (self.expected, extract_progress_time(line)) {
            let fraction = (elapsed / total).clamp(0.0, PARSED_PROGRESS_CEILING);
            if fraction > self.current {
                self.current = fraction;
            }
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        samples: Mutex<Vec<f64>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, fraction: f64) {
            self.samples.lock().unwrap().push(fraction);
        }
    }

    impl Recorder {
        fn samples(&self) -> Vec<f64> {
            self.samples.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_progress_meter_without_expected_duration_repeats() {
        let mut meter = ProgressMeter::new(None);
        assert_eq!(meter.observe("time=00:00:05.00"), 0.0);
        assert_eq!(meter.observe("anything"), 0.0);
    }

    #[test]
    fn test_progress_meter_parses_and_never_decreases() {
        let mut meter = ProgressMeter::new(Some(10.0));
        assert_eq!(meter.observe("frame=1 time=00:00:02.00 bitrate=1"), 0.2);
        assert_eq!(meter.observe("frame=2 time=00:00:01.00 bitrate=1"), 0.2);
        assert_eq!(meter.observe("Stream mapping:"), 0.2);
        assert_eq!(meter.observe("frame=9 time=00:00:30.00 bitrate=1"), 0.99);
    }

    #[test]
    fn test_launch_failure_is_a_failed_result() {
        let recorder = Recorder::default();
        let spec = CommandSpec::new("/nonexistent/definitely-not-an-engine").arg("-version");

        let result = FFmpegAdapter::new().run(&spec, &recorder);

        assert!(matches!(
            result.error(),
            Some(EngineError::LaunchFailure { .. })
        ));
        assert_eq!(recorder.samples(), vec![0.0]);
    }

    #[test]
    fn test_cancelled_before_launch() {
        let recorder = Recorder::default();
        let token = CancelToken::new();
        token.cancel();
        let adapter = FFmpegAdapter::new().with_cancel_token(token);

        let result = adapter.run(&CommandSpec::new("sh").args(["-c", "exit 0"]), &recorder);

        assert!(matches!(result.error(), Some(EngineError::Cancelled)));
        assert_eq!(recorder.samples(), vec![0.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_one_sample_per_line_then_success() {
        let recorder = Recorder::default();
        let spec = CommandSpec::new("sh").args([
            "-c",
            "echo one; echo two 1>&2; printf 'three\\rfour\\n'",
        ]);

        let result = FFmpegAdapter::new().run(&spec, &recorder);

        assert!(result.is_success());
        let samples = recorder.samples();
        assert_eq!(samples.len(), 5);
        assert_eq!(*samples.last().unwrap(), 1.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit() {
        let recorder = Recorder::default();
        let spec = CommandSpec::new("sh").args(["-c", "echo failing 1>&2; exit 3"]);

        let result = FFmpegAdapter::new().run(&spec, &recorder);

        match result.error() {
            Some(EngineError::NonZeroExit { code, .. }) => assert_eq!(*code, Some(3)),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(*recorder.samples().last().unwrap(), 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_time_markers_drive_progress() {
        let recorder = Recorder::default();
        let spec = CommandSpec::new("sh")
            .args([
                "-c",
                "echo 'frame=1 time=00:00:01.00 bitrate=1'; echo 'frame=2 time=00:00:02.00 bitrate=1'",
            ])
            .expect_duration(Some(4.0));

        let result = FFmpegAdapter::new().run(&spec, &recorder);

        assert!(result.is_success());
        assert_eq!(recorder.samples(), vec![0.25, 0.5, 1.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_process() {
        let recorder = Recorder::default();
        let spec = CommandSpec::new("sh").args(["-c", "exec sleep 5"]);
        let adapter = FFmpegAdapter::new().with_timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let result = adapter.run(&spec, &recorder);

        assert!(matches!(result.error(), Some(EngineError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(recorder.samples(), vec![0.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_working_directory_and_env_are_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let recorder = Recorder::default();
        let spec = CommandSpec::new("sh")
            .args(["-c", "test \"$MARKER\" = yes && touch here"])
            .current_dir(dir.path())
            .env("MARKER", "yes");

        let result = FFmpegAdapter::new().run(&spec, &recorder);

        assert!(result.is_success());
        assert!(dir.path().join("here").exists());
    }
}
