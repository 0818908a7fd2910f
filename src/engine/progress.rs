//! Progress callbacks and sub-step rescaling

use std::io::Write;
use std::sync::Mutex;

use crate::domain::model::ProgressSample;
use crate::domain::rules::scale_into;

/// Observer of fractional progress in `[0.0, 1.0]`
pub trait ProgressCallback: Send + Sync {
    /// Called for every progress sample
    fn on_progress(&self, fraction: ProgressSample);
}

impl<F> ProgressCallback for F
where
    F: Fn(ProgressSample) + Send + Sync,
{
    fn on_progress(&self, fraction: ProgressSample) {
        self(fraction)
    }
}

/// Monotone front for a pipeline's caller-facing progress signal
///
/// Every reported value is clamped to `[0, 1]` and raised to the highest
/// value seen so far, so sub-steps that restart at zero never make the
/// overall signal go backwards. [`ProgressTracker::fail`] is the single
/// exception: it emits the terminal `0.0`.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressCallback,
    high_water: Mutex<f64>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressCallback) -> Self {
        Self {
            sink,
            high_water: Mutex::new(0.0),
        }
    }

    /// Report overall progress
    pub fn report(&self, fraction: ProgressSample) {
        let value = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let emitted = match self.high_water.lock() {
            Ok(mut high_water) => {
                if value > *high_water {
                    *high_water = value;
                }
                *high_water
            }
            Err(_) => value,
        };
        self.sink.on_progress(emitted);
    }

    /// Callback that maps a sub-step's `[0, 1]` onto `[start, end]` of the overall signal
    pub fn stage(&self, start: f64, end: f64) -> StageProgress<'_, 'a> {
        StageProgress {
            tracker: self,
            start,
            end,
        }
    }

    /// Emit the terminal failure sample
    pub fn fail(&self) {
        self.sink.on_progress(0.0);
    }

    /// Highest value reported so far
    pub fn current(&self) -> f64 {
        self.high_water.lock().map(|v| *v).unwrap_or(0.0)
    }
}

/// Sub-range view of a [`ProgressTracker`]
pub struct StageProgress<'t, 'a> {
    tracker: &'t ProgressTracker<'a>,
    start: f64,
    end: f64,
}

impl ProgressCallback for StageProgress<'_, '_> {
    fn on_progress(&self, fraction: ProgressSample) {
        self.tracker
            .report(scale_into(fraction, self.start, self.end));
    }
}

/// Console progress bar on stderr for CLI usage
pub struct ConsoleProgressCallback {
    label: String,
    last_percent: Mutex<Option<u32>>,
}

impl ConsoleProgressCallback {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_percent: Mutex::new(None),
        }
    }

    /// Move past the progress line once the operation is over
    pub fn finish(&self) {
        eprintln!();
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, fraction: ProgressSample) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
        if let Ok(mut last) = self.last_percent.lock() {
            if *last == Some(percent) {
                return;
            }
            *last = Some(percent);
        }

        let bar_length = 20;
        let filled = (percent as usize * bar_length) / 100;
        let bar = "#".repeat(filled) + &"-".repeat(bar_length - filled);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{} [{}] {:>3}%", self.label, bar, percent);
        let _ = stderr.flush();
    }
}

/// JSON-lines progress events on stdout for structured consumers
pub struct JsonProgressCallback {
    job: String,
    last_fraction: Mutex<Option<f64>>,
}

impl JsonProgressCallback {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            last_fraction: Mutex::new(None),
        }
    }
}

impl ProgressCallback for JsonProgressCallback {
    fn on_progress(&self, fraction: ProgressSample) {
        if let Ok(mut last) = self.last_fraction.lock() {
            if *last == Some(fraction) {
                return;
            }
            *last = Some(fraction);
        }

        let event = serde_json::json!({
            "event": "progress",
            "job": self.job,
            "fraction": fraction,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }
}

/// No-op progress callback for when progress tracking is disabled
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _fraction: ProgressSample) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        samples: Mutex<Vec<f64>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, fraction: f64) {
            self.samples.lock().unwrap().push(fraction);
        }
    }

    #[test]
    fn test_tracker_never_goes_backwards() {
        let recorder = Recorder::default();
        let tracker = ProgressTracker::new(&recorder);

        tracker.report(0.4);
        tracker.report(0.2);
        tracker.report(0.7);

        assert_eq!(*recorder.samples.lock().unwrap(), vec![0.4, 0.4, 0.7]);
        assert_eq!(tracker.current(), 0.7);
    }

    #[test]
    fn test_stages_rescale_into_sub_ranges() {
        let recorder = Recorder::default();
        let tracker = ProgressTracker::new(&recorder);

        let first = tracker.stage(0.0, 0.5);
        first.on_progress(0.5);
        first.on_progress(1.0);
        let second = tracker.stage(0.5, 1.0);
        second.on_progress(0.0);
        second.on_progress(1.0);

        assert_eq!(*recorder.samples.lock().unwrap(), vec![0.25, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_stage_failure_sample_does_not_rewind() {
        let recorder = Recorder::default();
        let tracker = ProgressTracker::new(&recorder);

        let stage = tracker.stage(0.6, 0.95);
        stage.on_progress(0.5);
        stage.on_progress(0.0);
        tracker.fail();

        let samples = recorder.samples.lock().unwrap();
        assert_eq!(samples[0], samples[1]);
        assert_eq!(*samples.last().unwrap(), 0.0);
    }

    #[test]
    fn test_closure_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |f: f64| seen.lock().unwrap().push(f)
        };
        sink.on_progress(0.3);
        assert_eq!(*seen.lock().unwrap(), vec![0.3]);
    }

    #[test]
    fn test_nan_is_reported_as_current_value() {
        let recorder = Recorder::default();
        let tracker = ProgressTracker::new(&recorder);
        tracker.report(0.5);
        tracker.report(f64::NAN);
        assert_eq!(*recorder.samples.lock().unwrap(), vec![0.5, 0.5]);
    }
}
