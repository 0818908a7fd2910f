//! Playback speed change

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::domain::model::{CommandSpec, RunResult};
use crate::domain::rules::TempoRules;
use crate::engine::progress::{ProgressCallback, ProgressTracker};
use crate::engine::VideoEditor;
use crate::error::EngineResult;

/// Options for a speed change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedOptions {
    /// Playback rate; `2.0` halves the duration
    pub multiplier: f64,
    /// Re-time the audio track instead of dropping it
    pub keep_audio: bool,
}

impl SpeedOptions {
    pub fn new(multiplier: f64) -> Self {
        Self {
            multiplier,
            keep_audio: true,
        }
    }
}

impl VideoEditor {
    /// Re-time video and audio by `multiplier` in a single engine invocation
    pub fn speed_change(
        &self,
        input: &Path,
        output: &Path,
        multiplier: f64,
        progress: &dyn ProgressCallback,
    ) -> RunResult {
        self.speed_change_with(input, output, SpeedOptions::new(multiplier), progress)
    }

    /// Speed change with explicit options
    pub fn speed_change_with(
        &self,
        input: &Path,
        output: &Path,
        options: SpeedOptions,
        progress: &dyn ProgressCallback,
    ) -> RunResult {
        let started = Instant::now();
        info!(
            input = %input.display(),
            output = %output.display(),
            multiplier = options.multiplier,
            keep_audio = options.keep_audio,
            "Changing playback speed"
        );

        let tracker = ProgressTracker::new(progress);
        let result = self
            .speed_change_spec(input, output, options)
            .and_then(|spec| self.invoke(&spec, &tracker.stage(0.0, 1.0)));
        self.finish("speed", &tracker, result, started)
    }

    /// Engine command for a speed change; validates before probing the input
    pub(crate) fn speed_change_spec(
        &self,
        input: &Path,
        output: &Path,
        options: SpeedOptions,
    ) -> EngineResult<CommandSpec> {
        TempoRules::validate_multiplier(options.multiplier)?;

        let spec = self.engine_command().arg("-i").path_arg(input);
        let spec = if options.keep_audio {
            let graph = TempoRules::speed_filter_graph(options.multiplier)?;
            spec.arg("-filter_complex")
                .arg(graph)
                .args(["-map", "[v]", "-map", "[a]"])
        } else {
            let filter = TempoRules::video_speed_filter(options.multiplier)?;
            spec.arg("-filter:v").arg(filter).arg("-an")
        };

        let expected = self
            .probe_duration(input)
            .map(|duration| duration / options.multiplier);
        Ok(spec.path_arg(output).expect_duration(expected))
    }
}
