//! Circular crop with transparent corners

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::domain::model::{CommandSpec, RunResult};
use crate::engine::progress::{ProgressCallback, ProgressTracker};
use crate::engine::VideoEditor;

impl VideoEditor {
    /// Crop the input to a centered circle in a single engine invocation
    ///
    /// The output must use a container and codec that carry alpha; the
    /// defaults (`webm`, VP9, `yuva420p`) do.
    pub fn round_mask(&self, input: &Path, output: &Path, progress: &dyn ProgressCallback) -> RunResult {
        let started = Instant::now();
        info!(
            input = %input.display(),
            output = %output.display(),
            size = self.config().round_mask.size,
            "Applying round mask"
        );

        let tracker = ProgressTracker::new(progress);
        let spec = self.round_mask_spec(input, output);
        let result = self.invoke(&spec, &tracker.stage(0.0, 1.0));
        self.finish("round", &tracker, result, started)
    }

    fn round_mask_spec(&self, input: &Path, output: &Path) -> CommandSpec {
        let settings = &self.config().round_mask;
        let filter = settings.filter.replace("{size}", &settings.size.to_string());

        self.engine_command()
            .arg("-i")
            .path_arg(input)
            .arg("-vf")
            .arg(filter)
            .arg("-c:v")
            .arg(settings.video_codec.clone())
            .arg("-pix_fmt")
            .arg(settings.pixel_format.clone())
            .arg("-c:a")
            .arg(settings.audio_codec.clone())
            .path_arg(output)
            .expect_duration(self.probe_duration(input))
    }
}
