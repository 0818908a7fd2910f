//! Stutter preset: speed up, chop into very short clips, glue back together

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::domain::model::{ClipSpec, RunResult};
use crate::domain::rules::{StutterRules, TempoRules};
use crate::engine::manifest::ConcatManifestBuilder;
use crate::engine::progress::{ProgressCallback, ProgressTracker};
use crate::engine::scratch::ScratchSpace;
use crate::engine::speed::SpeedOptions;
use crate::engine::{release_scratch, StutterConfig, VideoEditor};
use crate::error::{EngineError, EngineResult};
use crate::utils::path::container_extension;

const SPEED_STAGE_END: f64 = 0.6;
const EXTRACTION_STAGE_END: f64 = 0.95;

impl VideoEditor {
    /// Apply the stutter preset from the `[stutter]` settings
    ///
    /// The input is sped up into a scratch intermediate, which is then cut
    /// into consecutive clips of `clip_length` seconds (at most `max_parts`)
    /// and concatenated in order.
    pub fn stutter(&self, input: &Path, output: &Path, progress: &dyn ProgressCallback) -> RunResult {
        let started = Instant::now();
        let settings = self.config().stutter.clone();
        info!(
            input = %input.display(),
            output = %output.display(),
            multiplier = settings.multiplier,
            clip_length = settings.clip_length,
            max_parts = settings.max_parts,
            "Applying stutter"
        );

        let tracker = ProgressTracker::new(progress);
        let result = self.stutter_steps(input, output, &settings, &tracker);
        self.finish("stutter", &tracker, result, started)
    }

    fn stutter_steps(
        &self,
        input: &Path,
        output: &Path,
        settings: &StutterConfig,
        tracker: &ProgressTracker<'_>,
    ) -> EngineResult<()> {
        TempoRules::validate_multiplier(settings.multiplier)?;
        if !settings.clip_length.is_finite() || settings.clip_length <= 0.0 || settings.max_parts == 0 {
            return Err(EngineError::InvalidArgument(format!(
                "stutter needs a positive clip length and at least one part, got {}s x {}",
                settings.clip_length, settings.max_parts
            )));
        }

        let mut scratch = self.acquire_scratch("stutter")?;
        let result = self.stutter_in_scratch(&scratch, input, output, settings, tracker);
        release_scratch(&mut scratch);
        result
    }

    fn stutter_in_scratch(
        &self,
        scratch: &ScratchSpace,
        input: &Path,
        output: &Path,
        settings: &StutterConfig,
        tracker: &ProgressTracker<'_>,
    ) -> EngineResult<()> {
        let extension = container_extension(input);
        let intermediate = scratch.file(&format!("speed.{}", extension));

        let speed = self.speed_change_spec(
            input,
            &intermediate,
            SpeedOptions::new(settings.multiplier),
        )?;
        self.invoke(&speed, &tracker.stage(0.0, SPEED_STAGE_END))?;

        let part_count = match self.probe_duration(&intermediate) {
            Some(duration) => {
                let count =
                    StutterRules::part_count(duration, settings.clip_length, settings.max_parts);
                if count == 0 {
                    return Err(EngineError::InvalidArgument(format!(
                        "sped-up input ({:.3}s) is shorter than one {:.3}s stutter clip",
                        duration, settings.clip_length
                    )));
                }
                count
            }
            None => {
                warn!(
                    parts = settings.max_parts,
                    "Assuming intermediate is long enough for every stutter clip"
                );
                settings.max_parts
            }
        };
        debug!(part_count, "Planned stutter clips");

        let clips_dir = scratch.subdir("clips")?;
        let total = part_count as f64;
        let span = EXTRACTION_STAGE_END - SPEED_STAGE_END;
        let mut parts: Vec<PathBuf> = Vec::with_capacity(part_count);

        for index in 0..part_count {
            let start = StutterRules::clip_start(index, settings.clip_length);
            let clip = ClipSpec::new(&intermediate, start, settings.clip_length)?;
            let part = clips_dir.join(format!("p{}.{}", index, extension));

            let stage = tracker.stage(
                SPEED_STAGE_END + span * index as f64 / total,
                SPEED_STAGE_END + span * (index + 1) as f64 / total,
            );
            self.invoke(&self.extract_clip_spec(&clip, &part), &stage)?;
            parts.push(part);
        }

        let manifest = ConcatManifestBuilder::build(scratch, &parts)?;
        let merge = self.concat_spec(&manifest, output, total * settings.clip_length);
        self.invoke(&merge, &tracker.stage(EXTRACTION_STAGE_END, 1.0))
    }
}
