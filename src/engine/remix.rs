//! Random multi-clip remix

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::domain::model::{ClipSpec, RunResult};
use crate::domain::rules::RemixRules;
use crate::engine::manifest::ConcatManifestBuilder;
use crate::engine::progress::{ProgressCallback, ProgressTracker};
use crate::engine::scratch::ScratchSpace;
use crate::engine::{release_scratch, VideoEditor};
use crate::error::EngineResult;
use crate::utils::path::container_extension;

/// Share of the overall progress signal spent on extraction
const EXTRACTION_SHARE: f64 = 0.9;

impl VideoEditor {
    /// Cut `clip_count` clips of `clip_length` seconds at random offsets and
    /// concatenate them in extraction order.
    ///
    /// Offsets are drawn from `rng`; a seeded generator makes the plan
    /// reproducible.
    pub fn random_remix<R: Rng + ?Sized>(
        &self,
        input: &Path,
        output: &Path,
        clip_count: usize,
        clip_length: f64,
        rng: &mut R,
        progress: &dyn ProgressCallback,
    ) -> RunResult {
        let started = Instant::now();
        info!(
            input = %input.display(),
            output = %output.display(),
            clip_count,
            clip_length,
            "Building random remix"
        );

        let tracker = ProgressTracker::new(progress);
        let result = self.random_remix_steps(input, output, clip_count, clip_length, rng, &tracker);
        self.finish("remix", &tracker, result, started)
    }

    fn random_remix_steps<R: Rng + ?Sized>(
        &self,
        input: &Path,
        output: &Path,
        clip_count: usize,
        clip_length: f64,
        rng: &mut R,
        tracker: &ProgressTracker<'_>,
    ) -> EngineResult<()> {
        RemixRules::validate(clip_count, clip_length)?;

        let duration = RemixRules::planning_duration(
            self.probe_duration(input),
            clip_count,
            clip_length,
        );
        let max_start = RemixRules::max_start(duration, clip_length);
        debug!(duration, max_start, "Planned remix window");

        let mut scratch = self.acquire_scratch("remix")?;
        let result = self.remix_in_scratch(
            &scratch,
            input,
            output,
            clip_count,
            clip_length,
            max_start,
            rng,
            tracker,
        );
        release_scratch(&mut scratch);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn remix_in_scratch<R: Rng + ?Sized>(
        &self,
        scratch: &ScratchSpace,
        input: &Path,
        output: &Path,
        clip_count: usize,
        clip_length: f64,
        max_start: f64,
        rng: &mut R,
        tracker: &ProgressTracker<'_>,
    ) -> EngineResult<()> {
        let extension = container_extension(input);
        let total = clip_count as f64;
        let mut parts: Vec<PathBuf> = Vec::with_capacity(clip_count);

        for index in 0..clip_count {
            let start = rng.gen_range(0.0..=max_start);
            let clip = ClipSpec::new(input, start, clip_length)?;
            let part = scratch.file(&format!("part{}.{}", index, extension));
            debug!(index, start = clip.start, end = clip.end(), "Extracting remix clip");

            let stage = tracker.stage(
                EXTRACTION_SHARE * index as f64 / total,
                EXTRACTION_SHARE * (index + 1) as f64 / total,
            );
            self.invoke(&self.extract_clip_spec(&clip, &part), &stage)?;
            parts.push(part);
        }

        let manifest = ConcatManifestBuilder::build(scratch, &parts)?;
        let merge = self.concat_spec(&manifest, output, total * clip_length);
        self.invoke(&merge, &tracker.stage(EXTRACTION_SHARE, 1.0))
    }
}
