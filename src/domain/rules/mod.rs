// Domain rules - Planning policies shared by the edit pipelines

use crate::error::{EngineError, EngineResult};

/// Lowest ratio a single audio-tempo stage accepts
pub const TEMPO_STAGE_MIN: f64 = 0.5;
/// Highest ratio a single audio-tempo stage accepts
pub const TEMPO_STAGE_MAX: f64 = 2.0;
/// Smallest multiplier that still renders as non-zero with three decimals
pub const MIN_MULTIPLIER: f64 = 0.0005;

/// Business rules for time-scale changes
pub struct TempoRules;

impl TempoRules {
    /// Reject multipliers that cannot describe a playback speed
    pub fn validate_multiplier(multiplier: f64) -> EngineResult<()> {
        if !multiplier.is_finite() || multiplier < MIN_MULTIPLIER {
            return Err(EngineError::InvalidArgument(format!(
                "speed multiplier must be a number of at least {}, got {}",
                MIN_MULTIPLIER, multiplier
            )));
        }
        Ok(())
    }

    /// Factor a tempo ratio into stages that each lie inside the per-stage window.
    ///
    /// The product of the returned stages equals `multiplier`.
    pub fn tempo_stages(multiplier: f64) -> EngineResult<Vec<f64>> {
        Self::validate_multiplier(multiplier)?;

        let mut stages = Vec::new();
        let mut remaining = multiplier;
        while remaining > TEMPO_STAGE_MAX {
            stages.push(TEMPO_STAGE_MAX);
            remaining /= TEMPO_STAGE_MAX;
        }
        while remaining < TEMPO_STAGE_MIN {
            stages.push(TEMPO_STAGE_MIN);
            remaining /= TEMPO_STAGE_MIN;
        }
        stages.push(remaining);
        Ok(stages)
    }

    /// `atempo=a,atempo=b,...` chain for the audio branch
    pub fn atempo_chain(multiplier: f64) -> EngineResult<String> {
        let chain = Self::tempo_stages(multiplier)?
            .into_iter()
            .map(|stage| format!("atempo={}", format_ratio(stage)))
            .collect::<Vec<_>>()
            .join(",");
        Ok(chain)
    }

    /// Full filter graph for a speed change with audio
    pub fn speed_filter_graph(multiplier: f64) -> EngineResult<String> {
        let chain = Self::atempo_chain(multiplier)?;
        Ok(format!(
            "[0:v]setpts=PTS/{}[v];[0:a]{}[a]",
            format_ratio(multiplier),
            chain
        ))
    }

    /// Video-only filter for a speed change that drops audio
    pub fn video_speed_filter(multiplier: f64) -> EngineResult<String> {
        Self::validate_multiplier(multiplier)?;
        Ok(format!("setpts=PTS/{}", format_ratio(multiplier)))
    }
}

/// Ratios are always written with a point decimal and three fractional digits
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.3}", ratio)
}

/// Business rules for random multi-clip remixes
pub struct RemixRules;

impl RemixRules {
    /// Validate the clip layout requested by the caller
    pub fn validate(clip_count: usize, clip_length: f64) -> EngineResult<()> {
        if clip_count == 0 {
            return Err(EngineError::InvalidArgument(
                "clip count must be at least 1".to_string(),
            ));
        }
        if !clip_length.is_finite() || clip_length <= 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "clip length must be a positive number of seconds, got {}",
                clip_length
            )));
        }
        Ok(())
    }

    /// Probed duration, or `clip_count * clip_length` when the probe had no answer
    pub fn planning_duration(probed: Option<f64>, clip_count: usize, clip_length: f64) -> f64 {
        match probed {
            Some(duration) if duration > 0.0 => duration,
            _ => clip_count as f64 * clip_length,
        }
    }

    /// Latest start that still fits a full clip; collapses to zero for short inputs
    pub fn max_start(duration: f64, clip_length: f64) -> f64 {
        (duration - clip_length).max(0.0)
    }
}

/// Business rules for the stutter preset
pub struct StutterRules;

impl StutterRules {
    /// Number of consecutive short clips to cut from the sped-up intermediate
    pub fn part_count(duration: f64, clip_length: f64, max_parts: usize) -> usize {
        if !duration.is_finite() || duration <= 0.0 || clip_length <= 0.0 {
            return 0;
        }
        let fitting = (duration / clip_length).floor() as usize;
        fitting.min(max_parts)
    }

    /// Start offset of stutter clip `index`
    pub fn clip_start(index: usize, clip_length: f64) -> f64 {
        index as f64 * clip_length
    }
}

/// Rescale a sub-step fraction into `[start, end]` of the overall signal
pub fn scale_into(fraction: f64, start: f64, end: f64) -> f64 {
    start + fraction.clamp(0.0, 1.0) * (end - start)
}
