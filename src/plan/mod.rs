//! Plan text generator
//!
//! Produces human-readable editing suggestions for nostalgia-style remix
//! videos. It does not touch media files and the edit engine never calls it.

use std::fmt::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const BASE_SOURCES: [&str; 10] = [
    "90s Cartoon Theme (chorus snippet)",
    "Educational TV Clip (announcer voice)",
    "Retro Game Soundtrack loop",
    "Old Commercial Jingle (toy)",
    "VHS sitcom laugh track",
    "Public domain movie line (dramatic)",
    "80s Pop chorus (sampled short)",
    "Late-night host clip (yelled line)",
    "Arcade cabinet sound effects",
    "Kids show theme (naive melody)",
];

const TRANSITIONS: [&str; 5] = [
    "hard cut",
    "white flash + reverse blur",
    "stutter cut (3x)",
    "beat-synced slice",
    "spin/glitch wipe",
];

const EFFECTS: [&str; 5] = ["bitcrush", "tremolo", "filter sweep", "phaser", "vocal chop"];

const TITLE_HEADS: [&str; 10] = [
    "Nostalgia", "Mody", "Remix", "YTP", "Glitch", "Retro", "Annoying", "Loop", "Mega", "Odd",
];

const TITLE_TAILS: [&str; 8] = [
    "Mashup",
    "Compilation",
    "Hits",
    "Edit",
    "Remix",
    "Rewind",
    "Jank",
    "Sampler",
];

const NOTES: [&str; 4] = [
    "Automate quick tempo changes between segments.",
    "Use key-aware pitch shifts for YTPMV sections.",
    "Add sudden cuts and a tiny 1-frame stutter to create classic YTP comedic timing.",
    "Consider an 'annoying' master limiter on short sections, but avoid permanent damage to listener comfort.",
];

/// Knobs for a generated plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    pub include_ytp: bool,
    pub include_ytpmv: bool,
    pub include_remix: bool,
    pub add_round_loop: bool,
    /// Tempo suggestion in percent, 50..=200
    pub speed_percent: u32,
    pub annoying: bool,
    pub add_commercial: bool,
    pub segment_count: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            include_ytp: true,
            include_ytpmv: true,
            include_remix: true,
            add_round_loop: false,
            speed_percent: 100,
            annoying: false,
            add_commercial: false,
            segment_count: 6,
        }
    }
}

/// Seeded plan generator; equal seeds and options give equal text
pub struct PlanGenerator {
    rng: StdRng,
}

impl PlanGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Render a full plan
    pub fn generate(&mut self, options: &PlanOptions) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.render(options, &mut out);
        out
    }

    fn render(&mut self, options: &PlanOptions, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Nostalgia Mody Video Plan")?;
        writeln!(out, "=========================")?;
        writeln!(out)?;

        writeln!(out, "Options:")?;
        writeln!(
            out,
            "  YTP: {}, YTPMV: {}, Remix: {}",
            options.include_ytp, options.include_ytpmv, options.include_remix
        )?;
        writeln!(
            out,
            "  Round/Loop: {}, Speed: {}%, Annoying effects: {}, Commercials: {}",
            options.add_round_loop, options.speed_percent, options.annoying, options.add_commercial
        )?;
        writeln!(out, "  Segments: {}", options.segment_count)?;
        writeln!(out)?;

        let sources = source_pool(options);
        writeln!(out, "Core sources (pool):")?;
        for source in &sources {
            writeln!(out, " - {}", source)?;
        }
        writeln!(out)?;

        writeln!(out, "Plan (segment-by-segment):")?;
        for segment in 1..=options.segment_count {
            writeln!(out, "Segment {}:", segment)?;
            writeln!(out, "  Source: {}", self.pick(&sources))?;
            if segment > 1 {
                writeln!(out, "  Transition from previous: {}", self.pick(&TRANSITIONS))?;
            }
            for effect in self.effect_stack(options) {
                writeln!(out, "  Effect: {}", effect)?;
            }

            let mut seconds: u32 = self.rng.gen_range(3..=10);
            if options.annoying {
                seconds = (seconds / 2).max(1);
            }
            writeln!(out, "  Duration (approx): {}s", seconds)?;
            writeln!(out)?;
        }

        if options.add_commercial && self.rng.gen_bool(0.9) {
            writeln!(out, "--- Inserted Nostalgia Commercial / Jingle ---")?;
            writeln!(
                out,
                "  Idea: quick 6s fake commercial for retro cereal (or toy), saturated colors, cheesy voice sample."
            )?;
            writeln!(out)?;
        }

        writeln!(out, "Notes & polish suggestions:")?;
        for note in NOTES {
            writeln!(out, " - {}", note)?;
        }

        writeln!(out)?;
        writeln!(out, "Generated Title Suggestions:")?;
        for _ in 0..5 {
            let title = self.title();
            writeln!(out, " - {}", title)?;
        }
        Ok(())
    }

    fn effect_stack(&mut self, options: &PlanOptions) -> Vec<String> {
        let mut effects = Vec::new();
        if options.speed_percent != 100 {
            effects.push(format!("tempo x{}%", options.speed_percent));
        }
        if options.add_round_loop && self.rng.gen_bool(0.6) {
            effects.push("loop (round) two-beat repeat".to_string());
        }
        if options.include_ytp && self.rng.gen_bool(0.5) {
            effects.push("glitch cut / stutter (YTP style)".to_string());
        }
        if options.include_ytpmv && self.rng.gen_bool(0.45) {
            effects.push("sample pitch-shift / chop to melody (YTPMV style)".to_string());
        }
        if options.include_remix && self.rng.gen_bool(0.6) {
            effects.push("beat align & rhythm edit (remix)".to_string());
        }

        if options.annoying {
            if self.rng.gen_bool(0.8) {
                effects.push("harsh clipping / heavy distortion".to_string());
            }
            if self.rng.gen_bool(0.5) {
                effects.push("random reverse snippets".to_string());
            }
            if self.rng.gen_bool(0.5) {
                effects.push("ear-piercing high freq sweep (short)".to_string());
            }
        } else if self.rng.gen_bool(0.25) {
            effects.push("mild tape warble / wow & flutter".to_string());
        }

        effects.push(self.pick(&EFFECTS).to_string());
        effects
    }

    fn title(&mut self) -> String {
        let head = self.pick(&TITLE_HEADS);
        let tail = self.pick(&TITLE_TAILS);
        let number: u32 = self.rng.gen_range(100..1000);
        format!("{} {} {}", head, tail, number)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.rng.gen_range(0..items.len())]
    }
}

fn source_pool(options: &PlanOptions) -> Vec<&'static str> {
    let mut pool = BASE_SOURCES.to_vec();
    if options.include_ytp {
        pool.extend(["Cartoon character scream - chopped", "Weird off-tune singing - cut"]);
    }
    if options.include_ytpmv {
        pool.extend(["Short melodic vocal sample to map", "Drum hit to be time-stretched"]);
    }
    if options.include_remix {
        pool.extend(["Acapella phrase for chops", "Synth stab for drop"]);
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_plan() {
        let options = PlanOptions::default();
        let first = PlanGenerator::new(42).generate(&options);
        let second = PlanGenerator::new(42).generate(&options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_layout() {
        let options = PlanOptions {
            segment_count: 4,
            speed_percent: 150,
            ..PlanOptions::default()
        };
        let plan = PlanGenerator::new(7).generate(&options);

        assert!(plan.starts_with("Nostalgia Mody Video Plan\n"));
        assert_eq!(plan.matches("\nSegment ").count(), 4);
        assert_eq!(plan.matches("Transition from previous:").count(), 3);
        assert_eq!(plan.matches("tempo x150%").count(), 4);
        assert!(plan.contains("Speed: 150%"));

        let titles: Vec<&str> = plan
            .split("Generated Title Suggestions:\n")
            .nth(1)
            .unwrap()
            .lines()
            .collect();
        assert_eq!(titles.len(), 5);
    }

    #[test]
    fn test_annoying_durations_are_halved() {
        let options = PlanOptions {
            annoying: true,
            segment_count: 20,
            ..PlanOptions::default()
        };
        let plan = PlanGenerator::new(3).generate(&options);

        for line in plan.lines().filter(|l| l.contains("Duration (approx):")) {
            let seconds: u32 = line
                .trim()
                .trim_start_matches("Duration (approx): ")
                .trim_end_matches('s')
                .parse()
                .unwrap();
            assert!((1..=5).contains(&seconds), "{}", line);
        }
    }

    #[test]
    fn test_source_pool_follows_options() {
        let options = PlanOptions {
            include_ytp: false,
            include_ytpmv: false,
            include_remix: false,
            ..PlanOptions::default()
        };
        assert_eq!(source_pool(&options).len(), 10);
        assert_eq!(source_pool(&PlanOptions::default()).len(), 16);
    }

    #[test]
    fn test_zero_segments() {
        let options = PlanOptions {
            segment_count: 0,
            ..PlanOptions::default()
        };
        let plan = PlanGenerator::new(1).generate(&options);
        assert!(!plan.contains("Segment 1:"));
        assert!(plan.contains("Notes & polish suggestions:"));
    }
}
