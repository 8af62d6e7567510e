use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AppliedBounds, DedupStatus, FinalClip, PipelineReport, ScorerMode};

/// Machine-readable output for downstream clippers and metadata generators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipReport {
    /// Ranked clips, best first
    pub clips: Vec<FinalClip>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub unit_count: usize,
    pub raw_candidate_count: usize,
    pub constrained_count: usize,
    pub deduplicated_count: usize,
    pub relaxation_applied: bool,
    pub bounds: AppliedBounds,
    pub dedup: DedupStatus,
    pub scorer: ScorerMode,
    pub degraded: bool,
}

impl ClipReport {
    pub fn from_report(report: PipelineReport) -> Self {
        let metadata = ReportMetadata {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            unit_count: report.unit_count,
            raw_candidate_count: report.raw_candidate_count,
            constrained_count: report.constrained_count,
            deduplicated_count: report.deduplicated_count,
            relaxation_applied: report.relaxation_applied(),
            bounds: report.bounds,
            degraded: report.is_degraded(),
            dedup: report.dedup,
            scorer: report.scorer,
        };

        Self {
            clips: report.clips,
            metadata,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable clip summary
pub struct ClipSummary<'a> {
    report: &'a ClipReport,
}

impl<'a> ClipSummary<'a> {
    pub fn new(report: &'a ClipReport) -> Self {
        Self { report }
    }

    /// Format the ranked clips as human-readable text
    pub fn format(&self) -> String {
        let mut output = String::new();
        let meta = &self.report.metadata;

        output.push_str(&format!(
            "Run {} ({} units, {} candidates, {} clips)\n",
            meta.run_id,
            meta.unit_count,
            meta.raw_candidate_count,
            self.report.clips.len()
        ));
        if meta.relaxation_applied {
            output.push_str(&format!(
                "Duration bounds relaxed to level {}\n",
                meta.bounds.level
            ));
        }
        if let DedupStatus::Disabled { reason } = &meta.dedup {
            output.push_str(&format!("Dedup disabled: {}\n", reason));
        }
        if let ScorerMode::Fallback { name, reason } = &meta.scorer {
            output.push_str(&format!("Scorer {} failed, heuristic used: {}\n", name, reason));
        }
        output.push('\n');

        for (rank, clip) in self.report.clips.iter().enumerate() {
            output.push_str(&format!(
                "#{} [{} - {}] {:.1}s {} score {:.3}\n",
                rank + 1,
                format_timestamp(clip.start),
                format_timestamp(clip.end),
                clip.duration,
                clip.pattern,
                clip.competitive_score
            ));
            output.push_str(&format!(
                "   scroll {:.1} | share {:.1} | clarity {:.1} | debate {:.1} | ending {:.1}\n",
                clip.scroll_stop_probability,
                clip.share_trigger,
                clip.clarity,
                clip.debate_potential,
                clip.ending_strength
            ));
            output.push_str(&wrap_text(&clip.text, 80));
            output.push_str("\n\n");
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Format seconds as MM:SS.mmm
fn format_timestamp(seconds: f64) -> String {
    let ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let secs = ms / 1000;
    format!("{:02}:{:02}.{:03}", secs / 60, secs % 60, ms % 1000)
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompetitiveScores, Pattern};

    fn report() -> PipelineReport {
        let clip = FinalClip {
            start: 61.5,
            end: 90.0,
            duration: 28.5,
            playback_duration: 20.0,
            text: "Nobody tells you this. The data is clear. Remember it!".to_string(),
            pattern: Pattern::HookContextPunchline,
            pattern_score: 6.1,
            unit_indices: vec![3, 5, 9],
            is_contiguous: false,
            competitive_score: 5.25,
            scroll_stop_probability: 7.5,
            share_trigger: 3.0,
            debate_potential: 0.0,
            clarity: 5.0,
            ending_strength: 7.5,
            constraint_score: 6.9,
            hook_score_first: 8.0,
            impact_score_last: 6.0,
            coherence: 0.71,
        };
        PipelineReport {
            clips: vec![clip],
            unit_count: 12,
            raw_candidate_count: 40,
            constrained_count: 22,
            deduplicated_count: 18,
            bounds: AppliedBounds {
                level: 1,
                min_duration: 10.0,
                max_duration: Some(90.0),
                hook_gate: true,
            },
            dedup: DedupStatus::Enabled { removed: 4 },
            scorer: ScorerMode::Fallback {
                name: "claude".to_string(),
                reason: "timed out after 60000ms".to_string(),
            },
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00.000");
        assert_eq!(format_timestamp(1.5), "00:01.500");
        assert_eq!(format_timestamp(65.0), "01:05.000");
        assert_eq!(format_timestamp(3661.5), "61:01.500");
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a test of the text wrapping function that should wrap at 20 chars";
        let wrapped = wrap_text(text, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 25);
        }
    }

    #[test]
    fn test_metadata_carries_flags() {
        let report = ClipReport::from_report(report());

        assert!(report.metadata.relaxation_applied);
        assert!(report.metadata.degraded);
        assert_eq!(report.metadata.run_id.get_version_num(), 4);
        assert_eq!(report.clips[0].competitive_scores(), CompetitiveScores {
            scroll_stop_probability: 7.5,
            share_trigger: 3.0,
            clarity: 5.0,
            debate_potential: 0.0,
            ending_strength: 7.5,
        });
    }

    #[test]
    fn test_json_exposes_clip_fields() {
        let report = ClipReport::from_report(report());
        let json = serde_json::to_value(&report).unwrap();

        let clip = &json["clips"][0];
        for field in [
            "start",
            "end",
            "duration",
            "text",
            "pattern",
            "pattern_score",
            "unit_indices",
            "is_contiguous",
            "competitive_score",
            "scroll_stop_probability",
            "share_trigger",
            "debate_potential",
            "clarity",
            "ending_strength",
            "constraint_score",
            "hook_score_first",
            "impact_score_last",
            "coherence",
        ] {
            assert!(clip.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(clip["pattern"], "hook_context_punchline");
        assert_eq!(json["metadata"]["scorer"]["mode"], "fallback");
        assert_eq!(json["metadata"]["dedup"]["removed"], 4);
    }

    #[test]
    fn test_summary_and_file_output() {
        let report = ClipReport::from_report(report());
        let text = ClipSummary::new(&report).format();

        assert!(text.contains("#1 [01:01.500 - 01:30.000] 28.5s hook_context_punchline"));
        assert!(text.contains("Duration bounds relaxed to level 1"));
        assert!(text.contains("Scorer claude failed"));

        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("clips.json");
        report.write_json(&json_path).unwrap();
        let parsed: ClipReport =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.clips, report.clips);

        let text_path = dir.path().join("clips.txt");
        ClipSummary::new(&report).write_file(&text_path).unwrap();
        assert!(std::fs::read_to_string(&text_path).unwrap().starts_with("Run "));
    }
}
