use serde::{Deserialize, Serialize};

use super::{ConstrainedCandidate, Pattern};

/// The five engagement dimensions, each in [0, 10]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveScores {
    pub scroll_stop_probability: f64,
    pub share_trigger: f64,
    pub clarity: f64,
    pub debate_potential: f64,
    pub ending_strength: f64,
}

impl CompetitiveScores {
    /// All five dimensions, in weight order
    pub fn values(&self) -> [f64; 5] {
        [
            self.scroll_stop_probability,
            self.share_trigger,
            self.clarity,
            self.debate_potential,
            self.ending_strength,
        ]
    }

    /// True when every dimension is finite and inside [0, 10]
    pub fn is_well_formed(&self) -> bool {
        self.values()
            .iter()
            .all(|v| v.is_finite() && (0.0..=10.0).contains(v))
    }
}

/// Relative weight of each competitive dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitiveWeights {
    pub scroll_stop_probability: f64,
    pub share_trigger: f64,
    pub clarity: f64,
    pub debate_potential: f64,
    pub ending_strength: f64,
}

impl Default for CompetitiveWeights {
    fn default() -> Self {
        Self {
            scroll_stop_probability: 0.30,
            share_trigger: 0.20,
            clarity: 0.20,
            debate_potential: 0.15,
            ending_strength: 0.15,
        }
    }
}

impl CompetitiveWeights {
    pub fn values(&self) -> [f64; 5] {
        [
            self.scroll_stop_probability,
            self.share_trigger,
            self.clarity,
            self.debate_potential,
            self.ending_strength,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    /// Weights scaled to sum to 1. Caller guarantees a positive sum.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            scroll_stop_probability: self.scroll_stop_probability / total,
            share_trigger: self.share_trigger / total,
            clarity: self.clarity / total,
            debate_potential: self.debate_potential / total,
            ending_strength: self.ending_strength / total,
        }
    }

    /// Weighted composite of the given scores
    pub fn composite(&self, scores: &CompetitiveScores) -> f64 {
        self.values()
            .iter()
            .zip(scores.values().iter())
            .map(|(w, s)| w * s)
            .sum()
    }
}

/// A ranked highlight clip, the only entity returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalClip {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub playback_duration: f64,
    pub text: String,
    pub pattern: Pattern,
    pub pattern_score: f64,
    pub unit_indices: Vec<usize>,
    pub is_contiguous: bool,
    pub competitive_score: f64,
    pub scroll_stop_probability: f64,
    pub share_trigger: f64,
    pub debate_potential: f64,
    pub clarity: f64,
    pub ending_strength: f64,
    pub constraint_score: f64,
    pub hook_score_first: f64,
    pub impact_score_last: f64,
    pub coherence: f64,
}

impl FinalClip {
    pub fn new(
        constrained: ConstrainedCandidate,
        scores: CompetitiveScores,
        competitive_score: f64,
    ) -> Self {
        let ConstrainedCandidate {
            candidate,
            hook_score_first,
            impact_score_last,
            coherence,
            constraint_score,
        } = constrained;

        Self {
            start: candidate.start,
            end: candidate.end,
            duration: candidate.duration,
            playback_duration: candidate.playback_duration,
            text: candidate.text,
            pattern: candidate.pattern,
            pattern_score: candidate.pattern_score,
            unit_indices: candidate.unit_indices,
            is_contiguous: candidate.is_contiguous,
            competitive_score,
            scroll_stop_probability: scores.scroll_stop_probability,
            share_trigger: scores.share_trigger,
            debate_potential: scores.debate_potential,
            clarity: scores.clarity,
            ending_strength: scores.ending_strength,
            constraint_score,
            hook_score_first,
            impact_score_last,
            coherence,
        }
    }

    pub fn competitive_scores(&self) -> CompetitiveScores {
        CompetitiveScores {
            scroll_stop_probability: self.scroll_stop_probability,
            share_trigger: self.share_trigger,
            clarity: self.clarity,
            debate_potential: self.debate_potential,
            ending_strength: self.ending_strength,
        }
    }
}

/// Duration bounds (and hook gate) a constraint pass was run with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedBounds {
    /// 0 for the strict pass, higher for each relaxation step
    pub level: usize,
    pub min_duration: f64,
    /// `None` once the upper bound has been dropped
    pub max_duration: Option<f64>,
    pub hook_gate: bool,
}

impl AppliedBounds {
    pub fn is_relaxed(&self) -> bool {
        self.level > 0
    }

    pub fn admits(&self, duration: f64) -> bool {
        duration >= self.min_duration && self.max_duration.is_none_or(|max| duration <= max)
    }
}

/// Whether semantic dedup ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DedupStatus {
    Enabled { removed: usize },
    Disabled { reason: String },
}

impl DedupStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, DedupStatus::Enabled { .. })
    }
}

/// Which scorer produced the competitive scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScorerMode {
    /// The injected external scorer succeeded
    External { name: String },
    /// No external scorer was configured
    Heuristic,
    /// The external scorer failed and the heuristic scored the whole batch
    Fallback { name: String, reason: String },
}

impl ScorerMode {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScorerMode::Fallback { .. })
    }
}

/// Everything a pipeline run returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Ranked clips, non-increasing in `competitive_score`
    pub clips: Vec<FinalClip>,
    pub unit_count: usize,
    pub raw_candidate_count: usize,
    pub constrained_count: usize,
    pub deduplicated_count: usize,
    /// Bounds the surviving candidates satisfy
    pub bounds: AppliedBounds,
    pub dedup: DedupStatus,
    pub scorer: ScorerMode,
}

impl PipelineReport {
    pub fn relaxation_applied(&self) -> bool {
        self.bounds.is_relaxed()
    }

    /// True if any stage fell back to a local alternative
    pub fn is_degraded(&self) -> bool {
        self.scorer.is_degraded()
            || matches!(&self.dedup, DedupStatus::Disabled { reason } if reason != DEDUP_NOT_CONFIGURED)
    }
}

/// Dedup reason recorded when no embedding provider was injected
pub const DEDUP_NOT_CONFIGURED: &str = "no embedding provider configured";
