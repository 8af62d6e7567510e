use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::CompetitiveWeights;

/// Settings for one pipeline. Validated once, at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Shortest accepted clip, in seconds
    pub min_duration: f64,
    /// Longest accepted clip, in seconds
    pub max_duration: f64,
    /// Minimum coherence in [0, 1]
    pub coherence_threshold: f64,
    /// Relax constraints until at least this many candidates survive
    pub target_min_candidates: usize,
    /// Keep at most this many constrained candidates
    pub target_max_candidates: usize,
    /// Top units considered per narrative role
    pub reorder_k: usize,
    /// Speaker label for segments without one
    pub default_speaker: String,
    /// Cosine similarity at or above which two candidates are duplicates
    pub similarity_threshold: f64,
    /// Final clips scoring below this are dropped
    pub competitive_threshold: f64,
    /// Competitive dimension weights, normalized before use
    pub weights: CompetitiveWeights,
    /// Number of clips returned
    pub top_n: usize,
    /// A candidate's first unit must rank in this top fraction of hook scores
    pub hook_top_fraction: f64,
    /// Minimum delivery intensity of a candidate's last unit
    pub min_ending_impact: f64,
    /// Duration bounds widen by this factor per relaxation step
    pub relax_factor: f64,
    /// Number of widening steps before the final relaxation
    pub relax_steps: usize,
    /// Final relaxation drops the upper duration bound and the hook gate
    pub drop_upper_bound: bool,
    /// With fewer than three units, emit one candidate per unit
    pub single_unit_fallback: bool,
    /// Deadline for one external scorer call
    pub scorer_timeout_ms: u64,
    /// Deadline for one embedding provider call
    pub embedding_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_duration: 15.0,
            max_duration: 60.0,
            coherence_threshold: 0.15,
            target_min_candidates: 20,
            target_max_candidates: 50,
            reorder_k: 5,
            default_speaker: "speaker_0".to_string(),
            similarity_threshold: 0.9,
            competitive_threshold: 0.0,
            weights: CompetitiveWeights::default(),
            top_n: 3,
            hook_top_fraction: 0.20,
            min_ending_impact: 0.0,
            relax_factor: 1.5,
            relax_steps: 2,
            drop_upper_bound: true,
            single_unit_fallback: false,
            scorer_timeout_ms: 60_000,
            embedding_timeout_ms: 30_000,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self =
            serde_json::from_str(&content).context("Failed to parse pipeline config JSON")?;
        Ok(config)
    }

    /// Check every setting. Out-of-range values are errors, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("min_duration", self.min_duration)?;
        finite("max_duration", self.max_duration)?;
        positive("min_duration", self.min_duration)?;
        if self.max_duration <= self.min_duration {
            return Err(ConfigError::DurationBounds {
                min: self.min_duration,
                max: self.max_duration,
            });
        }

        unit_range("coherence_threshold", self.coherence_threshold)?;
        unit_range("similarity_threshold", self.similarity_threshold)?;
        unit_range("hook_top_fraction", self.hook_top_fraction)?;

        positive("target_min_candidates", self.target_min_candidates as f64)?;
        positive("target_max_candidates", self.target_max_candidates as f64)?;
        if self.target_min_candidates > self.target_max_candidates {
            return Err(ConfigError::CandidateTargets {
                min: self.target_min_candidates,
                max: self.target_max_candidates,
            });
        }

        positive("reorder_k", self.reorder_k as f64)?;
        positive("top_n", self.top_n as f64)?;
        positive("scorer_timeout_ms", self.scorer_timeout_ms as f64)?;
        positive("embedding_timeout_ms", self.embedding_timeout_ms as f64)?;

        if self.default_speaker.trim().is_empty() {
            return Err(ConfigError::EmptySpeaker);
        }

        finite("competitive_threshold", self.competitive_threshold)?;
        finite("min_ending_impact", self.min_ending_impact)?;

        finite("relax_factor", self.relax_factor)?;
        if self.relax_factor < 1.0 {
            return Err(ConfigError::RelaxFactor(self.relax_factor));
        }

        let names = [
            "scroll_stop_probability",
            "share_trigger",
            "clarity",
            "debate_potential",
            "ending_strength",
        ];
        for (field, value) in names.into_iter().zip(self.weights.values()) {
            finite(field, value)?;
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { field, value });
            }
        }
        if self.weights.sum() <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_negative_duration() {
        let config = PipelineConfig {
            min_duration: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "min_duration", .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = PipelineConfig {
            min_duration: 30.0,
            max_duration: 30.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DurationBounds { .. })));
    }

    #[test]
    fn test_rejects_threshold_outside_unit_range() {
        let config = PipelineConfig {
            similarity_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { field: "similarity_threshold", .. })
        ));

        let config = PipelineConfig {
            coherence_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_candidate_targets() {
        let config = PipelineConfig {
            target_min_candidates: 60,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CandidateTargets { min: 60, max: 50 })
        );
    }

    #[test]
    fn test_rejects_zero_weights() {
        let config = PipelineConfig {
            weights: CompetitiveWeights {
                scroll_stop_probability: 0.0,
                share_trigger: 0.0,
                clarity: 0.0,
                debate_potential: 0.0,
                ending_strength: 0.0,
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWeights));
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let config = PipelineConfig {
            weights: CompetitiveWeights {
                scroll_stop_probability: 3.0,
                share_trigger: 2.0,
                clarity: 2.0,
                debate_potential: 1.0,
                ending_strength: 1.0,
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_embedding_timeout() {
        let config = PipelineConfig {
            embedding_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "embedding_timeout_ms", .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"top_n": 5, "weights": {"clarity": 0.5}}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.min_duration, 15.0);
        assert_eq!(config.weights.clarity, 0.5);
        assert_eq!(config.weights.share_trigger, 0.20);
    }
}
