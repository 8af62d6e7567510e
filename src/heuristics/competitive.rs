use anyhow::Result;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::heuristics::text::{round_to, split_sentences};
use crate::models::{CompetitiveScores, ConstrainedCandidate, MAX_DIMENSION_SCORE};
use crate::traits::CompetitiveScorer;

const SCROLL_STOP_PATTERNS: &[&str] = &[
    r"\b(?:nobody|never|always|shocking|secret|truth|exposed)\b",
    r"\b(?:you won'?t believe|can'?t believe|incredible)\b",
    r"\?\s*$",
    r"!",
];

const SHARE_PATTERNS: &[&str] = &[
    r"\b(?:share|tell|show|pass|forward|repost)\b",
    r"\b(?:everyone needs to|you need to know|important)\b",
    r"\b(?:save this|bookmark|screenshot)\b",
];

const DEBATE_PATTERNS: &[&str] = &[
    r"\b(?:wrong|disagree|controversial|unpopular opinion|fight me)\b",
    r"\b(?:actually|in fact|contrary|opposite|myth|lie)\b",
    r"\b(?:change my mind|prove me wrong|hot take)\b",
];

const ENDING_PATTERNS: &[&str] = &[
    r"!+\s*$",
    r"\?\s*$",
    r"\b(?:remember|think about|that'?s the truth|that'?s it)\b",
    r"\b(?:and that'?s why|this is what|bottom line|the point is)\b",
];

fn compile(sources: &[&str]) -> Result<Vec<Regex>, ConfigError> {
    sources
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::Lexicon {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
        })
        .collect()
}

/// Fraction of patterns matching, scaled to [0, 10]
fn hit_ratio(patterns: &[Regex], text: &str) -> f64 {
    if patterns.is_empty() {
        return 0.0;
    }
    let hits = patterns.iter().filter(|p| p.is_match(text)).count();
    (hits as f64 / patterns.len() as f64 * MAX_DIMENSION_SCORE).min(MAX_DIMENSION_SCORE)
}

/// Built-in offline competitive scorer, also the fallback for a failing
/// external scorer.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    scroll_stop: Vec<Regex>,
    share: Vec<Regex>,
    debate: Vec<Regex>,
    ending: Vec<Regex>,
}

impl HeuristicScorer {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            scroll_stop: compile(SCROLL_STOP_PATTERNS)?,
            share: compile(SHARE_PATTERNS)?,
            debate: compile(DEBATE_PATTERNS)?,
            ending: compile(ENDING_PATTERNS)?,
        })
    }

    /// Score a clip's text on the five competitive dimensions
    pub fn score_text(&self, text: &str) -> CompetitiveScores {
        let text = text.trim();
        let last_sentence = split_sentences(text).pop().unwrap_or_else(|| text.to_string());

        CompetitiveScores {
            scroll_stop_probability: round_to(hit_ratio(&self.scroll_stop, text), 3),
            share_trigger: round_to(hit_ratio(&self.share, text), 3),
            clarity: round_to(clarity(text), 3),
            debate_potential: round_to(hit_ratio(&self.debate, text), 3),
            ending_strength: round_to(hit_ratio(&self.ending, &last_sentence), 3),
        }
    }

    pub fn score_candidate(&self, candidate: &ConstrainedCandidate) -> CompetitiveScores {
        self.score_text(&candidate.candidate.text)
    }
}

/// Word-count proxy: very short clips are unclear, and so are rambling ones
fn clarity(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    if words < 10 {
        2.0
    } else if words > 200 {
        5.0
    } else {
        (words as f64 / 100.0 * MAX_DIMENSION_SCORE).min(MAX_DIMENSION_SCORE)
    }
}

#[async_trait]
impl CompetitiveScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score_batch(&self, candidates: &[ConstrainedCandidate]) -> Result<Vec<CompetitiveScores>> {
        Ok(candidates.iter().map(|c| self.score_candidate(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarity_bands() {
        assert_eq!(clarity("too short"), 2.0);
        assert_eq!(clarity(&"word ".repeat(50)), 5.0);
        assert_eq!(clarity(&"word ".repeat(150)), 10.0);
        assert_eq!(clarity(&"word ".repeat(250)), 5.0);
    }

    #[test]
    fn test_ending_uses_last_sentence() {
        let scorer = HeuristicScorer::new().unwrap();
        let strong = scorer.score_text("Some setup here. And that's why you remember it!");
        let weak = scorer.score_text("And that's why you remember it! Some setup here.");

        assert!(strong.ending_strength > weak.ending_strength);
        assert_eq!(weak.ending_strength, 0.0);
    }

    #[test]
    fn test_debate_and_share() {
        let scorer = HeuristicScorer::new().unwrap();
        let scores = scorer.score_text("Unpopular opinion: that's actually a myth. Share this.");

        assert!(scores.debate_potential > 6.0);
        assert!(scores.share_trigger > 3.0);
        assert!(scores.is_well_formed());
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        use crate::models::{Candidate, Pattern};

        let scorer = HeuristicScorer::new().unwrap();
        let make = |text: &str| ConstrainedCandidate {
            candidate: Candidate {
                unit_indices: vec![0],
                pattern: Pattern::SingleUnit,
                pattern_score: 0.0,
                is_contiguous: true,
                start: 0.0,
                end: 1.0,
                duration: 1.0,
                playback_duration: 1.0,
                text: text.to_string(),
            },
            hook_score_first: 0.0,
            impact_score_last: 0.0,
            coherence: 1.0,
            constraint_score: 0.0,
        };

        let batch = vec![make("Nothing much."), make("You won't believe the secret!")];
        let scores = scorer.score_batch(&batch).await.unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].scroll_stop_probability, 0.0);
        assert!(scores[1].scroll_stop_probability > 0.0);
    }
}
