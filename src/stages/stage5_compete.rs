use std::cmp::Ordering;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::cancel::{CancellationToken, bounded};
use crate::config::PipelineConfig;
use crate::heuristics::HeuristicScorer;
use crate::heuristics::text::round_to;
use crate::models::{CompetitiveScores, CompetitiveWeights, ConstrainedCandidate, FinalClip, ScorerMode};
use crate::traits::CompetitiveScorer;

/// Configuration for Stage 5
#[derive(Debug, Clone)]
pub struct CompeteConfig {
    /// Dimension weights, normalized to sum to 1
    pub weights: CompetitiveWeights,
    /// Clips scoring below this are dropped
    pub competitive_threshold: f64,
    pub top_n: usize,
    /// Upper bound on the external scorer call
    pub timeout: Duration,
}

impl Default for CompeteConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for CompeteConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            weights: config.weights.normalized(),
            competitive_threshold: config.competitive_threshold,
            top_n: config.top_n,
            timeout: Duration::from_millis(config.scorer_timeout_ms),
        }
    }
}

/// Result of Stage 5
#[derive(Debug)]
pub struct CompeteResult {
    /// Best `competitive_score` first, at most `top_n`
    pub clips: Vec<FinalClip>,
    pub scorer: ScorerMode,
}

/// Execute Stage 5: score every candidate and keep the best `top_n`.
///
/// The external scorer, when given, scores the whole batch in one call.
/// If it errors, times out, is cancelled or returns malformed scores, the
/// failure is logged once and the heuristic scores the entire batch, so a
/// run never mixes scorers.
pub async fn evaluate(
    candidates: Vec<ConstrainedCandidate>,
    external: Option<&dyn CompetitiveScorer>,
    heuristic: &HeuristicScorer,
    config: &CompeteConfig,
    cancel: &CancellationToken,
) -> CompeteResult {
    let (scores, scorer) = score_batch(&candidates, external, heuristic, config, cancel).await;

    let total = candidates.len();
    let mut clips: Vec<FinalClip> = candidates
        .into_iter()
        .zip(scores)
        .map(|(candidate, scores)| {
            let competitive_score = round_to(config.weights.composite(&scores), 3);
            FinalClip::new(candidate, scores, competitive_score)
        })
        .filter(|clip| clip.competitive_score >= config.competitive_threshold)
        .collect();
    let above_threshold = clips.len();

    clips.sort_by(|a, b| {
        b.competitive_score
            .partial_cmp(&a.competitive_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.constraint_score
                    .partial_cmp(&a.constraint_score)
                    .unwrap_or(Ordering::Equal)
            })
    });
    clips.truncate(config.top_n);

    info!(
        "Stage 5: {} clips selected ({} scored, {} above threshold {}, scorer {})",
        clips.len(),
        total,
        above_threshold,
        config.competitive_threshold,
        scorer_label(&scorer)
    );

    CompeteResult { clips, scorer }
}

async fn score_batch(
    candidates: &[ConstrainedCandidate],
    external: Option<&dyn CompetitiveScorer>,
    heuristic: &HeuristicScorer,
    config: &CompeteConfig,
    cancel: &CancellationToken,
) -> (Vec<CompetitiveScores>, ScorerMode) {
    let heuristic_scores =
        || -> Vec<CompetitiveScores> { candidates.iter().map(|c| heuristic.score_candidate(c)).collect() };

    let Some(external) = external else {
        return (heuristic_scores(), ScorerMode::Heuristic);
    };
    let name = external.name().to_string();
    if candidates.is_empty() {
        return (Vec::new(), ScorerMode::External { name });
    }

    let outcome = bounded(external.score_batch(candidates), config.timeout, cancel)
        .await
        .and_then(|scores| check_scores(scores, candidates.len()));

    match outcome {
        Ok(scores) => (scores, ScorerMode::External { name }),
        Err(e) => {
            let reason = format!("{:#}", e);
            warn!(
                "Stage 5: scorer '{}' failed for batch of {}: {}; using heuristic scores",
                name,
                candidates.len(),
                reason
            );
            (heuristic_scores(), ScorerMode::Fallback { name, reason })
        }
    }
}

/// Exactly one well-formed score per candidate
fn check_scores(scores: Vec<CompetitiveScores>, expected: usize) -> Result<Vec<CompetitiveScores>> {
    if scores.len() != expected {
        anyhow::bail!("returned {} scores for {} candidates", scores.len(), expected);
    }
    if let Some(pos) = scores.iter().position(|s| !s.is_well_formed()) {
        anyhow::bail!("score {} is outside [0, 10] or not finite", pos);
    }
    Ok(scores)
}

fn scorer_label(mode: &ScorerMode) -> String {
    match mode {
        ScorerMode::External { name } => name.clone(),
        ScorerMode::Heuristic => "heuristic".to_string(),
        ScorerMode::Fallback { name, .. } => format!("heuristic fallback for {}", name),
    }
}
