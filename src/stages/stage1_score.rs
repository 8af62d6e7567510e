use std::collections::HashMap;

use tracing::{info, warn};

use crate::heuristics::LexiconScorer;
use crate::models::{DimensionScores, UnitArena};

/// Result of Stage 1 scoring
#[derive(Debug)]
pub struct ScoringResult {
    /// Units with scores attached; read-only from here on
    pub units: UnitArena,
    /// Units that could not be scored and got the neutral score
    pub degraded: usize,
    /// Units whose text was already scored earlier in the batch
    pub cache_hits: usize,
}

/// Execute Stage 1: attach six dimension scores to every unit.
///
/// Consumes the unscored arena and returns a scored one. A malformed unit
/// gets the neutral score and a warning; it never aborts the batch.
/// Identical texts are scored once.
pub fn score_units(units: UnitArena, scorer: &LexiconScorer) -> ScoringResult {
    let mut cache: HashMap<String, DimensionScores> = HashMap::new();
    let mut degraded = 0usize;
    let mut cache_hits = 0usize;

    let scored = units
        .into_units()
        .into_iter()
        .map(|mut unit| {
            // scores are written once and never recomputed
            if unit.is_scored() {
                return unit;
            }

            let scores = match cache.get(&unit.text) {
                Some(&cached) => {
                    cache_hits += 1;
                    cached
                }
                None => match scorer.score_unit(&unit) {
                    Ok(scores) => {
                        cache.insert(unit.text.clone(), scores);
                        scores
                    }
                    Err(e) => {
                        warn!("Stage 1: {}, using neutral score", e);
                        degraded += 1;
                        DimensionScores::neutral()
                    }
                },
            };
            unit.scores = Some(scores);
            unit
        })
        .collect();

    let units = UnitArena::new(scored);
    info!(
        "Stage 1: scored {} units ({} degraded, {} cached)",
        units.len(),
        degraded,
        cache_hits
    );

    ScoringResult {
        units,
        degraded,
        cache_hits,
    }
}
