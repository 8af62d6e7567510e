use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::heuristics::text::round_to;
use crate::models::{Candidate, Pattern, Role, UnitArena};

/// Configuration for Stage 2
#[derive(Debug, Clone)]
pub struct ReorderConfig {
    /// Top units considered per role
    pub k: usize,
    /// With fewer than three units, emit single-unit candidates instead of nothing
    pub single_unit_fallback: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            k: 5,
            single_unit_fallback: false,
        }
    }
}

impl From<&PipelineConfig> for ReorderConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            k: config.reorder_k,
            single_unit_fallback: config.single_unit_fallback,
        }
    }
}

/// Execute Stage 2: compose candidates from top units per narrative role.
///
/// For each pattern, the top-`k` units per role slot are crossed (units may
/// not repeat within a candidate). Candidates with the same unit set are
/// collapsed, keeping the higher `pattern_score`; on a tie the one built
/// first wins. Output is sorted by `pattern_score`, highest first.
pub fn generate_candidates(units: &UnitArena, config: &ReorderConfig) -> Vec<Candidate> {
    if units.len() < 3 {
        return few_unit_candidates(units, config);
    }

    let mut unique: Vec<Candidate> = Vec::new();
    let mut by_units: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut total = 0usize;

    for pattern in Pattern::NARRATIVE {
        let built = build_pattern(units, pattern, config.k);
        debug!("Pattern {}: {} combinations", pattern, built.len());
        total += built.len();

        for candidate in built {
            match by_units.get(&candidate.unit_indices) {
                Some(&pos) => {
                    if candidate.pattern_score > unique[pos].pattern_score {
                        unique[pos] = candidate;
                    }
                }
                None => {
                    by_units.insert(candidate.unit_indices.clone(), unique.len());
                    unique.push(candidate);
                }
            }
        }
    }

    // stable: equal scores keep construction order
    unique.sort_by(|a, b| {
        b.pattern_score
            .partial_cmp(&a.pattern_score)
            .unwrap_or(Ordering::Equal)
    });

    info!(
        "Stage 2: {} unique candidates from {} combinations (k={})",
        unique.len(),
        total,
        config.k
    );
    unique
}

/// Candidates for one pattern, in construction order
fn build_pattern(units: &UnitArena, pattern: Pattern, k: usize) -> Vec<Candidate> {
    let slots = pattern.slots();
    let selections: Vec<Vec<usize>> = slots
        .iter()
        .map(|&(role, _)| top_k(units, role, k))
        .collect();

    role_combinations(&selections)
        .into_iter()
        .filter_map(|combo| {
            let score: f64 = combo
                .iter()
                .zip(slots)
                .map(|(&idx, &(role, weight))| role.score(&units.scores(idx)) * weight)
                .sum();
            Candidate::from_units(units, pattern, &combo, round_to(score, 3))
        })
        .collect()
}

/// Indices of the `k` best units for a role; ties go to the earlier unit
fn top_k(units: &UnitArena, role: Role, k: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = units
        .iter()
        .map(|u| (u.index, role.score(&u.scores_or_neutral())))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(idx, _)| idx).collect()
}

/// Cross product of per-slot selections, skipping any combination that
/// reuses a unit. Order follows the selections (first slot outermost).
fn role_combinations(selections: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut combos: Vec<Vec<usize>> = vec![Vec::new()];
    for choices in selections {
        let mut next = Vec::with_capacity(combos.len() * choices.len());
        for combo in &combos {
            for &choice in choices {
                if combo.contains(&choice) {
                    continue;
                }
                let mut extended = combo.clone();
                extended.push(choice);
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn few_unit_candidates(units: &UnitArena, config: &ReorderConfig) -> Vec<Candidate> {
    if !config.single_unit_fallback || units.is_empty() {
        warn!(
            "Stage 2: {} units is too few for narrative patterns, no candidates",
            units.len()
        );
        return Vec::new();
    }

    warn!(
        "Stage 2: {} units is too few for narrative patterns, emitting single-unit candidates",
        units.len()
    );
    let mut candidates: Vec<Candidate> = units
        .iter()
        .filter_map(|u| {
            let score = round_to(Role::Hook.score(&u.scores_or_neutral()), 3);
            Candidate::from_units(units, Pattern::SingleUnit, &[u.index], score)
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.pattern_score
            .partial_cmp(&a.pattern_score)
            .unwrap_or(Ordering::Equal)
    });
    candidates
}
