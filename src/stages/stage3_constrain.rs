use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::heuristics::text::{round_to, word_jaccard};
use crate::models::{AppliedBounds, Candidate, ConstrainedCandidate, UnitArena};

/// Gap between consecutive units, in seconds, at which temporal proximity halves
const GAP_HALF_LIFE_SECS: f64 = 30.0;

/// Configuration for Stage 3
#[derive(Debug, Clone)]
pub struct ConstraintConfig {
    pub min_duration: f64,
    pub max_duration: f64,
    pub coherence_threshold: f64,
    pub target_min_candidates: usize,
    pub target_max_candidates: usize,
    /// First unit must sit in this top fraction of hook scores
    pub hook_top_fraction: f64,
    /// Minimum delivery intensity of the last unit
    pub min_ending_impact: f64,
    /// Per-step widening factor for the duration bounds
    pub relax_factor: f64,
    /// Number of widening steps
    pub relax_steps: usize,
    /// Final step drops the upper bound and the hook gate
    pub drop_upper_bound: bool,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ConstraintConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_duration: config.min_duration,
            max_duration: config.max_duration,
            coherence_threshold: config.coherence_threshold,
            target_min_candidates: config.target_min_candidates,
            target_max_candidates: config.target_max_candidates,
            hook_top_fraction: config.hook_top_fraction,
            min_ending_impact: config.min_ending_impact,
            relax_factor: config.relax_factor,
            relax_steps: config.relax_steps,
            drop_upper_bound: config.drop_upper_bound,
        }
    }
}

impl ConstraintConfig {
    pub fn strict_bounds(&self) -> AppliedBounds {
        AppliedBounds {
            level: 0,
            min_duration: self.min_duration,
            max_duration: Some(self.max_duration),
            hook_gate: true,
        }
    }

    /// Strict bounds followed by every relaxation level, loosest last.
    ///
    /// Each level admits a superset of the previous one.
    pub fn relaxation_schedule(&self) -> Vec<AppliedBounds> {
        let mut schedule = vec![self.strict_bounds()];
        let mut min_duration = self.min_duration;

        for level in 1..=self.relax_steps {
            let factor = self.relax_factor.powi(level as i32);
            min_duration = self.min_duration / factor;
            schedule.push(AppliedBounds {
                level,
                min_duration,
                max_duration: Some(self.max_duration * factor),
                hook_gate: true,
            });
        }

        if self.drop_upper_bound {
            schedule.push(AppliedBounds {
                level: self.relax_steps + 1,
                min_duration,
                max_duration: None,
                hook_gate: false,
            });
        }
        schedule
    }
}

/// Result of Stage 3
#[derive(Debug)]
pub struct ConstraintResult {
    /// Survivors, best `constraint_score` first, capped at the target maximum
    pub candidates: Vec<ConstrainedCandidate>,
    /// The bounds the survivors satisfy
    pub bounds: AppliedBounds,
    /// Survivors under the strict bounds, before any relaxation
    pub strict_survivors: usize,
}

/// Execute Stage 3: enforce duration, hook, ending and coherence constraints.
///
/// When fewer than `target_min_candidates` survive, the bounds are relaxed
/// level by level until the target is met or the schedule runs out; then
/// whatever survived is returned. Never fails.
pub fn apply_constraints(
    candidates: &[Candidate],
    units: &UnitArena,
    config: &ConstraintConfig,
) -> ConstraintResult {
    let strict = config.strict_bounds();
    if candidates.is_empty() || units.is_empty() {
        warn!("Stage 3: no candidates to constrain");
        return ConstraintResult {
            candidates: Vec::new(),
            bounds: strict,
            strict_survivors: 0,
        };
    }

    let hook_threshold = hook_threshold(units, config.hook_top_fraction);
    let enriched: Vec<ConstrainedCandidate> =
        candidates.iter().map(|c| enrich(c, units)).collect();

    let schedule = config.relaxation_schedule();
    let mut bounds = strict;
    let mut passed: Vec<&ConstrainedCandidate> = Vec::new();
    let mut strict_survivors = 0;

    for (i, level) in schedule.iter().enumerate() {
        bounds = *level;
        passed = enriched
            .iter()
            .filter(|c| passes(c, &bounds, hook_threshold, config))
            .collect();
        if i == 0 {
            strict_survivors = passed.len();
        }
        if passed.len() >= config.target_min_candidates {
            break;
        }
        if i + 1 < schedule.len() {
            warn!(
                "Stage 3: {} candidates under level {} bounds (target {}), relaxing",
                passed.len(),
                level.level,
                config.target_min_candidates
            );
        }
    }

    let mut survivors: Vec<ConstrainedCandidate> = passed.into_iter().cloned().collect();
    survivors.sort_by(|a, b| {
        b.constraint_score
            .partial_cmp(&a.constraint_score)
            .unwrap_or(Ordering::Equal)
    });
    survivors.truncate(config.target_max_candidates);

    info!(
        "Stage 3: {} candidates pass (level {}, duration {:.1}-{}s, coherence>={})",
        survivors.len(),
        bounds.level,
        bounds.min_duration,
        bounds
            .max_duration
            .map(|m| format!("{:.1}", m))
            .unwrap_or_else(|| "inf".to_string()),
        config.coherence_threshold
    );

    ConstraintResult {
        candidates: survivors,
        bounds,
        strict_survivors,
    }
}

fn passes(
    candidate: &ConstrainedCandidate,
    bounds: &AppliedBounds,
    hook_threshold: f64,
    config: &ConstraintConfig,
) -> bool {
    bounds.admits(candidate.candidate.duration)
        && candidate.coherence >= config.coherence_threshold
        && candidate.impact_score_last >= config.min_ending_impact
        && (!bounds.hook_gate || candidate.hook_score_first >= hook_threshold)
}

/// Hook score a first unit needs to rank in the top fraction of all units
fn hook_threshold(units: &UnitArena, top_fraction: f64) -> f64 {
    let mut hooks: Vec<f64> = units.iter().map(|u| u.scores_or_neutral().hook).collect();
    if hooks.is_empty() {
        return 0.0;
    }
    hooks.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    let cutoff = ((hooks.len() as f64 * top_fraction) as usize).saturating_sub(1);
    hooks[cutoff.min(hooks.len() - 1)]
}

/// Attach first-hook, last-impact, coherence and the composite score
fn enrich(candidate: &Candidate, units: &UnitArena) -> ConstrainedCandidate {
    let hook_first = units.scores(candidate.first_index()).hook;
    let impact_last = units.scores(candidate.last_index()).delivery_intensity;
    let coherence = coherence(candidate, units);

    let constraint_score = candidate.pattern_score * 0.40
        + hook_first * 0.025
        + impact_last * 0.025
        + coherence * 5.0;

    ConstrainedCandidate {
        candidate: candidate.clone(),
        hook_score_first: round_to(hook_first, 3),
        impact_score_last: round_to(impact_last, 3),
        coherence: round_to(coherence, 3),
        constraint_score: round_to(constraint_score, 4),
    }
}

/// Topical and temporal continuity across a candidate's units, in [0, 1].
///
/// Speaker continuity contributes 0.5 (0.2 if speakers change), lexical
/// overlap between consecutive units up to 0.3, and closeness in time up
/// to 0.2.
pub fn coherence(candidate: &Candidate, units: &UnitArena) -> f64 {
    let members: Vec<_> = units.resolve(&candidate.unit_indices).collect();
    if members.is_empty() {
        return 0.0;
    }

    let speakers: HashSet<&str> = members.iter().map(|u| u.speaker.as_str()).collect();
    let speaker = if speakers.len() == 1 { 0.5 } else { 0.2 };

    let (lexical, temporal) = if members.len() < 2 {
        (0.5, 1.0)
    } else {
        let pairs = (members.len() - 1) as f64;
        let lexical = members
            .windows(2)
            .map(|w| word_jaccard(&w[0].text, &w[1].text))
            .sum::<f64>()
            / pairs;
        let mean_gap = members
            .windows(2)
            .map(|w| (w[1].start - w[0].end).max(0.0))
            .sum::<f64>()
            / pairs;
        (lexical, 1.0 / (1.0 + mean_gap / GAP_HALF_LIFE_SECS))
    };

    (speaker + 0.3 * lexical + 0.2 * temporal).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AtomicUnit, DimensionScores, Pattern};

    /// Units spaced `spacing` seconds apart, each 2s long, with given hooks
    fn arena(hooks: &[f64], spacing: f64) -> UnitArena {
        UnitArena::new(
            hooks
                .iter()
                .enumerate()
                .map(|(i, &hook)| {
                    let start = i as f64 * spacing;
                    let mut unit = AtomicUnit::new(i, start, start + 2.0, "money talk here", "host");
                    unit.scores = Some(DimensionScores {
                        hook,
                        delivery_intensity: 5.0,
                        ..Default::default()
                    });
                    unit
                })
                .collect(),
        )
    }

    fn candidate(units: &UnitArena, indices: &[usize]) -> Candidate {
        Candidate::from_units(units, Pattern::HookContextPunchline, indices, 5.0).unwrap()
    }

    fn config() -> ConstraintConfig {
        ConstraintConfig {
            min_duration: 15.0,
            max_duration: 60.0,
            coherence_threshold: 0.15,
            target_min_candidates: 1,
            target_max_candidates: 50,
            hook_top_fraction: 1.0,
            min_ending_impact: 0.0,
            relax_factor: 1.5,
            relax_steps: 2,
            drop_upper_bound: true,
        }
    }

    #[test]
    fn test_schedule_is_monotone() {
        let schedule = config().relaxation_schedule();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].level, 0);
        for w in schedule.windows(2) {
            assert!(w[1].min_duration <= w[0].min_duration);
            let prev_max = w[0].max_duration.unwrap_or(f64::INFINITY);
            let next_max = w[1].max_duration.unwrap_or(f64::INFINITY);
            assert!(next_max >= prev_max);
        }
        assert_eq!(schedule[3].max_duration, None);
        assert!(!schedule[3].hook_gate);
    }

    #[test]
    fn test_strict_filtering() {
        let units = arena(&[5.0; 40], 5.0);
        // spans: [0,2]+... -> durations 12, 22, 102
        let candidates = vec![
            candidate(&units, &[0, 1, 2]),
            candidate(&units, &[0, 2, 4]),
            candidate(&units, &[0, 10, 20]),
        ];
        let result = apply_constraints(&candidates, &units, &config());

        assert_eq!(result.bounds.level, 0);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].candidate.unit_indices, vec![0, 2, 4]);
        assert_eq!(result.strict_survivors, 1);
    }

    #[test]
    fn test_relaxes_until_target_met() {
        let units = arena(&[5.0; 40], 5.0);
        let candidates = vec![
            candidate(&units, &[0, 2, 4]),   // 22s
            candidate(&units, &[0, 1, 2]),   // 12s
            candidate(&units, &[0, 10, 14]), // 72s
            candidate(&units, &[0, 10, 30]), // 152s
        ];
        let config = ConstraintConfig {
            target_min_candidates: 3,
            ..config()
        };
        let result = apply_constraints(&candidates, &units, &config);

        // level 1 widens to 10-90s
        assert_eq!(result.bounds.level, 1);
        assert_eq!(result.candidates.len(), 3);
        assert!(result.candidates.iter().all(|c| result.bounds.admits(c.candidate.duration)));
    }

    #[test]
    fn test_five_strict_survivors_relax_toward_twenty() {
        let units = arena(&[5.0; 40], 5.0);
        // 17-42s: inside the strict bounds
        let mut candidates: Vec<_> = [[0, 1, 3], [0, 2, 4], [0, 2, 5], [0, 3, 6], [0, 4, 8]]
            .iter()
            .map(|idx| candidate(&units, idx))
            .collect();
        // 62-82s: only inside the widened bounds
        for first in 0..3 {
            for span in 12..=16 {
                candidates.push(candidate(&units, &[first, first + 1, first + span]));
            }
        }
        let config = ConstraintConfig {
            target_min_candidates: 20,
            target_max_candidates: 50,
            ..config()
        };
        let result = apply_constraints(&candidates, &units, &config);

        assert_eq!(result.strict_survivors, 5);
        assert!(result.bounds.is_relaxed());
        assert!(result.candidates.len() >= 5 && result.candidates.len() <= 50);
        assert!(result.candidates.iter().all(|c| result.bounds.admits(c.candidate.duration)));
    }

    #[test]
    fn test_returns_what_survives_when_schedule_exhausted() {
        let units = arena(&[5.0; 10], 5.0);
        let candidates = vec![candidate(&units, &[0, 2, 4])];
        let config = ConstraintConfig {
            target_min_candidates: 20,
            target_max_candidates: 30,
            ..config()
        };
        let result = apply_constraints(&candidates, &units, &config);

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.bounds.max_duration, None);
    }

    #[test]
    fn test_caps_at_target_max_by_constraint_score() {
        let units = arena(&[5.0; 40], 5.0);
        let candidates: Vec<_> = (0..6).map(|i| candidate(&units, &[i, i + 2, i + 4])).collect();
        let config = ConstraintConfig {
            target_max_candidates: 2,
            ..config()
        };
        let result = apply_constraints(&candidates, &units, &config);

        assert_eq!(result.candidates.len(), 2);
        assert!(result.candidates[0].constraint_score >= result.candidates[1].constraint_score);
    }

    #[test]
    fn test_hook_gate() {
        // top 20% of ten units is the two best hooks: 10 and 8
        let mut hooks = vec![0.0; 10];
        hooks[3] = 10.0;
        hooks[6] = 8.0;
        let units = arena(&hooks, 5.0);
        let candidates = vec![candidate(&units, &[0, 2, 4]), candidate(&units, &[3, 5, 7])];
        let config = ConstraintConfig {
            hook_top_fraction: 0.2,
            ..config()
        };
        let result = apply_constraints(&candidates, &units, &config);

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].candidate.first_index(), 3);
        assert_eq!(result.candidates[0].hook_score_first, 10.0);
        assert_eq!(result.candidates[0].impact_score_last, 5.0);
    }

    #[test]
    fn test_coherence_bounds_and_components() {
        let units = arena(&[0.0; 5], 2.0);
        let contiguous = candidate(&units, &[0, 1, 2]);
        // same speaker, identical text, no gaps
        assert!((coherence(&contiguous, &units) - 1.0).abs() < 1e-9);

        let mut mixed = arena(&[0.0; 3], 100.0).into_units();
        mixed[1].speaker = "guest".to_string();
        mixed[1].text = "something else entirely".to_string();
        let mixed = UnitArena::new(mixed);
        let c = candidate(&mixed, &[0, 1, 2]);
        let value = coherence(&c, &mixed);
        assert!(value > 0.0 && value < 0.5);
    }

    #[test]
    fn test_empty_input() {
        let result = apply_constraints(&[], &UnitArena::default(), &config());
        assert!(result.candidates.is_empty());
        assert_eq!(result.bounds.level, 0);
    }
}
