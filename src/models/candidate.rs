use serde::{Deserialize, Serialize};

use super::{DimensionScores, UnitArena};

/// Narrative role a unit plays inside a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hook,
    Context,
    Punchline,
    Claim,
}

impl Role {
    /// Suitability of a unit for this role, on the 0-10 dimension scale
    pub fn score(self, s: &DimensionScores) -> f64 {
        match self {
            Role::Hook => s.hook * 0.5 + s.emotional_charge * 0.3 + s.energy * 0.2,
            Role::Context => {
                s.claim_strength * 0.4 + s.identity_trigger * 0.3 + s.emotional_charge * 0.3
            }
            Role::Punchline => {
                s.delivery_intensity * 0.4 + s.claim_strength * 0.3 + s.hook * 0.3
            }
            Role::Claim => s.claim_strength,
        }
    }
}

/// Closed set of narrative orderings used to compose candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Hook, then context, then punchline
    HookContextPunchline,
    /// Strong claim, supporting data, stronger claim
    ClaimDataStronger,
    /// Punchline first, explanation, reinforcement
    PunchlineExplanationReinforcement,
    /// A lone unit; only produced when too few units exist for the others
    SingleUnit,
}

impl Pattern {
    /// The multi-role patterns, in construction order
    pub const NARRATIVE: [Pattern; 3] = [
        Pattern::HookContextPunchline,
        Pattern::ClaimDataStronger,
        Pattern::PunchlineExplanationReinforcement,
    ];

    /// Role slots with their weight in the pattern score
    pub fn slots(self) -> &'static [(Role, f64)] {
        match self {
            Pattern::HookContextPunchline => {
                &[(Role::Hook, 0.40), (Role::Context, 0.30), (Role::Punchline, 0.30)]
            }
            Pattern::ClaimDataStronger => {
                &[(Role::Claim, 0.35), (Role::Context, 0.25), (Role::Claim, 0.40)]
            }
            Pattern::PunchlineExplanationReinforcement => {
                &[(Role::Punchline, 0.45), (Role::Context, 0.25), (Role::Hook, 0.30)]
            }
            Pattern::SingleUnit => &[(Role::Hook, 1.0)],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::HookContextPunchline => "hook_context_punchline",
            Pattern::ClaimDataStronger => "claim_data_stronger",
            Pattern::PunchlineExplanationReinforcement => "punchline_explanation_reinforcement",
            Pattern::SingleUnit => "single_unit",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed clip: an ordered set of unit indices into the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Strictly ascending, non-empty, no repeats
    pub unit_indices: Vec<usize>,
    pub pattern: Pattern,
    pub pattern_score: f64,
    pub is_contiguous: bool,
    /// Earliest unit start, in seconds
    pub start: f64,
    /// Latest unit end, in seconds
    pub end: f64,
    /// `end - start`
    pub duration: f64,
    /// Sum of constituent unit durations (what a non-contiguous cut plays)
    pub playback_duration: f64,
    /// Unit texts joined in chronological order
    pub text: String,
}

impl Candidate {
    /// Build a candidate from role-ordered unit indices.
    ///
    /// Returns `None` when the selection is empty, repeats a unit, or
    /// references an index outside the arena.
    pub fn from_units(
        arena: &UnitArena,
        pattern: Pattern,
        role_indices: &[usize],
        pattern_score: f64,
    ) -> Option<Self> {
        let mut indices = role_indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() || indices.len() != role_indices.len() {
            return None;
        }
        if indices.iter().any(|&i| arena.get(i).is_none()) {
            return None;
        }

        let units: Vec<_> = arena.resolve(&indices).collect();
        let start = units.iter().map(|u| u.start).fold(f64::INFINITY, f64::min);
        let end = units.iter().map(|u| u.end).fold(f64::NEG_INFINITY, f64::max);
        let playback_duration = units.iter().map(|u| u.duration()).sum();
        let text = units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let is_contiguous = indices.windows(2).all(|w| w[1] == w[0] + 1);

        Some(Self {
            is_contiguous,
            start,
            end,
            duration: (end - start).max(0.0),
            playback_duration,
            text,
            pattern,
            pattern_score,
            unit_indices: indices,
        })
    }

    pub fn first_index(&self) -> usize {
        self.unit_indices[0]
    }

    pub fn last_index(&self) -> usize {
        self.unit_indices[self.unit_indices.len() - 1]
    }

    pub fn unit_count(&self) -> usize {
        self.unit_indices.len()
    }
}

/// A candidate that survived (possibly relaxed) constraint filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Hook score of the first (earliest) unit
    pub hook_score_first: f64,
    /// Delivery intensity of the last (latest) unit
    pub impact_score_last: f64,
    /// Topical/temporal continuity in [0, 1]
    pub coherence: f64,
    pub constraint_score: f64,
}
