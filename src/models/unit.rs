use serde::{Deserialize, Serialize};

/// Upper bound for every dimension score
pub const MAX_DIMENSION_SCORE: f64 = 10.0;

/// The six per-sentence dimensions, each in [0, 10]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    /// Attention-grabbing opening quality
    pub hook: f64,
    /// Emotional intensity
    pub emotional_charge: f64,
    /// Strength of assertion, specifics, numbers
    pub claim_strength: f64,
    /// Second-person / relatability framing
    pub identity_trigger: f64,
    /// Pacing and emphasis markers
    pub energy: f64,
    /// Composite of energy and emotional charge
    pub delivery_intensity: f64,
}

impl DimensionScores {
    /// Neutral score used when a unit cannot be scored
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Clamp every dimension into [0, 10]
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| {
            if v.is_finite() {
                v.clamp(0.0, MAX_DIMENSION_SCORE)
            } else {
                0.0
            }
        };
        Self {
            hook: clamp(self.hook),
            emotional_charge: clamp(self.emotional_charge),
            claim_strength: clamp(self.claim_strength),
            identity_trigger: clamp(self.identity_trigger),
            energy: clamp(self.energy),
            delivery_intensity: clamp(self.delivery_intensity),
        }
    }
}

/// A sentence-level slice of the transcript with resolved timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicUnit {
    /// Stable position in the episode, assigned in transcript order
    pub index: usize,
    /// Start timestamp in seconds
    pub start: f64,
    /// End timestamp in seconds
    pub end: f64,
    pub text: String,
    pub speaker: String,
    pub word_count: usize,
    /// Populated once by the scorer stage, read-only afterwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<DimensionScores>,
}

impl AtomicUnit {
    pub fn new(index: usize, start: f64, end: f64, text: &str, speaker: &str) -> Self {
        Self {
            index,
            start,
            end,
            text: text.to_string(),
            speaker: speaker.to_string(),
            word_count: text.split_whitespace().count(),
            scores: None,
        }
    }

    /// Duration of this unit in seconds
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_scored(&self) -> bool {
        self.scores.is_some()
    }

    /// Scores, or the neutral score for a unit that was never scored
    pub fn scores_or_neutral(&self) -> DimensionScores {
        self.scores.unwrap_or_default()
    }
}

/// Index-addressed store of atomic units; candidates refer into it by index.
///
/// The arena is immutable once built: `units[i].index == i` for every unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitArena {
    units: Vec<AtomicUnit>,
}

impl UnitArena {
    /// Build an arena, re-numbering indices to match positions
    pub fn new(mut units: Vec<AtomicUnit>) -> Self {
        for (i, unit) in units.iter_mut().enumerate() {
            unit.index = i;
        }
        Self { units }
    }

    pub fn get(&self, index: usize) -> Option<&AtomicUnit> {
        self.units.get(index)
    }

    /// Scores for a unit index; neutral for unscored or unknown indices
    pub fn scores(&self, index: usize) -> DimensionScores {
        self.get(index)
            .map(AtomicUnit::scores_or_neutral)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomicUnit> {
        self.units.iter()
    }

    pub fn as_slice(&self) -> &[AtomicUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<AtomicUnit> {
        self.units
    }

    /// Resolve a list of indices, skipping any that are out of range
    pub fn resolve<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a AtomicUnit> + 'a {
        indices.iter().filter_map(move |&i| self.units.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_scores() {
        let scores = DimensionScores {
            hook: 12.0,
            emotional_charge: -1.0,
            claim_strength: f64::NAN,
            identity_trigger: 5.0,
            energy: 10.0,
            delivery_intensity: 0.0,
        }
        .clamped();

        assert_eq!(scores.hook, 10.0);
        assert_eq!(scores.emotional_charge, 0.0);
        assert_eq!(scores.claim_strength, 0.0);
        assert_eq!(scores.identity_trigger, 5.0);
    }

    #[test]
    fn test_arena_renumbers_indices() {
        let arena = UnitArena::new(vec![
            AtomicUnit::new(7, 0.0, 1.0, "first one", "a"),
            AtomicUnit::new(3, 1.0, 2.0, "second", "a"),
        ]);

        assert_eq!(arena.get(0).unwrap().index, 0);
        assert_eq!(arena.get(1).unwrap().index, 1);
        assert_eq!(arena.get(0).unwrap().word_count, 2);
        assert_eq!(arena.scores(5), DimensionScores::neutral());
    }

    #[test]
    fn test_resolve_skips_unknown_indices() {
        let arena = UnitArena::new(vec![AtomicUnit::new(0, 0.0, 1.0, "x", "a")]);
        let indices = [0, 4];
        assert_eq!(arena.resolve(&indices).count(), 1);
    }
}
