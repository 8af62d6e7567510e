use regex::{Regex, RegexBuilder};

use crate::error::{ConfigError, ScoreError};
use crate::heuristics::text::round_to;
use crate::models::{AtomicUnit, DimensionScores, MAX_DIMENSION_SCORE};

const HOOK_PATTERNS: &[&str] = &[
    r"^\s*(?:wait|stop|listen|look|imagine|picture this|here(?:'s)?|this is)\b",
    r"\b(?:you won'?t believe|you need to know|you have to|you must)\b",
    r"\b(?:nobody tells you|nobody talks about|the secret|the truth)\b",
    r"\b(?:this is why|here(?:'s)? why|the reason)\b",
    r"\?\s*$",
];

const EMOTION_PATTERNS: &[&str] = &[
    r"\b(?:shocked|stunned|insane|crazy|unbelievable|wild|amazing|incredible)\b",
    r"\b(?:angry|furious|devastated|heartbroken|terrified|scared|thrilled)\b",
    r"\b(?:love|hate|fear|joy|disgust|surprise|sad|happy|excited)\b",
    r"!",
];

const CLAIM_PATTERNS: &[&str] = &[
    r"\b(?:always|never|every|all|none|nobody|everybody|everyone)\b",
    r"\b(?:fact|proven|study shows|research says|data shows)\b",
    r"\b(?:guarantee|promise|swear|certain|absolutely|definitely)\b",
    r"\b\d+(?:\.\d+)?\s*%",
    r"\$\d[\d,]*",
    r"\b\d+x\b",
    r"\b\d+\s*(?:days?|weeks?|months?|hours?|years?)\b",
];

const IDENTITY_PATTERNS: &[&str] = &[
    r"\b(?:you|your|you'?re|you'?ve|you'?ll|yourself)\b",
    r"\b(?:we all|anyone who|if you'?ve|people like)\b",
    r"\b(?:as a|being a|when you'?re|for you)\b",
];

const ENERGY_PATTERNS: &[&str] = &[
    r"!+",
    r"\b(?:now|right now|immediately|instantly|quickly|fast)\b",
    r"\b(?:massive|huge|giant|enormous|tiny|zero|every single)\b",
    // casing signal, so case-sensitive
    r"(?-i:\b[A-Z]{3,}\b)",
];

/// Weight of emotional charge in delivery intensity; energy gets the rest
const DELIVERY_EMOTION_WEIGHT: f64 = 0.6;

/// A bank of case-insensitive patterns scored by how many of them match
#[derive(Debug, Clone)]
pub struct PatternBank {
    patterns: Vec<Regex>,
    /// Match count that maps to the maximum score
    saturation: usize,
}

impl PatternBank {
    pub fn new(sources: &[&str], saturation: usize) -> Result<Self, ConfigError> {
        let patterns = sources
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
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            saturation: saturation.max(1),
        })
    }

    /// Number of distinct patterns that match somewhere in the text
    pub fn count_matches(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(text)).count()
    }

    /// Match count mapped onto [0, 10]
    pub fn score(&self, text: &str) -> f64 {
        let count = self.count_matches(text) as f64;
        (count / self.saturation as f64 * MAX_DIMENSION_SCORE).min(MAX_DIMENSION_SCORE)
    }
}

/// Deterministic keyword/punctuation scorer for atomic units.
///
/// Compiled once per pipeline; holds no mutable state, so one instance can
/// be shared across threads and runs.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    hook: PatternBank,
    emotion: PatternBank,
    claim: PatternBank,
    identity: PatternBank,
    energy: PatternBank,
}

impl LexiconScorer {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            hook: PatternBank::new(HOOK_PATTERNS, 2)?,
            emotion: PatternBank::new(EMOTION_PATTERNS, 3)?,
            claim: PatternBank::new(CLAIM_PATTERNS, 3)?,
            identity: PatternBank::new(IDENTITY_PATTERNS, 3)?,
            energy: PatternBank::new(ENERGY_PATTERNS, 2)?,
        })
    }

    /// Score raw text on all six dimensions
    pub fn score_text(&self, text: &str) -> DimensionScores {
        let text = text.trim();
        let emotional_charge = self.emotion.score(text);
        let energy = self.energy.score(text);
        let delivery_intensity = emotional_charge * DELIVERY_EMOTION_WEIGHT
            + energy * (1.0 - DELIVERY_EMOTION_WEIGHT);

        DimensionScores {
            hook: round_to(self.hook.score(text), 2),
            emotional_charge: round_to(emotional_charge, 2),
            claim_strength: round_to(self.claim.score(text), 2),
            identity_trigger: round_to(self.identity.score(text), 2),
            energy: round_to(energy, 2),
            delivery_intensity: round_to(delivery_intensity, 2),
        }
        .clamped()
    }

    /// Score a unit, rejecting units that carry nothing to score
    pub fn score_unit(&self, unit: &AtomicUnit) -> Result<DimensionScores, ScoreError> {
        if !unit.start.is_finite() || !unit.end.is_finite() || unit.end < unit.start {
            return Err(ScoreError::InvalidTiming {
                index: unit.index,
                start: unit.start,
                end: unit.end,
            });
        }
        if unit.text.trim().is_empty() {
            return Err(ScoreError::EmptyText(unit.index));
        }
        Ok(self.score_text(&unit.text))
    }
}
