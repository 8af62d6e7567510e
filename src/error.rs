use thiserror::Error;

/// Invalid pipeline settings. Always fatal, raised at construction time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("max_duration ({max}) must be greater than min_duration ({min})")]
    DurationBounds { min: f64, max: f64 },

    #[error("target_min_candidates ({min}) must not exceed target_max_candidates ({max})")]
    CandidateTargets { min: usize, max: usize },

    #[error("relax_factor must be at least 1.0 (got {0})")]
    RelaxFactor(f64),

    #[error("competitive weight {field} must be non-negative (got {value})")]
    NegativeWeight { field: &'static str, value: f64 },

    #[error("competitive weights must not all be zero")]
    ZeroWeights,

    #[error("default_speaker must not be empty")]
    EmptySpeaker,

    #[error("invalid lexicon pattern {pattern:?}: {message}")]
    Lexicon { pattern: String, message: String },
}

/// Per-unit scoring failure; converted into a neutral score by the scorer stage.
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("unit {0} has no text")]
    EmptyText(usize),

    #[error("unit {index} has invalid timing ({start}..{end})")]
    InvalidTiming { index: usize, start: f64, end: f64 },
}
