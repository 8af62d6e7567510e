//! Injection seams for the pipeline's external collaborators.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CompetitiveScores, ConstrainedCandidate};

/// Scores a batch of candidates on the five competitive dimensions.
///
/// Implementations return exactly one score per candidate, in input order.
/// Anything else is treated as malformed output by the evaluator.
#[async_trait]
pub trait CompetitiveScorer: Send + Sync {
    /// Short label recorded in the run report
    fn name(&self) -> &str;

    async fn score_batch(&self, candidates: &[ConstrainedCandidate]) -> Result<Vec<CompetitiveScores>>;
}

/// Turns texts into embedding vectors for semantic dedup.
///
/// Implementations return one vector per text, in input order, all of the
/// same dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
