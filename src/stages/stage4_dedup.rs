use std::cmp::Ordering;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cancel::{CancellationToken, bounded};
use crate::config::PipelineConfig;
use crate::embeddings::cosine_similarity;
use crate::models::{ConstrainedCandidate, DEDUP_NOT_CONFIGURED, DedupStatus};
use crate::traits::EmbeddingProvider;

/// Configuration for Stage 4
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Pairs at or above this cosine similarity are near-duplicates
    pub similarity_threshold: f64,
    /// Upper bound on the embedding call
    pub timeout: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for DedupConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            timeout: Duration::from_millis(config.embedding_timeout_ms),
        }
    }
}

/// Result of Stage 4
#[derive(Debug)]
pub struct DedupResult {
    /// Survivors, best `constraint_score` first
    pub candidates: Vec<ConstrainedCandidate>,
    pub status: DedupStatus,
}

/// Execute Stage 4: drop semantic near-duplicates.
///
/// Candidates are visited best `constraint_score` first (stable, so equal
/// scores keep their incoming order) and one is kept only if its similarity
/// to every already-kept candidate is below the threshold.
///
/// Without a provider, or when the provider fails, times out, is cancelled
/// or returns unusable vectors, candidates pass through untouched and the
/// status records why.
pub async fn deduplicate(
    mut candidates: Vec<ConstrainedCandidate>,
    provider: Option<&dyn EmbeddingProvider>,
    config: &DedupConfig,
    cancel: &CancellationToken,
) -> DedupResult {
    candidates.sort_by(|a, b| {
        b.constraint_score
            .partial_cmp(&a.constraint_score)
            .unwrap_or(Ordering::Equal)
    });

    let Some(provider) = provider else {
        info!("Stage 4: dedup disabled ({})", DEDUP_NOT_CONFIGURED);
        return DedupResult {
            candidates,
            status: DedupStatus::Disabled {
                reason: DEDUP_NOT_CONFIGURED.to_string(),
            },
        };
    };

    if candidates.is_empty() {
        return DedupResult {
            candidates,
            status: DedupStatus::Enabled { removed: 0 },
        };
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.candidate.text.clone()).collect();
    let embedded = bounded(provider.embed(&texts), config.timeout, cancel)
        .await
        .and_then(|vectors| check_vectors(vectors, texts.len()));

    let vectors = match embedded {
        Ok(vectors) => vectors,
        Err(e) => {
            let reason = format!("embedding provider '{}' failed: {:#}", provider.name(), e);
            warn!("Stage 4: {}, skipping dedup", reason);
            return DedupResult {
                candidates,
                status: DedupStatus::Disabled { reason },
            };
        }
    };

    let total = candidates.len();
    let mut kept: Vec<usize> = Vec::new();
    for i in 0..total {
        let duplicate_of = kept.iter().copied().find(|&k| {
            cosine_similarity(&vectors[i], &vectors[k]) >= config.similarity_threshold
        });
        match duplicate_of {
            Some(k) => debug!(
                "Stage 4: {:?} duplicates {:?}",
                candidates[i].candidate.unit_indices, candidates[k].candidate.unit_indices
            ),
            None => kept.push(i),
        }
    }

    let removed = total - kept.len();
    let survivors: Vec<ConstrainedCandidate> = candidates
        .into_iter()
        .enumerate()
        .filter(|(i, _)| kept.contains(i))
        .map(|(_, c)| c)
        .collect();

    info!(
        "Stage 4: {} candidates after dedup ({} removed, threshold {}, provider {})",
        survivors.len(),
        removed,
        config.similarity_threshold,
        provider.name()
    );

    DedupResult {
        candidates: survivors,
        status: DedupStatus::Enabled { removed },
    }
}

/// One finite, non-empty vector per text, all of the same dimension
fn check_vectors(vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        anyhow::bail!("returned {} vectors for {} texts", vectors.len(), expected);
    }
    let dimension = vectors.first().map(Vec::len).unwrap_or(0);
    if dimension == 0 {
        anyhow::bail!("returned empty vectors");
    }
    if vectors.iter().any(|v| v.len() != dimension) {
        anyhow::bail!("returned vectors of mismatched dimensions");
    }
    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        anyhow::bail!("returned non-finite values");
    }
    Ok(vectors)
}
