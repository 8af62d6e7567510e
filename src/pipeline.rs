use std::sync::Arc;

use tracing::info;

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::error::ConfigError;
use crate::heuristics::{HeuristicScorer, LexiconScorer};
use crate::models::{PipelineReport, Transcript, UnitArena};
use crate::stages::{
    CompeteConfig, ConstraintConfig, DedupConfig, ReorderConfig, UnitConfig, apply_constraints,
    build_atomic_units, deduplicate, evaluate, generate_candidates, score_units,
};
use crate::traits::{CompetitiveScorer, EmbeddingProvider};

/// The full clip reconstruction pipeline.
///
/// Configuration is validated once, at construction. A constructed pipeline
/// holds no per-run state, so one instance can serve many transcripts
/// concurrently.
pub struct ClipPipeline {
    config: PipelineConfig,
    lexicon: LexiconScorer,
    heuristic: HeuristicScorer,
    scorer: Option<Arc<dyn CompetitiveScorer>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl ClipPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lexicon: LexiconScorer::new()?,
            heuristic: HeuristicScorer::new()?,
            config,
            scorer: None,
            embedder: None,
        })
    }

    /// Use an external competitive scorer instead of the heuristic
    pub fn with_scorer(mut self, scorer: Arc<dyn CompetitiveScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Enable semantic dedup with the given embedding provider
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split and score a transcript's units without composing clips
    pub fn build_units(&self, transcript: &Transcript) -> UnitArena {
        let units = build_atomic_units(transcript, &UnitConfig::from(&self.config));
        score_units(units, &self.lexicon).units
    }

    pub async fn run(&self, transcript: &Transcript) -> PipelineReport {
        self.run_with_cancel(transcript, &CancellationToken::new()).await
    }

    /// Run every stage. Never fails: external failures, cancellation and
    /// thin input show up as degraded or relaxed markers on the report.
    pub async fn run_with_cancel(
        &self,
        transcript: &Transcript,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let units = self.build_units(transcript);

        let candidates = generate_candidates(&units, &ReorderConfig::from(&self.config));
        let raw_candidate_count = candidates.len();

        let constrained = apply_constraints(&candidates, &units, &ConstraintConfig::from(&self.config));
        let constrained_count = constrained.candidates.len();

        let deduped = deduplicate(
            constrained.candidates,
            self.embedder.as_deref(),
            &DedupConfig::from(&self.config),
            cancel,
        )
        .await;
        let deduplicated_count = deduped.candidates.len();

        let ranked = evaluate(
            deduped.candidates,
            self.scorer.as_deref(),
            &self.heuristic,
            &CompeteConfig::from(&self.config),
            cancel,
        )
        .await;

        let report = PipelineReport {
            clips: ranked.clips,
            unit_count: units.len(),
            raw_candidate_count,
            constrained_count,
            deduplicated_count,
            bounds: constrained.bounds,
            dedup: deduped.status,
            scorer: ranked.scorer,
        };

        info!(
            "Pipeline: {} units -> {} candidates -> {} constrained -> {} deduplicated -> {} clips{}{}",
            report.unit_count,
            report.raw_candidate_count,
            report.constrained_count,
            report.deduplicated_count,
            report.clips.len(),
            if report.relaxation_applied() { " (relaxed)" } else { "" },
            if report.is_degraded() { " (degraded)" } else { "" }
        );
        report
    }
}
