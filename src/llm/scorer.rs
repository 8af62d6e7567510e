use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{AnthropicClient, SYSTEM_PROMPT, build_scoring_prompt, ordered_scores, validate_submission};
use crate::models::{CompetitiveScores, ConstrainedCandidate};
use crate::traits::CompetitiveScorer;

/// Competitive scorer backed by a Claude model.
///
/// The whole batch goes out in one request so the model can rank the
/// candidates against each other. A submission that fails validation is an
/// error; the evaluator then falls back to heuristic scores.
pub struct AnthropicScorer {
    client: AnthropicClient,
    /// Extra attempts after a rejected submission
    max_retries: u32,
}

impl AnthropicScorer {
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            max_retries: 1,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl CompetitiveScorer for AnthropicScorer {
    fn name(&self) -> &str {
        self.client.model()
    }

    async fn score_batch(&self, candidates: &[ConstrainedCandidate]) -> Result<Vec<CompetitiveScores>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_scoring_prompt(candidates);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                info!("Scoring retry {} of {}", attempt, self.max_retries);
            }

            match self.client.send_with_tool(SYSTEM_PROMPT, &prompt).await {
                Ok(submission) => {
                    let validation = validate_submission(&submission, candidates.len());
                    if validation.is_valid {
                        debug!("Model scored {} candidates", candidates.len());
                        return Ok(ordered_scores(&submission, candidates.len()));
                    }
                    last_error = Some(anyhow::anyhow!(
                        "Validation failed: {:?}",
                        validation.errors
                    ));
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Scoring failed")))
    }
}
