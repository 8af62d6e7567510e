pub mod cancel;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;
pub mod traits;

pub use cancel::CancellationToken;
pub use config::PipelineConfig;
pub use embeddings::{EmbeddingClient, EmbeddingClientConfig, HashingEmbedder};
pub use error::{ConfigError, ScoreError};
pub use heuristics::{HeuristicScorer, LexiconScorer};
pub use io::{ClipReport, ClipSummary, parse_transcript_file, parse_transcript_json};
pub use llm::{AnthropicClient, AnthropicConfig, AnthropicScorer};
pub use models::{
    AtomicUnit, Candidate, CompetitiveScores, CompetitiveWeights, ConstrainedCandidate, FinalClip,
    Pattern, PipelineReport, Role, Transcript, TranscriptSegment, UnitArena, WordToken,
};
pub use pipeline::ClipPipeline;
pub use traits::{CompetitiveScorer, EmbeddingProvider};
