use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Transcript, TranscriptSegment};

/// Accepted top-level layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Wrapped { segments: Vec<TranscriptSegment> },
    Bare(Vec<TranscriptSegment>),
}

/// Parse a transcript JSON file
pub fn parse_transcript_file(path: &Path) -> Result<Transcript> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_transcript_json(&content).with_context(|| format!("Invalid transcript: {:?}", path))
}

/// Parse a transcript from either `{"segments": [...]}` or a bare segment array
pub fn parse_transcript_json(json: &str) -> Result<Transcript> {
    let document: TranscriptDocument =
        serde_json::from_str(json).context("Failed to parse transcript JSON")?;

    let segments = match document {
        TranscriptDocument::Wrapped { segments } => segments,
        TranscriptDocument::Bare(segments) => segments,
    };

    if let Some(pos) = segments
        .iter()
        .position(|s| !s.start.is_finite() || !s.end.is_finite())
    {
        anyhow::bail!("Segment {} has a non-finite timestamp", pos);
    }

    Ok(Transcript::new(segments))
}
