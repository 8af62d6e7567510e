use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::candidate_id;
use crate::models::CompetitiveScores;

/// What the model submits through the `submit_scores` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub scores: Vec<CandidateScore>,
}

/// Scores for one candidate, keyed by the id given in the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate_id: String,
    pub scroll_stop_probability: f64,
    pub share_trigger: f64,
    pub clarity: f64,
    pub debate_potential: f64,
    pub ending_strength: f64,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl CandidateScore {
    pub fn scores(&self) -> CompetitiveScores {
        CompetitiveScores {
            scroll_stop_probability: self.scroll_stop_probability,
            share_trigger: self.share_trigger,
            clarity: self.clarity,
            debate_potential: self.debate_potential,
            ending_strength: self.ending_strength,
        }
    }
}

/// Outcome of checking a submission
#[derive(Debug, Clone)]
pub struct SubmissionValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl SubmissionValidation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate a submission against a batch of `expected` candidates
///
/// Every id `c_0..c_{expected-1}` must appear exactly once, no other ids
/// may appear, and every dimension must be finite and within [0, 10].
pub fn validate_submission(submission: &ScoreSubmission, expected: usize) -> SubmissionValidation {
    let mut errors = Vec::new();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for score in &submission.scores {
        *seen.entry(score.candidate_id.as_str()).or_insert(0) += 1;

        if !score.scores().is_well_formed() {
            errors.push(format!(
                "Candidate {} has a score outside [0, 10]",
                score.candidate_id
            ));
        }
    }

    for position in 0..expected {
        let id = candidate_id(position);
        match seen.remove(id.as_str()) {
            None => errors.push(format!("Candidate {} was not scored", id)),
            Some(1) => {}
            Some(n) => errors.push(format!("Candidate {} was scored {} times", id, n)),
        }
    }

    let mut unknown: Vec<&str> = seen.into_keys().collect();
    unknown.sort_unstable();
    for id in unknown {
        errors.push(format!("Unknown candidate id {}", id));
    }

    SubmissionValidation::from_errors(errors)
}

/// Scores in candidate order. Call only on a validated submission.
pub fn ordered_scores(submission: &ScoreSubmission, expected: usize) -> Vec<CompetitiveScores> {
    let by_id: HashMap<&str, CompetitiveScores> = submission
        .scores
        .iter()
        .map(|s| (s.candidate_id.as_str(), s.scores()))
        .collect();

    (0..expected)
        .map(|position| {
            by_id
                .get(candidate_id(position).as_str())
                .copied()
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(id: &str, value: f64) -> CandidateScore {
        CandidateScore {
            candidate_id: id.to_string(),
            scroll_stop_probability: value,
            share_trigger: value,
            clarity: value,
            debate_potential: value,
            ending_strength: value,
            rationale: None,
        }
    }

    #[test]
    fn test_valid_submission_any_order() {
        let submission = ScoreSubmission {
            scores: vec![score("c_1", 2.0), score("c_0", 9.0)],
        };
        let validation = validate_submission(&submission, 2);
        assert!(validation.is_valid, "{:?}", validation.errors);

        let ordered = ordered_scores(&submission, 2);
        assert_eq!(ordered[0].clarity, 9.0);
        assert_eq!(ordered[1].clarity, 2.0);
    }

    #[test]
    fn test_missing_and_duplicate_ids() {
        let submission = ScoreSubmission {
            scores: vec![score("c_0", 1.0), score("c_0", 2.0)],
        };
        let validation = validate_submission(&submission, 2);

        assert!(!validation.is_valid);
        assert!(validation.errors.iter().any(|e| e.contains("c_0 was scored 2 times")));
        assert!(validation.errors.iter().any(|e| e.contains("c_1 was not scored")));
    }

    #[test]
    fn test_unknown_id_and_range() {
        let submission = ScoreSubmission {
            scores: vec![score("c_0", 11.0), score("c_7", 1.0)],
        };
        let validation = validate_submission(&submission, 1);

        assert!(!validation.is_valid);
        assert!(validation.errors.iter().any(|e| e.contains("outside [0, 10]")));
        assert!(validation.errors.iter().any(|e| e.contains("Unknown candidate id c_7")));
    }
}
