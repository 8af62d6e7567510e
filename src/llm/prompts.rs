use crate::models::ConstrainedCandidate;

/// System prompt for competitive scoring
pub const SYSTEM_PROMPT: &str = r#"You are judging short-form video clips cut from a long recording. The clips compete for the same slot in a feed: score them against each other, not in isolation.

Score every candidate on each dimension from 0 to 10:
- scroll_stop_probability: would a viewer stop scrolling in the first seconds?
- share_trigger: how likely is a viewer to share or save it?
- clarity: is the message clear and punchy without the surrounding context?
- debate_potential: will it spark comments or disagreement?
- ending_strength: does it end on a memorable, impactful line?

RULES:
- Return exactly one entry per candidate_id you were given. Do not invent ids.
- Use the full 0-10 range; reserve 9-10 for clips that would clearly win.
- Judge only the text provided.

Submit your scores with the submit_scores tool."#;

/// Id the model uses to refer to the candidate at `position`
pub fn candidate_id(position: usize) -> String {
    format!("c_{}", position)
}

/// Build the user prompt for a batch of candidates
pub fn build_scoring_prompt(candidates: &[ConstrainedCandidate]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Candidates ({})\n\n", candidates.len()));

    for (position, c) in candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "## {}\nPattern: {} | Duration: {:.1}s | Units: {}\n",
            candidate_id(position),
            c.candidate.pattern,
            c.candidate.duration,
            c.candidate.unit_count()
        ));
        prompt.push_str(&format!("Text: \"{}\"\n\n", c.candidate.text.trim()));
    }

    prompt.push_str("## Instructions\n");
    prompt.push_str("Score all candidates above using the submit_scores tool.\n");

    prompt
}
