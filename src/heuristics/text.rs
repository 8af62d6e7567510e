use std::collections::HashSet;

/// Split text into sentences at `.`, `!` or `?` followed by whitespace.
///
/// Terminal punctuation stays with its sentence. Text without any boundary
/// comes back as a single sentence; blank text yields nothing.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            push_trimmed(&mut sentences, &current);
            current.clear();
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, s: &str) {
    let trimmed = s.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

/// Lowercase a word and keep only ASCII alphanumerics
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalized, non-empty words of a text, in order
pub fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Jaccard similarity of the normalized word sets of two texts
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = normalized_words(a).into_iter().collect();
    let set_b: HashSet<String> = normalized_words(b).into_iter().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("Wait. Is this real?  Yes!  It is");
        assert_eq!(sentences, vec!["Wait.", "Is this real?", "Yes!", "It is"]);
    }

    #[test]
    fn test_split_keeps_decimals_together() {
        let sentences = split_sentences("Growth was 3.5 percent. Huge.");
        assert_eq!(sentences, vec!["Growth was 3.5 percent.", "Huge."]);
    }

    #[test]
    fn test_split_without_boundary() {
        assert_eq!(split_sentences("no punctuation here"), vec!["no punctuation here"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("Don't!"), "dont");
        assert_eq!(normalize_word("--"), "");
    }

    #[test]
    fn test_word_jaccard() {
        assert!((word_jaccard("the cat sat", "the cat ran") - 0.5).abs() < 1e-9);
        assert_eq!(word_jaccard("", ""), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(1.23456, 3), 1.235);
    }
}
