use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::heuristics::text::{normalize_word, normalized_words, split_sentences};
use crate::models::{AtomicUnit, Transcript, TranscriptSegment, UnitArena, WordToken};

/// Configuration for Stage 0
#[derive(Debug, Clone)]
pub struct UnitConfig {
    /// Speaker label used when a segment carries none
    pub default_speaker: String,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            default_speaker: "speaker_0".to_string(),
        }
    }
}

impl From<&PipelineConfig> for UnitConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            default_speaker: config.default_speaker.clone(),
        }
    }
}

/// A sentence with its resolved time span, before index assignment
#[derive(Debug, Clone)]
struct TimedSentence {
    text: String,
    start: f64,
    end: f64,
}

/// Execute Stage 0: split segments into sentence-level atomic units.
///
/// Sentences take their times from word timestamps when the segment has
/// them; otherwise the segment's span is shared out by word count. Indices
/// run 0..n in transcript order and start/end never decrease with index.
pub fn build_atomic_units(transcript: &Transcript, config: &UnitConfig) -> UnitArena {
    if transcript.is_empty() {
        warn!("Stage 0: transcript has no segments");
        return UnitArena::default();
    }

    let mut units: Vec<AtomicUnit> = Vec::new();
    let mut floor = f64::NEG_INFINITY;
    let mut prev_end = f64::NEG_INFINITY;
    let mut defaulted_speakers = 0usize;

    for (seg_idx, segment) in transcript.segments.iter().enumerate() {
        let text = segment.text.trim();
        if text.is_empty() {
            debug!("Segment {} has no text, skipping", seg_idx);
            continue;
        }

        let (seg_start, seg_end) = segment_bounds(segment, seg_idx);
        let speaker = match segment.speaker.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => {
                defaulted_speakers += 1;
                config.default_speaker.as_str()
            }
        };

        let mut sentences = split_sentences(text);
        if sentences.is_empty() {
            sentences.push(text.to_string());
        }

        let timed = if segment.has_word_timestamps() {
            assign_from_words(&sentences, &segment.words, seg_start, seg_end)
        } else {
            assign_proportional(&sentences, seg_start, seg_end)
        };

        for sentence in timed {
            // keep times monotone across the whole transcript
            let start = sentence.start.max(floor);
            let end = sentence.end.max(start).max(prev_end);
            floor = start;
            prev_end = end;
            units.push(AtomicUnit::new(units.len(), start, end, &sentence.text, speaker));
        }
    }

    if defaulted_speakers > 0 {
        warn!(
            "Stage 0: {} segments had no speaker, using {:?}",
            defaulted_speakers, config.default_speaker
        );
    }
    info!(
        "Stage 0: built {} atomic units from {} segments",
        units.len(),
        transcript.segments.len()
    );

    UnitArena::new(units)
}

/// Segment bounds with non-finite or inverted times repaired
fn segment_bounds(segment: &TranscriptSegment, seg_idx: usize) -> (f64, f64) {
    let start = if segment.start.is_finite() { segment.start.max(0.0) } else { 0.0 };
    let end = if segment.end.is_finite() { segment.end } else { start };
    if end < start {
        warn!(
            "Segment {} ends before it starts ({:.3} < {:.3}), clamping",
            seg_idx, end, start
        );
        return (start, start);
    }
    (start, end)
}

/// Share the segment span among sentences in proportion to word count
fn assign_proportional(sentences: &[String], seg_start: f64, seg_end: f64) -> Vec<TimedSentence> {
    let duration = seg_end - seg_start;
    let counts: Vec<usize> = sentences
        .iter()
        .map(|s| s.split_whitespace().count().max(1))
        .collect();
    let total: usize = counts.iter().sum();

    let mut timed = Vec::with_capacity(sentences.len());
    let mut consumed = 0usize;
    for (i, (sentence, count)) in sentences.iter().zip(&counts).enumerate() {
        let start = seg_start + duration * consumed as f64 / total as f64;
        consumed += count;
        // last sentence ends exactly on the segment boundary
        let end = if i + 1 == sentences.len() {
            seg_end
        } else {
            seg_start + duration * consumed as f64 / total as f64
        };
        timed.push(TimedSentence {
            text: sentence.clone(),
            start,
            end,
        });
    }
    timed
}

/// Word token with its normalized form
struct CleanWord {
    clean: String,
    start: f64,
    end: f64,
}

/// Match each sentence's words against the segment's word tokens in order.
///
/// A sentence whose words cannot all be found keeps its proportional slot,
/// moved forward so it never starts before the previous sentence ends.
fn assign_from_words(
    sentences: &[String],
    words: &[WordToken],
    seg_start: f64,
    seg_end: f64,
) -> Vec<TimedSentence> {
    let fallback = assign_proportional(sentences, seg_start, seg_end);

    let tokens: Vec<CleanWord> = words
        .iter()
        .filter_map(|w| {
            let clean = normalize_word(&w.word);
            if clean.is_empty() || !w.start.is_finite() || !w.end.is_finite() {
                return None;
            }
            Some(CleanWord {
                clean,
                start: w.start,
                end: w.end.max(w.start),
            })
        })
        .collect();

    if tokens.is_empty() {
        warn!("Segment word list has no usable tokens, interpolating");
        return fallback;
    }

    let mut cursor = 0usize;
    let mut prev_end = seg_start;
    let mut timed = Vec::with_capacity(sentences.len());

    for (sentence, slot) in sentences.iter().zip(fallback) {
        let sentence_words = normalized_words(sentence);
        let span = if sentence_words.is_empty() {
            None
        } else {
            match_sentence(&tokens, &sentence_words, cursor)
        };

        let (start, end) = match span {
            Some((start, end, next)) => {
                cursor = next;
                (start, end)
            }
            None => {
                debug!("Word timestamps did not cover {:?}, interpolating", sentence);
                (slot.start, slot.end)
            }
        };

        let start = start.clamp(seg_start, seg_end).max(prev_end);
        let end = end.clamp(seg_start, seg_end).max(start);
        prev_end = end;
        timed.push(TimedSentence {
            text: sentence.clone(),
            start,
            end,
        });
    }

    timed
}

/// Find every sentence word in order among the tokens from `cursor` on.
///
/// Returns the matched span and the cursor after the last matched token, or
/// `None` unless all words were found.
fn match_sentence(
    tokens: &[CleanWord],
    sentence_words: &[String],
    cursor: usize,
) -> Option<(f64, f64, usize)> {
    let mut matched = 0usize;
    let mut span: Option<(f64, f64)> = None;
    let mut next = cursor;

    for (i, token) in tokens.iter().enumerate().skip(cursor) {
        if words_match(&token.clean, &sentence_words[matched]) {
            span = Some(match span {
                Some((start, _)) => (start, token.end),
                None => (token.start, token.end),
            });
            matched += 1;
            next = i + 1;
            if matched == sentence_words.len() {
                break;
            }
        }
    }

    if matched < sentence_words.len() {
        return None;
    }
    span.map(|(start, end)| (start, end, next))
}

/// Tolerant comparison: equal, or one contains the other
fn words_match(token: &str, expected: &str) -> bool {
    token == expected || token.contains(expected) || expected.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str, start: f64, end: f64) -> WordToken {
        WordToken {
            word: w.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_empty_transcript_yields_no_units() {
        let arena = build_atomic_units(&Transcript::default(), &UnitConfig::default());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_segment_without_boundaries_is_one_unit() {
        let transcript = Transcript::new(vec![TranscriptSegment::new(2.0, 7.0, "just talking here")]);
        let arena = build_atomic_units(&transcript, &UnitConfig::default());

        assert_eq!(arena.len(), 1);
        let unit = arena.get(0).unwrap();
        assert_eq!(unit.start, 2.0);
        assert_eq!(unit.end, 7.0);
        assert_eq!(unit.speaker, "speaker_0");
        assert_eq!(unit.word_count, 3);
    }

    #[test]
    fn test_proportional_by_word_count() {
        let transcript = Transcript::new(vec![TranscriptSegment::new(
            0.0,
            10.0,
            "One two three four. Five six seven eight nine ten.",
        )]);
        let arena = build_atomic_units(&transcript, &UnitConfig::default());

        assert_eq!(arena.len(), 2);
        assert!((arena.get(0).unwrap().end - 4.0).abs() < 1e-9);
        assert!((arena.get(1).unwrap().start - 4.0).abs() < 1e-9);
        assert_eq!(arena.get(1).unwrap().end, 10.0);
    }

    #[test]
    fn test_word_timestamps_take_precedence() {
        let segment = TranscriptSegment::new(0.0, 10.0, "Hello there. How are you?").with_words(vec![
            word("hello", 0.5, 0.9),
            word("there.", 1.0, 1.4),
            word("How", 6.0, 6.2),
            word("are", 6.3, 6.5),
            word("you?", 6.6, 7.0),
        ]);
        let arena = build_atomic_units(&Transcript::new(vec![segment]), &UnitConfig::default());

        assert_eq!(arena.len(), 2);
        let first = arena.get(0).unwrap();
        assert_eq!((first.start, first.end), (0.5, 1.4));
        let second = arena.get(1).unwrap();
        assert_eq!((second.start, second.end), (6.0, 7.0));
    }

    #[test]
    fn test_unmatched_sentence_falls_back_to_slot() {
        let segment = TranscriptSegment::new(0.0, 4.0, "Alpha beta. Gamma delta.")
            .with_words(vec![word("alpha", 0.1, 0.5), word("beta", 0.6, 1.0)]);
        let arena = build_atomic_units(&Transcript::new(vec![segment]), &UnitConfig::default());

        let second = arena.get(1).unwrap();
        assert_eq!((second.start, second.end), (2.0, 4.0));
    }

    fn assert_monotone(arena: &UnitArena) {
        for pair in arena.as_slice().windows(2) {
            assert!(pair[1].start >= pair[0].start, "start decreased: {:?}", pair);
            assert!(pair[1].end >= pair[0].end, "end decreased: {:?}", pair);
        }
    }

    #[test]
    fn test_late_word_match_keeps_times_ordered() {
        let segment = TranscriptSegment::new(0.0, 9.0, "Alpha beta. Gamma delta. Omega end.")
            .with_words(vec![word("alpha", 0.1, 0.4), word("beta", 8.0, 8.5)]);
        let arena = build_atomic_units(&Transcript::new(vec![segment]), &UnitConfig::default());

        assert_eq!(arena.len(), 3);
        assert_monotone(&arena);
        let spans: Vec<(f64, f64)> = arena.iter().map(|u| (u.start, u.end)).collect();
        assert_eq!(spans, vec![(0.1, 8.5), (8.5, 8.5), (8.5, 9.0)]);
    }

    #[test]
    fn test_partial_word_match_uses_slot() {
        let segment = TranscriptSegment::new(0.0, 10.0, "Alpha beta gamma. Delta epsilon.")
            .with_words(vec![word("alpha", 0.1, 0.4), word("beta", 0.5, 0.8)]);
        let arena = build_atomic_units(&Transcript::new(vec![segment]), &UnitConfig::default());

        let spans: Vec<(f64, f64)> = arena.iter().map(|u| (u.start, u.end)).collect();
        assert_eq!(spans, vec![(0.0, 6.0), (6.0, 10.0)]);
        assert_monotone(&arena);
    }

    #[test]
    fn test_end_never_decreases_across_segments() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 20.0, "A long opening thought. Short."),
            TranscriptSegment::new(4.0, 6.0, "Overlapping reply here."),
            TranscriptSegment::new(21.0, 30.0, "Back to the host. And done."),
        ]);
        let arena = build_atomic_units(&transcript, &UnitConfig::default());

        assert_eq!(arena.len(), 5);
        assert_monotone(&arena);
    }

    #[test]
    fn test_speaker_default_and_explicit() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 1.0, "Hi.").with_speaker("host"),
            TranscriptSegment::new(1.0, 2.0, "Hello."),
        ]);
        let config = UnitConfig {
            default_speaker: "guest".to_string(),
        };
        let arena = build_atomic_units(&transcript, &config);

        assert_eq!(arena.get(0).unwrap().speaker, "host");
        assert_eq!(arena.get(1).unwrap().speaker, "guest");
    }

    #[test]
    fn test_ten_sentences_without_words_stay_in_segment() {
        let text = (0..10)
            .map(|i| format!("Sentence number {i} is here."))
            .collect::<Vec<_>>()
            .join(" ");
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 5.0, "Intro line."),
            TranscriptSegment::new(5.0, 35.0, text),
        ]);
        let arena = build_atomic_units(&transcript, &UnitConfig::default());

        assert_eq!(arena.len(), 11);
        let mut prev_start = f64::NEG_INFINITY;
        for unit in arena.iter().skip(1) {
            assert!(unit.start >= 5.0 && unit.end <= 35.0);
            assert!(unit.start < unit.end);
            assert!(unit.start >= prev_start);
            prev_start = unit.start;
        }
    }

    #[test]
    fn test_inverted_segment_is_clamped() {
        let transcript = Transcript::new(vec![TranscriptSegment::new(5.0, 3.0, "Odd timing.")]);
        let arena = build_atomic_units(&transcript, &UnitConfig::default());
        let unit = arena.get(0).unwrap();
        assert_eq!((unit.start, unit.end), (5.0, 5.0));
    }
}
