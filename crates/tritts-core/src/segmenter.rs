//! Splits long text into segments bounded by word counts, cutting at punctuation.
//!
//! Latin-script parts count whitespace-separated words. Parts containing CJK
//! ideographs count one word per character, since those scripts do not
//! separate words with spaces.

use crate::types::Segment;
use regex::Regex;
use std::sync::OnceLock;

const SENTENCE_ENDINGS: [&str; 6] = [".", "!", "?", "。", "！", "？"];

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[,.:;!?。，！？；：]").expect("punctuation pattern is a valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Mark(&'a str),
}

/// Alternating text and punctuation tokens. Text tokens may be empty.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in punctuation().find_iter(text) {
        tokens.push(Token::Text(&text[last..m.start()]));
        tokens.push(Token::Mark(m.as_str()));
        last = m.end();
    }
    tokens.push(Token::Text(&text[last..]));
    tokens
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Number of words in one punctuation-free part of text.
pub fn word_count(part: &str) -> usize {
    if part.chars().any(is_cjk) {
        part.chars().count()
    } else {
        part.split_whitespace().count()
    }
}

fn is_sentence_end(token: Option<&Token<'_>>) -> bool {
    matches!(token, Some(Token::Mark(m)) if SENTENCE_ENDINGS.contains(&m.trim()))
}

/// Split `text` into trimmed, non-empty segments.
///
/// A segment is closed early when the next part would exceed `max_words`,
/// but only once it holds at least `min_words`. It is also closed at a
/// sentence-ending mark once it reaches `min_words`. A single part longer
/// than `max_words` is never broken up.
pub fn split_text(text: &str, min_words: usize, max_words: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let mut segments = Vec::new();
    // Each part carries its trailing punctuation
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0usize;

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Mark(mark) => {
                if let Some(last) = current.last_mut() {
                    last.push_str(mark.trim());
                }
            }
            Token::Text(raw) => {
                let part = raw.trim();
                if !part.is_empty() {
                    let words = word_count(part);
                    if current_words > 0
                        && current_words + words > max_words
                        && current_words >= min_words
                    {
                        segments.push(current.join(" "));
                        current = vec![part.to_string()];
                        current_words = words;
                    } else {
                        current.push(part.to_string());
                        current_words += words;

                        if current_words >= min_words && is_sentence_end(tokens.get(i + 1)) {
                            if let (Some(Token::Mark(mark)), Some(last)) =
                                (tokens.get(i + 1), current.last_mut())
                            {
                                last.push_str(mark.trim());
                            }
                            segments.push(current.join(" "));
                            current.clear();
                            current_words = 0;
                            i += 1;
                        }
                    }
                }
            }
        }
        i += 1;
    }

    if !current.is_empty() {
        segments.push(current.join(" "));
    }

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// [`split_text`] with contiguous indices attached in text order.
pub fn segment_text(text: &str, min_words: usize, max_words: usize) -> Vec<Segment> {
    split_text(text, min_words, max_words)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment { index, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_without_marks(segment: &str) -> usize {
        tokenize(segment)
            .into_iter()
            .map(|t| match t {
                Token::Text(part) => word_count(part.trim()),
                Token::Mark(_) => 0,
            })
            .sum()
    }

    fn letters(text: &str) -> String {
        text.chars().filter(|c| c.is_alphanumeric()).collect()
    }

    #[test]
    fn test_tokenize_alternates_text_and_marks() {
        let tokens = tokenize("a, b.");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Mark(","),
                Token::Text(" b"),
                Token::Mark("."),
                Token::Text(""),
            ]
        );
    }

    #[test]
    fn test_word_count_latin_and_cjk() {
        assert_eq!(word_count("hello big world"), 3);
        assert_eq!(word_count("你好世界"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_split_example_respects_bounds() {
        let text = "Hello world. This is a test of segmentation, with several clauses! And one more sentence?";
        let segments = split_text(text, 3, 8);
        assert_eq!(
            segments,
            vec![
                "Hello world. This is a test of segmentation,",
                "with several clauses! And one more sentence?",
            ]
        );
        for seg in &segments {
            let words = words_without_marks(seg);
            assert!((3..=8).contains(&words), "{seg:?} has {words} words");
        }
    }

    #[test]
    fn test_split_cjk_counts_characters() {
        let segments = split_text("你好世界。今天天气很好，我们去公园吧！", 3, 8);
        assert_eq!(
            segments,
            vec!["你好世界。", "今天天气很好，", "我们去公园吧！"]
        );
    }

    #[test]
    fn test_split_oversized_part_is_kept_whole() {
        let text = "one two three four five six seven eight nine ten";
        let segments = split_text(text, 2, 3);
        assert_eq!(segments, vec![text.to_string()]);
    }

    #[test]
    fn test_split_short_sentences_merge_until_min_words() {
        let segments = split_text("Hi. Yes. Ok. Fine.", 3, 10);
        assert_eq!(segments, vec!["Hi. Yes. Ok.", "Fine."]);
    }

    #[test]
    fn test_split_empty_and_whitespace() {
        assert!(split_text("", 1, 5).is_empty());
        assert!(split_text("   \n\t ", 1, 5).is_empty());
        assert!(split_text(" , . ! ", 1, 5).is_empty());
    }

    #[test]
    fn test_split_no_empty_segments_and_content_preserved() {
        let text = "The quick brown fox jumps over the lazy dog. It barked; the fox ran: far, far away! \
                    Did it come back? Nobody knows, but the story goes on and on and on without end.";
        let segments = split_text(text, 4, 9);
        assert!(segments.iter().all(|s| !s.is_empty()));
        assert_eq!(letters(&segments.concat()), letters(text));
    }

    #[test]
    fn test_split_closes_only_after_min_words() {
        let text = "Alpha beta gamma, delta epsilon. Zeta eta theta iota kappa, lambda mu! \
                    Nu xi omicron pi, rho sigma tau upsilon; phi chi psi omega.";
        let min_words = 4;
        let segments = split_text(text, min_words, 6);
        assert!(segments.len() > 1);
        for seg in &segments[..segments.len() - 1] {
            assert!(
                words_without_marks(seg) >= min_words,
                "segment {seg:?} closed below min_words"
            );
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = "One two three. Four five six seven, eight nine. Ten!";
        assert_eq!(split_text(text, 2, 5), split_text(text, 2, 5));
    }

    #[test]
    fn test_segment_text_indices_are_contiguous() {
        let segments = segment_text("A b c. D e f. G h i.", 3, 3);
        let indices: Vec<_> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(segments[1].text, "D e f.");
    }

    #[test]
    fn test_punctuation_attaches_to_preceding_word() {
        let segments = split_text("Well, I think so; maybe not: who knows? Fine.", 2, 20);
        assert_eq!(segments, vec!["Well, I think so; maybe not: who knows?", "Fine."]);
        assert!(segments.iter().all(|s| !s.contains(" ,") && !s.contains(" .")));
    }
}
