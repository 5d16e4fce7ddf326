//! Keyword extraction for answer comparison.
//!
//! Text is compared on a bag of keywords rather than verbatim. Latin-script
//! words are lowercased and stripped of accents; CJK text, which has no word
//! separators, is split into overlapping character bigrams.

use std::collections::BTreeSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Words carrying no meaning on their own.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "each", "for", "from", "had", "has", "have",
    "how", "if", "in", "into", "is", "it", "its", "may", "me", "more", "most", "my", "no", "not",
    "of", "on", "or", "other", "our", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "to", "up", "use", "used",
    "using", "was", "we", "were", "what", "when", "which", "while", "who", "why", "will", "with",
    "would", "you", "your",
];

/// Extract the keyword set of a piece of text.
///
/// - Lowercase, NFD-decompose and drop combining marks (`"Café"` → `"cafe"`)
/// - Latin/other words: kept when at least 2 characters long and not a stop word
/// - CJK runs: every pair of adjacent characters, or the character itself when
///   the run is a single character
///
/// The result is ordered, so callers get deterministic keyword listings.
pub fn keywords(text: &str) -> BTreeSet<String> {
    let normalized: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = BTreeSet::new();
    let mut word = String::new();
    let mut run: Vec<char> = Vec::new();

    for c in normalized.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut out);
            run.push(c);
        } else if c.is_alphanumeric() {
            flush_run(&mut run, &mut out);
            word.push(c);
        } else {
            flush_word(&mut word, &mut out);
            flush_run(&mut run, &mut out);
        }
    }
    flush_word(&mut word, &mut out);
    flush_run(&mut run, &mut out);

    out
}

fn flush_word(word: &mut String, out: &mut BTreeSet<String>) {
    if word.chars().count() >= 2 && !STOP_WORDS.contains(&word.as_str()) {
        out.insert(word.clone());
    }
    word.clear();
}

fn flush_run(run: &mut Vec<char>, out: &mut BTreeSet<String>) {
    match run.len() {
        0 => {}
        1 => {
            out.insert(run[0].to_string());
        }
        _ => {
            for pair in run.windows(2) {
                out.insert(pair.iter().collect());
            }
        }
    }
    run.clear();
}

/// Han ideographs and Japanese kana.
const fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF
    )
}
