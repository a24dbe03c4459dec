//! Plain-text helpers shared by retrieval, SEO and brand voice checks

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "even", "few", "for", "from", "further", "get", "got", "had", "has",
        "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "know", "like", "me", "more", "most", "my",
        "no", "nor", "not", "now", "of", "off", "on", "once", "one", "only", "or", "other",
        "our", "ours", "out", "over", "own", "really", "right", "same", "she", "should", "so",
        "some", "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
        "these", "they", "thing", "things", "think", "this", "those", "through", "to", "too",
        "um", "uh", "under", "until", "up", "very", "was", "we", "well", "were", "what",
        "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
        "yeah", "you", "your", "yours", "going", "gonna", "kind", "lot", "mean", "okay",
        "actually", "say", "said", "see", "want", "way", "make", "much", "many", "there's",
        "it's", "that's", "i'm", "you're", "we're", "don't", "can't",
    ]
    .iter()
    .copied()
    .collect();
}

/// Lower-case word tokens (letters, digits and inner apostrophes)
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Word tokens without stop words and very short words
pub fn terms(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split prose into sentences on terminal punctuation
pub fn sentences(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let terminal = matches!(c, '.' | '!' | '?');
        let at_boundary = chars.get(i + 1).map(|n| n.is_whitespace()).unwrap_or(true);
        if terminal && at_boundary {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                result.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        result.push(tail.to_string());
    }
    result
}

/// Heuristic English syllable count
pub fn syllables(word: &str) -> usize {
    let word: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0;
    let mut previous_vowel = false;
    for c in word.chars() {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }
    if word.ends_with('e') && !word.ends_with("le") && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Term frequencies, most frequent first (ties alphabetical)
pub fn top_terms(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for term in terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Byte ranges of whole-word, case-insensitive matches of `phrase`
pub fn find_phrase(text: &str, phrase: &str) -> Vec<(usize, usize)> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Vec::new();
    }
    let needle = phrase.to_lowercase();

    // Lower-casing may change byte lengths, so every lowered byte keeps the
    // byte range of the character it came from
    let mut haystack = String::with_capacity(text.len());
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    for (at, c) in text.char_indices() {
        let span = (at, at + c.len_utf8());
        for lower in c.to_lowercase() {
            haystack.push(lower);
            origin.extend(std::iter::repeat(span).take(lower.len_utf8()));
        }
    }

    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let starts_char = |i: usize| i == 0 || origin[i - 1] != origin[i];
    let ends_char = |i: usize| i == origin.len() || origin[i - 1] != origin[i];
    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(&needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().map(|c| !is_word(c)).unwrap_or(true);
        let after_ok = haystack[end..].chars().next().map(|c| !is_word(c)).unwrap_or(true);
        if before_ok && after_ok && starts_char(start) && ends_char(end) {
            matches.push((origin[start].0, origin[end - 1].1));
            from = end;
        } else {
            from = start + haystack[start..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        }
    }
    matches
}

/// Replace whole-word matches of `phrase` with `replacement`
pub fn replace_phrase(text: &str, phrase: &str, replacement: &str) -> String {
    let matches = find_phrase(text, phrase);
    if matches.is_empty() {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in matches {
        result.push_str(&text[last..start]);
        result.push_str(replacement);
        last = end;
    }
    result.push_str(&text[last..]);
    result
}

/// Cut text to at most `max_chars`, preferring a word boundary, adding an ellipsis
pub fn truncate_words(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(3);
    let cut: String = text.chars().take(budget).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > budget / 2 => cut[..pos].to_string(),
        _ => cut,
    };
    format!("{}...", trimmed.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_drop_stop_words() {
        assert_eq!(
            terms("The Rust compiler and the borrow checker, 2024!"),
            vec!["rust", "compiler", "borrow", "checker"]
        );
    }

    #[test]
    fn test_sentences() {
        let parts = sentences("What is Rust? It is a language. Version 1.75 shipped!");
        assert_eq!(
            parts,
            vec!["What is Rust?", "It is a language.", "Version 1.75 shipped!"]
        );
    }

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("cat"), 1);
        assert_eq!(syllables("water"), 2);
        assert_eq!(syllables("make"), 1);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("information"), 4);
    }

    #[test]
    fn test_find_phrase_whole_words_only() {
        let text = "Synergy is key. synergyx is not. Real SYNERGY!";
        assert_eq!(find_phrase(text, "synergy").len(), 2);
        assert_eq!(find_phrase(text, "key").len(), 1);
        assert!(find_phrase(text, "").is_empty());
    }

    #[test]
    fn test_replace_phrase_keeps_surroundings() {
        assert_eq!(
            replace_phrase("Leverage the synergy, synergy!", "synergy", "[redacted]"),
            "Leverage the [redacted], [redacted]!"
        );
    }

    #[test]
    fn test_find_phrase_when_lowercasing_changes_lengths() {
        assert_eq!(find_phrase("Live from İstanbul: we love synergy", "synergy").len(), 1);
        assert_eq!(
            replace_phrase("İstanbul loves synergy", "synergy", "[redacted]"),
            "İstanbul loves [redacted]"
        );

        let text = "Die GROẞE Synergy";
        let matches = find_phrase(text, "große");
        assert_eq!(matches.len(), 1);
        let (start, end) = matches[0];
        assert_eq!(&text[start..end], "GROẞE");
        assert_eq!(replace_phrase(text, "synergy", "x"), "Die GROẞE x");
    }

    #[test]
    fn test_truncate_words() {
        let text = "one two three four five six";
        let cut = truncate_words(text, 15);
        assert!(cut.chars().count() <= 15);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_words("short", 15), "short");
    }

    #[test]
    fn test_top_terms_ranking() {
        let ranked = top_terms("rust rust async async async tokio", 2);
        assert_eq!(ranked, vec![("async".to_string(), 3), ("rust".to_string(), 2)]);
    }
}
