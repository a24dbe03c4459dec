use std::collections::{HashMap, HashSet};

use crate::models::TranscriptSegment;
use crate::services::text;

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

/// Retrievable passage of a transcript; timings come from its segment
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub segment_id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub speaker: Option<String>,
    pub confidence: f64,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
}

/// Split text into word-aligned windows of at most `size` chars,
/// each starting with up to `overlap` chars from the end of the previous one
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let joined_len = |ws: &[&str]| -> usize {
        ws.iter().map(|w| w.chars().count()).sum::<usize>() + ws.len().saturating_sub(1)
    };

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in words {
        let mut candidate = current.clone();
        candidate.push(word);
        if !current.is_empty() && joined_len(&candidate) > size {
            chunks.push(current.join(" "));
            // Carry the tail of the finished chunk over
            let mut tail: Vec<&str> = Vec::new();
            for w in current.iter().rev() {
                let mut next = vec![*w];
                next.extend(tail.iter());
                if joined_len(&next) + 1 + word.chars().count() > overlap.min(size) {
                    break;
                }
                tail = next;
            }
            current = tail;
        }
        current.push(word);
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Split every segment into chunks that keep the segment's timing and speaker
pub fn chunk_segments(segments: &[TranscriptSegment]) -> Vec<Chunk> {
    segments
        .iter()
        .flat_map(|segment| {
            split_text(&segment.text, CHUNK_SIZE, CHUNK_OVERLAP)
                .into_iter()
                .map(move |text| Chunk {
                    text,
                    segment_id: segment.id.clone(),
                    start_ms: segment.start_ms,
                    end_ms: segment.end_ms,
                    speaker: segment.speaker.clone(),
                    confidence: segment.confidence,
                    topic: segment.topic.clone(),
                })
        })
        .collect()
}

type SparseVector = HashMap<String, f64>;

/// Lexical TF-IDF index over transcript chunks
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<SparseVector>,
    idf: HashMap<String, f64>,
}

impl SegmentIndex {
    pub fn build(segments: &[TranscriptSegment]) -> Self {
        let chunks = chunk_segments(segments);
        let term_counts: Vec<HashMap<String, f64>> = chunks
            .iter()
            .map(|chunk| {
                let mut counts = HashMap::new();
                for term in text::terms(&chunk.text) {
                    *counts.entry(term).or_insert(0.0) += 1.0;
                }
                counts
            })
            .collect();

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let n = chunks.len() as f64;
        let idf: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(term, df)| (term, ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = term_counts
            .into_iter()
            .map(|counts| weigh(counts, &idf))
            .collect();

        Self { chunks, vectors, idf }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first.
    /// Returns `min(k, len)` results even when nothing matches; ties keep transcript order.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let mut counts = HashMap::new();
        for term in text::terms(query) {
            if self.idf.contains_key(&term) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }
        let query_vector = weigh(counts, &self.idf);

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine(&query_vector, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Distinct terms with the highest total weight across the index
    pub fn salient_terms(&self, limit: usize) -> Vec<String> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for vector in &self.vectors {
            for (term, weight) in vector {
                *totals.entry(term.as_str()).or_insert(0.0) += weight;
            }
        }
        let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let mut seen = HashSet::new();
        ranked
            .into_iter()
            .filter(|(term, _)| seen.insert(*term))
            .take(limit)
            .map(|(term, _)| term.to_string())
            .collect()
    }
}

fn weigh(counts: HashMap<String, f64>, idf: &HashMap<String, f64>) -> SparseVector {
    counts
        .into_iter()
        .map(|(term, tf)| {
            let weight = tf * idf.get(&term).copied().unwrap_or(0.0);
            (term, weight)
        })
        .collect()
}

fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, weight)| large.get(term).map(|other| weight * other))
        .sum();
    let norm = |v: &SparseVector| v.values().map(|w| w * w).sum::<f64>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            fixtures::segment("s0", "t1", 0, "Welcome everyone to the show."),
            fixtures::segment("s1", "t1", 1, "Database indexing makes queries fast."),
            fixtures::segment("s2", "t1", 2, "Hiring engineers is about culture and trust."),
            fixtures::segment("s3", "t1", 3, "A covering index avoids table lookups in the database."),
        ]
    }

    #[test]
    fn test_split_short_text_is_single_chunk() {
        assert_eq!(split_text("one two three", 1000, 200), vec!["one two three"]);
        assert!(split_text("   ", 1000, 200).is_empty());
    }

    #[test]
    fn test_split_long_text_with_overlap() {
        let text = (0..400).map(|i| format!("w{:03}", i)).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 1000, 200);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));

        let first_words: Vec<&str> = chunks[0].split(' ').collect();
        let second_words: Vec<&str> = chunks[1].split(' ').collect();
        let last_of_first = first_words[first_words.len() - 1];
        assert!(second_words.contains(&last_of_first));
        let overlap_len = second_words
            .iter()
            .take_while(|w| first_words.contains(w))
            .map(|w| w.len() + 1)
            .sum::<usize>();
        assert!(overlap_len <= 200);
    }

    #[test]
    fn test_chunks_keep_segment_timing() {
        let mut long = fixtures::segment("s9", "t1", 9, "");
        long.text = "word ".repeat(500);
        let chunks = chunk_segments(&[long.clone()]);
        assert!(chunks.len() > 1);
        assert!(chunks
            .iter()
            .all(|c| c.start_ms == long.start_ms && c.end_ms == long.end_ms && c.segment_id == "s9"));
    }

    #[test]
    fn test_search_ranks_relevant_chunks_first() {
        let index = SegmentIndex::build(&segments());
        let results = index.search("database index performance", 2);
        assert_eq!(results.len(), 2);
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.segment_id.as_str()).collect();
        assert!(ids.contains(&"s1") || ids.contains(&"s3"));
        assert_eq!(results[0].chunk.segment_id, "s3");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_always_returns_k() {
        let index = SegmentIndex::build(&segments());
        let results = index.search("quantum chromodynamics", 3);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score == 0.0));
        assert_eq!(results[0].chunk.segment_id, "s0");

        assert_eq!(index.search("database", 10).len(), 4);
        assert!(SegmentIndex::build(&[]).search("anything", 5).is_empty());
    }

    #[test]
    fn test_salient_terms() {
        let index = SegmentIndex::build(&segments());
        let terms = index.salient_terms(3);
        assert_eq!(terms.len(), 3);
        assert!(terms.contains(&"database".to_string()));
    }
}
