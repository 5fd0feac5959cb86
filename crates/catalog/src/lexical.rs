//! Lexical (keyword) retrieval over the catalog corpus.
//!
//! BM25 Okapi ranking over tokenized record text, built once per catalog
//! load and immutable afterwards. Complements vector similarity search.

use std::collections::HashMap;

const K1: f64 = 1.5;
const B: f64 = 0.75;
// Floor applied to negative idf values, as a fraction of the average idf.
const EPSILON: f64 = 0.25;

/// Lowercase word tokens (`\w+` runs: alphanumerics and underscore).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// BM25 (Okapi) index over a fixed document corpus.
///
/// Document identifiers are positions in the corpus passed to [`build`],
/// which by construction are catalog record ids.
///
/// [`build`]: Bm25Index::build
pub struct Bm25Index {
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    /// Tokenize each document and precompute term statistics.
    pub fn build<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut term_freqs: Vec<HashMap<String, usize>> = Vec::new();
        let mut doc_lens: Vec<usize> = Vec::new();
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let tokens = tokenize(doc.as_ref());
            doc_lens.push(tokens.len());
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let n = term_freqs.len();
        let avgdl = if n == 0 {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / n as f64
        };

        // Okapi idf; terms in more than half the corpus go negative and are
        // floored to EPSILON * average positive idf.
        let mut idf: HashMap<String, f64> = HashMap::new();
        let mut idf_sum = 0.0;
        let mut negative: Vec<String> = Vec::new();
        for (term, df) in &doc_freqs {
            let value = ((n as f64 - *df as f64 + 0.5) / (*df as f64 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }
        if !idf.is_empty() {
            let floor = EPSILON * (idf_sum / idf.len() as f64);
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            term_freqs,
            doc_lens,
            avgdl,
            idf,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_freqs.is_empty()
    }

    /// BM25 score of document `doc` against pre-tokenized query terms.
    fn score(&self, query_tokens: &[String], doc: usize) -> f64 {
        if self.avgdl == 0.0 {
            return 0.0;
        }
        let freqs = &self.term_freqs[doc];
        let dl = self.doc_lens[doc] as f64;
        let mut score = 0.0;
        for token in query_tokens {
            let tf = match freqs.get(token) {
                Some(tf) => *tf as f64,
                None => continue,
            };
            let idf = self.idf.get(token).copied().unwrap_or(0.0);
            score += idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * dl / self.avgdl));
        }
        score
    }

    /// Score every document against `text`; return the `k` highest-scoring
    /// ids in descending score order, ties broken by ascending id.
    pub fn search(&self, text: &str, k: usize) -> Vec<usize> {
        let query_tokens = tokenize(text);
        let mut scored: Vec<(usize, f64)> = (0..self.len())
            .map(|doc| (doc, self.score(&query_tokens, doc)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored.into_iter().map(|(doc, _)| doc).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Core Java (Entry-Level) v2.0"),
            vec!["core", "java", "entry", "level", "v2", "0"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn exact_term_ranks_first() {
        let index = Bm25Index::build([
            "Core Java programming test",
            "Python programming test",
            "Leadership and communication",
        ]);
        let results = index.search("Java developer", 3);
        assert_eq!(results[0], 0);
    }

    #[test]
    fn zero_score_ties_break_by_ascending_id() {
        let index = Bm25Index::build(["alpha", "beta", "gamma"]);
        // Query matches nothing: all scores are zero.
        assert_eq!(index.search("delta", 3), vec![0, 1, 2]);
    }

    #[test]
    fn search_is_deterministic() {
        let index = Bm25Index::build(["sales role", "sales manager", "excel skills"]);
        let a = index.search("sales with excel", 3);
        let b = index.search("sales with excel", 3);
        assert_eq!(a, b);
    }

    #[test]
    fn truncates_to_k() {
        let index = Bm25Index::build(["a b", "b c", "c d", "d e"]);
        assert_eq!(index.search("b c d", 2).len(), 2);
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let index = Bm25Index::build(std::iter::empty::<&str>());
        assert!(index.search("anything", 5).is_empty());
    }
}
