//! Term-frequency / inverse-document-frequency vectorizer.
//!
//! Tokens are runs of two or more word characters, lower-cased. The
//! vocabulary keeps the `max_features` terms with the highest total count
//! across the corpus (ties broken alphabetically) and is then ordered
//! alphabetically, so column order never depends on input order.
//!
//! Scores use raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`,
//! and L2 row normalisation.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Split text into lower-cased tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Unfitted vectorizer configuration.
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    max_features: usize,
}

/// Vocabulary and idf weights learned from one corpus.
#[derive(Debug, Clone)]
pub struct FittedTfidf {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Learn vocabulary and idf from a corpus.
    ///
    /// An empty corpus, or one without any token, yields an empty vocabulary.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> FittedTfidf {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            let tokens = tokenize(doc.as_ref());
            let mut seen: Vec<&str> = Vec::with_capacity(tokens.len());
            for token in &tokens {
                *term_counts.entry(token.clone()).or_insert(0) += 1;
                if !seen.contains(&token.as_str()) {
                    seen.push(token);
                    *doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let n_docs = corpus.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        FittedTfidf {
            vocabulary,
            index,
            idf,
        }
    }

    /// Fit on a corpus and transform every document of it.
    pub fn fit_transform<S: AsRef<str>>(&self, corpus: &[S]) -> (FittedTfidf, Vec<Vec<f64>>) {
        let fitted = self.fit(corpus);
        let rows = corpus.iter().map(|doc| fitted.transform(doc.as_ref())).collect();
        (fitted, rows)
    }
}

impl FittedTfidf {
    /// Terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Dense TF-IDF row for one document. Out-of-vocabulary tokens are ignored;
    /// a document without known terms maps to the zero vector.
    pub fn transform(&self, doc: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in tokenize(doc) {
            if let Some(&col) = self.index.get(&token) {
                row[col] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }
}
