/// Cosine similarity and nearest-vocabulary-word search
///
/// Search is a brute-force scan over every vocabulary word that has an embedding.
/// Candidates with identical scores resolve to the one listed first in the
/// vocabulary file.
use crate::config::SimplifierConfig;
use crate::embedding::EmbeddingsStore;
use crate::error::{Result, SimplifierError};
use crate::vocabulary::VocabularySet;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Cosine of the angle between two vectors
///
/// Returns `Ok(None)` when either vector has zero norm (the angle is undefined).
/// Vectors of different lengths are a programming error and fail with
/// `DimensionMismatch`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<Option<f64>> {
    if a.len() != b.len() {
        return Err(SimplifierError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (&x, &y)| {
            (x.mul_add(y, dot), x.mul_add(x, na), y.mul_add(y, nb))
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return Ok(None);
    }
    Ok(Some(dot / denominator))
}

/// A scored vocabulary candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub word: &'a str,
    pub score: f64,
}

/// Ranks vocabulary words against query vectors
pub struct SimilarityEngine {
    embeddings: Arc<EmbeddingsStore>,
    vocabulary: Arc<VocabularySet>,
    /// Vocabulary words that have an embedding, in vocabulary order
    candidates: Vec<String>,
    threshold: f64,
    candidate_log_limit: usize,
    /// Clean word -> chosen replacement (`None` keeps the token)
    cache: Mutex<LruCache<String, Option<String>>>,
}

impl SimilarityEngine {
    /// Create an engine over loaded stores
    ///
    /// Refuses to build when either store is empty, since every token would be
    /// passed through unchanged.
    pub fn new(
        embeddings: Arc<EmbeddingsStore>,
        vocabulary: Arc<VocabularySet>,
        config: &SimplifierConfig,
    ) -> Result<Self> {
        config.validate().map_err(SimplifierError::ConfigError)?;

        if embeddings.is_empty() {
            return Err(SimplifierError::MissingPrecondition(
                "Embeddings file must be loaded before execution".to_string(),
            ));
        }
        if vocabulary.is_empty() {
            return Err(SimplifierError::MissingPrecondition(
                "Vocabulary file must be loaded before execution".to_string(),
            ));
        }

        let candidates: Vec<String> = vocabulary
            .ordered_words()
            .iter()
            .filter(|word| embeddings.lookup(word).is_some())
            .cloned()
            .collect();
        if candidates.is_empty() {
            tracing::warn!("No vocabulary word has an embedding; text will pass through unchanged");
        }

        let cache_capacity = NonZeroUsize::new(config.cache_capacity)
            .ok_or_else(|| SimplifierError::ConfigError("cache_capacity must be > 0".to_string()))?;

        Ok(Self {
            embeddings,
            vocabulary,
            candidates,
            threshold: config.similarity_threshold,
            candidate_log_limit: config.candidate_log_limit,
            cache: Mutex::new(LruCache::new(cache_capacity)),
        })
    }

    /// Replace `token` with its nearest vocabulary word, or return it unchanged
    ///
    /// The token is reduced to its ASCII letters, lower-cased. It is kept as-is when
    /// that form is empty, already in the vocabulary, has no embedding, or no
    /// candidate scores at least the threshold. A replacement drops any punctuation
    /// and is capitalized only when the token started with an upper-case letter.
    pub fn find_nearest_vocab_word(&self, token: &str) -> Result<String> {
        let clean_word = clean(token);
        if clean_word.is_empty() || self.vocabulary.contains(&clean_word) {
            return Ok(token.to_string());
        }

        let replacement = match self.cached(&clean_word) {
            Some(hit) => hit,
            None => {
                let Some(query) = self.embeddings.lookup(&clean_word) else {
                    return Ok(token.to_string());
                };
                let replacement = self.choose_replacement(&clean_word, query)?;
                self.cache
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .put(clean_word, replacement.clone());
                replacement
            }
        };

        Ok(match replacement {
            Some(word) => recase(token, &word),
            None => token.to_string(),
        })
    }

    fn cached(&self, clean_word: &str) -> Option<Option<String>> {
        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(clean_word)
            .cloned()
    }

    fn choose_replacement(&self, clean_word: &str, query: &[f64]) -> Result<Option<String>> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let top = self.rank_candidates(query, self.candidate_log_limit)?;
            tracing::debug!("Top {} similar words for '{}': {:?}", top.len(), clean_word, top);
        }

        let Some(best) = self.best_candidate(query)? else {
            return Ok(None);
        };
        if best.score < self.threshold {
            tracing::trace!(
                "Best match '{}' for '{}' scored {:.4}, below threshold",
                best.word,
                clean_word,
                best.score
            );
            return Ok(None);
        }
        Ok(Some(best.word.to_string()))
    }

    /// Highest-scoring candidate; the earliest vocabulary entry wins ties
    pub fn best_candidate(&self, query: &[f64]) -> Result<Option<Candidate<'_>>> {
        let mut best: Option<Candidate<'_>> = None;
        for candidate in self.scored(query)? {
            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        Ok(best)
    }

    /// Up to `limit` candidates, best first, ties in vocabulary order
    pub fn rank_candidates(&self, query: &[f64], limit: usize) -> Result<Vec<Candidate<'_>>> {
        let mut ranked = self.scored(query)?;
        // Stable sort keeps vocabulary order among equal scores
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Candidates with a defined score, in vocabulary order
    fn scored(&self, query: &[f64]) -> Result<Vec<Candidate<'_>>> {
        let mut scored = Vec::with_capacity(self.candidates.len());
        for word in &self.candidates {
            let Some(vector) = self.embeddings.lookup(word) else {
                continue;
            };
            match cosine_similarity(query, vector)? {
                Some(score) if !score.is_nan() => scored.push(Candidate { word, score }),
                _ => {}
            }
        }
        Ok(scored)
    }

    /// Number of vocabulary words that can be offered as replacements
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Get cache statistics (size, capacity)
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        (cache.len(), cache.cap().get())
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}

/// Keep ASCII letters only, lower-cased
fn clean(token: &str) -> String {
    token
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Capitalize `word`'s first character if `token` starts upper-case
fn recase(token: &str, word: &str) -> String {
    let starts_upper = token.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
