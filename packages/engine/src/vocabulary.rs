//! Simple-word vocabulary
//!
//! The vocabulary keeps the words in their file order. That order breaks ties
//! between equally similar candidates, so it must survive the concurrent load:
//! lines are normalized on the worker pool and merged afterwards by line index.

use crate::error::{Result, SimplifierError};
use crate::pool::StageOptions;
use std::collections::HashSet;
use std::path::Path;

/// Summary of a vocabulary load
#[derive(Debug, Clone, Default)]
pub struct VocabularyLoadReport {
    pub loaded: usize,
    pub total_lines: usize,
    /// Repeated words after normalization; only the first occurrence is kept
    pub duplicates: usize,
}

/// Ordered set of normalized vocabulary words
#[derive(Debug, Default)]
pub struct VocabularySet {
    words: Vec<String>,
    index: HashSet<String>,
}

impl VocabularySet {
    /// Load one word per line from `path`, skipping blank lines
    pub async fn load(
        path: impl AsRef<Path>,
        options: &StageOptions,
    ) -> Result<(Self, VocabularyLoadReport)> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SimplifierError::from_read(path, e))?;

        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        let total_lines = lines.len();
        tracing::info!("Loading vocabulary from {:?} ({} lines)", path, total_lines);

        let normalized = options
            .pool
            .run(
                "vocabulary",
                lines,
                |line: String| normalize(&line),
                options.counter(total_lines),
                &options.cancel,
            )
            .await?;

        let mut vocabulary = Self::default();
        let mut duplicates = 0;
        for (index, unit) in normalized.into_iter().enumerate() {
            match unit {
                Ok(Some(word)) => {
                    if !vocabulary.push(word) {
                        duplicates += 1;
                    }
                }
                Ok(None) => {}
                Err(panic) => tracing::warn!("Skipping vocabulary line {}: {}", index + 1, panic),
            }
        }

        let report = VocabularyLoadReport {
            loaded: vocabulary.len(),
            total_lines,
            duplicates,
        };
        tracing::info!(
            "Vocabulary loaded: {} words ({} duplicates ignored)",
            report.loaded,
            report.duplicates
        );

        Ok((vocabulary, report))
    }

    /// Build a vocabulary from words in order, normalizing each
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        for word in words {
            if let Some(word) = normalize(word.as_ref()) {
                vocabulary.push(word);
            }
        }
        vocabulary
    }

    /// Append a normalized word; returns false if it was already present
    fn push(&mut self, word: String) -> bool {
        if self.index.insert(word.clone()) {
            self.words.push(word);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        match normalize(word) {
            Some(word) => self.index.contains(&word),
            None => false,
        }
    }

    /// Words in their original file order
    pub fn ordered_words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn normalize(word: &str) -> Option<String> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
