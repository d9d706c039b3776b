/// Word-vector store loaded from a flat `word, v1, v2, ...` text file
///
/// The store is built once by [`EmbeddingsStore::load`] and is read-only afterwards,
/// so it can be shared across workers behind an `Arc` without further locking.
///
/// Lines are parsed on the worker pool, then applied to the map in file order:
/// the first successfully parsed line fixes the store's dimension and a later
/// duplicate key replaces an earlier one.
use crate::error::{LineFailure, LineFailureKind, Result, SimplifierError};
use crate::pool::StageOptions;
use std::collections::HashMap;
use std::path::Path;

/// A word and its embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct WordVector {
    pub word: String,
    pub vector: Vec<f64>,
}

/// Summary of an embeddings load
#[derive(Debug, Clone, Default)]
pub struct EmbeddingsLoadReport {
    /// Distinct words in the store after the load
    pub loaded: usize,
    pub total_lines: usize,
    pub failures: Vec<LineFailure>,
}

/// Immutable mapping from lower-cased word to its vector
#[derive(Debug, Default)]
pub struct EmbeddingsStore {
    vectors: HashMap<String, WordVector>,
    dimension: Option<usize>,
}

impl EmbeddingsStore {
    /// Load embeddings from `path` using the stage's worker pool
    ///
    /// Missing or unreadable files fail the whole load. Lines that do not parse are
    /// skipped and returned in the report.
    pub async fn load(
        path: impl AsRef<Path>,
        options: &StageOptions,
    ) -> Result<(Self, EmbeddingsLoadReport)> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SimplifierError::from_read(path, e))?;

        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        let total_lines = lines.len();
        tracing::info!("Loading embeddings from {:?} ({} lines)", path, total_lines);

        let parsed = options
            .pool
            .run(
                "embeddings",
                lines,
                |line: String| parse_line(&line),
                options.counter(total_lines),
                &options.cancel,
            )
            .await?;

        let mut store = Self::default();
        let mut failures = Vec::new();
        for (index, unit) in parsed.into_iter().enumerate() {
            let line_number = index + 1;
            let kind = match unit {
                Ok(None) => continue,
                Ok(Some(Ok(entry))) => match store.insert(entry) {
                    Ok(()) => continue,
                    Err(kind) => kind,
                },
                Ok(Some(Err(kind))) => kind,
                Err(panic) => LineFailureKind::Internal(panic),
            };
            tracing::warn!("Skipping embeddings line {}: {}", line_number, kind);
            failures.push(LineFailure { line_number, kind });
        }

        let report = EmbeddingsLoadReport {
            loaded: store.len(),
            total_lines,
            failures,
        };
        tracing::info!(
            "Embeddings loaded: {} words, dimension {:?}, {} failed lines",
            report.loaded,
            store.dimension,
            report.failures.len()
        );

        Ok((store, report))
    }

    /// Build a store from in-memory pairs, enforcing a single dimension
    pub fn from_vectors<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let mut store = Self::default();
        for (word, vector) in entries {
            let entry = WordVector {
                word: word.as_ref().trim().to_lowercase(),
                vector,
            };
            if entry.word.is_empty() {
                return Err(SimplifierError::InvalidArgument(
                    "Word cannot be empty".to_string(),
                ));
            }
            if let Err(LineFailureKind::DimensionMismatch { expected, found }) = store.insert(entry)
            {
                return Err(SimplifierError::DimensionMismatch {
                    left: expected,
                    right: found,
                });
            }
        }
        Ok(store)
    }

    fn insert(&mut self, entry: WordVector) -> std::result::Result<(), LineFailureKind> {
        match self.dimension {
            Some(expected) if expected != entry.vector.len() => {
                return Err(LineFailureKind::DimensionMismatch {
                    expected,
                    found: entry.vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(entry.vector.len()),
        }
        self.vectors.insert(entry.word.clone(), entry);
        Ok(())
    }

    /// Get the vector for a word (case-insensitive)
    ///
    /// Returns `InvalidArgument` when `word` is empty or only whitespace.
    pub fn get(&self, word: &str) -> Result<Option<&[f64]>> {
        if word.trim().is_empty() {
            return Err(SimplifierError::InvalidArgument(
                "Word cannot be null or empty.".to_string(),
            ));
        }
        Ok(self.lookup(&word.to_lowercase()))
    }

    /// Lookup by an already-normalized key
    pub(crate) fn lookup(&self, key: &str) -> Option<&[f64]> {
        self.vectors.get(key).map(|entry| entry.vector.as_slice())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(&word.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Vector length shared by every entry, `None` while empty
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

/// Parse one embeddings line; blank lines yield `None`
fn parse_line(line: &str) -> Option<std::result::Result<WordVector, LineFailureKind>> {
    if line.trim().is_empty() {
        return None;
    }

    let Some((word, values)) = line.split_once(',') else {
        return Some(Err(LineFailureKind::MissingVector));
    };

    let word = word.trim();
    if word.is_empty() {
        return Some(Err(LineFailureKind::EmptyWord));
    }

    let mut vector = Vec::new();
    for (i, field) in values.split(',').enumerate() {
        let field = field.trim();
        match field.parse::<f64>() {
            Ok(value) if value.is_finite() => vector.push(value),
            _ => {
                return Some(Err(LineFailureKind::MalformedEmbeddingLine {
                    field: i + 1,
                    value: field.to_string(),
                }))
            }
        }
    }

    Some(Ok(WordVector {
        word: word.to_lowercase(),
        vector,
    }))
}
