/// Configuration for the simplification engine
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum cosine similarity a vocabulary candidate needs to replace a token
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Configuration for loading stores and simplifying text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifierConfig {
    /// Inclusive lower bound on the best candidate's score
    pub similarity_threshold: f64,

    /// Number of workers per stage (defaults to available parallelism)
    pub worker_count: Option<usize>,

    /// Progress cadence while loading embeddings (in lines)
    pub embeddings_progress_interval: usize,

    /// Progress cadence while loading the vocabulary (in lines)
    pub vocabulary_progress_interval: usize,

    /// Progress cadence while simplifying text (in lines)
    pub line_progress_interval: usize,

    /// How many ranked candidates to log at debug level for each replacement
    pub candidate_log_limit: usize,

    /// Maximum number of cached token replacements
    pub cache_capacity: usize,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            worker_count: None,
            embeddings_progress_interval: 100,
            vocabulary_progress_interval: 100,
            line_progress_interval: 10,
            candidate_log_limit: 5,
            cache_capacity: 10000,
        }
    }
}

impl SimplifierConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| crate::SimplifierError::from_read(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| crate::SimplifierError::ConfigError(e.to_string()))?;
        config
            .validate()
            .map_err(crate::SimplifierError::ConfigError)?;
        Ok(config)
    }

    /// Resolve the worker count, falling back to the number of available CPUs
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            ));
        }

        if self.worker_count == Some(0) {
            return Err("worker_count must be greater than 0".to_string());
        }

        if self.embeddings_progress_interval == 0
            || self.vocabulary_progress_interval == 0
            || self.line_progress_interval == 0
        {
            return Err("progress intervals must be greater than 0".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}
