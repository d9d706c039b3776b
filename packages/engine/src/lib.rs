//! Lexical simplification engine
//!
//! Replaces words outside a fixed "simple" vocabulary with the most similar
//! vocabulary word, using precomputed word embeddings and cosine similarity.
//!
//! # Pipeline
//!
//! 1. [`EmbeddingsStore::load`] and [`VocabularySet::load`] parse their files on a
//!    bounded [`WorkerPool`]; both stores are read-only once loaded.
//! 2. [`SimilarityEngine`] ranks vocabulary words against a token's vector.
//! 3. [`LineSimplifier`] maps every whitespace-separated token of a line.
//! 4. [`ConcurrentLineProcessor`] simplifies all lines on the pool and returns them
//!    in input order.
//!
//! # Example
//!
//! ```ignore
//! use lexisimplify_engine::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SimplifierConfig::default();
//!     let options = StageOptions::new(WorkerPool::new(config.resolved_worker_count()));
//!
//!     let (embeddings, _) = EmbeddingsStore::load("./word-embeddings.txt", &options).await?;
//!     let (vocabulary, _) = VocabularySet::load("./google-1000.txt", &options).await?;
//!
//!     let engine = SimilarityEngine::new(Arc::new(embeddings), Arc::new(vocabulary), &config)?;
//!     let processor = ConcurrentLineProcessor::new(Arc::new(LineSimplifier::new(engine)), options);
//!     processor.simplify_file("./input.txt", "./out.txt").await?;
//!     Ok(())
//! }
//! ```
pub mod cancel;
pub mod config;
pub mod embedding;
pub mod error;
pub mod pool;
pub mod processor;
pub mod progress;
pub mod similarity;
pub mod simplifier;
pub mod vocabulary;

// Re-export main types
pub use cancel::StageCancellation;
pub use config::{SimplifierConfig, DEFAULT_SIMILARITY_THRESHOLD};
pub use embedding::{EmbeddingsLoadReport, EmbeddingsStore, WordVector};
pub use error::{LineFailure, LineFailureKind, Result, SimplifierError};
pub use pool::{StageOptions, UnitResult, WorkerPool};
pub use processor::{
    ConcurrentLineProcessor, FailedLine, LineOutcome, LineTask, SimplificationResult,
};
pub use progress::{NoProgress, ProgressReporter};
pub use similarity::{cosine_similarity, Candidate, SimilarityEngine};
pub use simplifier::LineSimplifier;
pub use vocabulary::{VocabularyLoadReport, VocabularySet};
