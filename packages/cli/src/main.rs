//! Lexisimplify command-line tool
//!
//! Loads word embeddings and a simple-word vocabulary, then rewrites a text file
//! replacing every word outside the vocabulary with its nearest vocabulary word.
//!
//! # Usage
//!
//! ```bash
//! lexisimplify --embeddings ./word-embeddings.txt --vocabulary ./google-1000.txt \
//!     --input ./input.txt --output ./out.txt
//! ```
//!
//! # Configuration
//!
//! Settings are read from `--config <file.json>`, else from
//! `~/.lexisimplify/config.json` when it exists, else defaults apply.
//! `--workers` and `--threshold` override the file.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::MultiProgress;
use lexisimplify_engine::{
    ConcurrentLineProcessor, EmbeddingsStore, LineSimplifier, SimilarityEngine, SimplifierConfig,
    StageCancellation, StageOptions, VocabularySet, WorkerPool,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "lexisimplify")]
#[command(about = "Replace uncommon words with their nearest simple-vocabulary word")]
struct Args {
    /// Word embeddings file (`word, v1, v2, ...` per line)
    #[arg(long)]
    embeddings: PathBuf,

    /// Simple-word vocabulary file (one word per line)
    #[arg(long)]
    vocabulary: PathBuf,

    /// Text file to simplify
    #[arg(long)]
    input: PathBuf,

    /// Where to write the simplified text
    #[arg(long)]
    output: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker count per stage (defaults to available CPUs)
    #[arg(long)]
    workers: Option<usize>,

    /// Minimum similarity for a replacement
    #[arg(long)]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    tracing::info!("Configuration: {:?}", config);

    let cancel = StageCancellation::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, abandoning current stage");
            on_interrupt.cancel();
        }
    });

    let pool = WorkerPool::new(config.resolved_worker_count());
    let bars = MultiProgress::new();
    let stage = |label: &'static str, interval: usize| {
        StageOptions::new(pool)
            .with_progress(progress::stage_bar(&bars, label), interval)
            .with_cancellation(cancel.clone())
    };

    let embeddings_options = stage("embeddings", config.embeddings_progress_interval);
    let vocabulary_options = stage("vocabulary", config.vocabulary_progress_interval);
    let (embeddings, vocabulary) = tokio::try_join!(
        EmbeddingsStore::load(&args.embeddings, &embeddings_options),
        VocabularySet::load(&args.vocabulary, &vocabulary_options),
    )
    .context("Failed to load")?;

    let (embeddings, embeddings_report) = embeddings;
    let (vocabulary, vocabulary_report) = vocabulary;
    if !embeddings_report.failures.is_empty() {
        tracing::warn!(
            "{} of {} embedding lines could not be parsed",
            embeddings_report.failures.len(),
            embeddings_report.total_lines
        );
    }
    tracing::info!(
        "Loaded {} embeddings and {} vocabulary words",
        embeddings_report.loaded,
        vocabulary_report.loaded
    );

    let engine = SimilarityEngine::new(Arc::new(embeddings), Arc::new(vocabulary), &config)?;
    tracing::info!(
        "{} vocabulary words available as replacements",
        engine.candidate_count()
    );

    let processor = ConcurrentLineProcessor::new(
        Arc::new(LineSimplifier::new(engine)),
        stage("simplify", config.line_progress_interval),
    );
    let result = processor
        .simplify_file(&args.input, &args.output)
        .await
        .with_context(|| format!("Failed to simplify {:?}", args.input))?;

    if result.failures.is_empty() {
        tracing::info!(
            "✅ Text file simplified successfully: {} lines written to {:?}",
            result.lines.len(),
            args.output
        );
    } else {
        tracing::warn!(
            "Text file simplified with {} of {} lines left unchanged after errors",
            result.failures.len(),
            result.lines.len()
        );
    }

    Ok(())
}

/// Pick the config file, then apply command-line overrides
fn resolve_config(args: &Args) -> anyhow::Result<SimplifierConfig> {
    let mut config = match config_path(args.config.as_deref()) {
        Some(path) => {
            tracing::info!("Reading configuration from {:?}", path);
            SimplifierConfig::from_json_file(&path)?
        }
        None => SimplifierConfig::default(),
    };

    if let Some(workers) = args.workers {
        config.worker_count = Some(workers);
    }
    if let Some(threshold) = args.threshold {
        config.similarity_threshold = threshold;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = dirs::home_dir()?.join(".lexisimplify").join("config.json");
    default.exists().then_some(default)
}
