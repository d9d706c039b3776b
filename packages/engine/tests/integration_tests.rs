//! Integration tests for loading, similarity search and file simplification
//!
//! Fixtures are written to temporary directories, so these tests need no
//! external data files.

use anyhow::Result;
use lexisimplify_engine::{
    ConcurrentLineProcessor, EmbeddingsStore, LineFailureKind, LineSimplifier, SimilarityEngine,
    SimplifierConfig, SimplifierError, StageCancellation, StageOptions, VocabularySet, WorkerPool,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test helper: write `contents` to `name` inside `dir`
fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Test helper: progress reporter that records every update
fn recording_options(
    workers: usize,
    interval: usize,
) -> (StageOptions, Arc<Mutex<Vec<(usize, usize)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let options = StageOptions::new(WorkerPool::new(workers)).with_progress(
        Arc::new(move |done: usize, total: usize| sink.lock().unwrap().push((done, total))),
        interval,
    );
    (options, calls)
}

const EXAMPLE_EMBEDDINGS: &str = "cat, 1.0, 0.0\ndog, 0.9, 0.1\nphone, 0.0, 1.0\n";
const EXAMPLE_VOCABULARY: &str = "dog\nphone\n";

/// Test helper: processor over the cat/dog/phone example stores
async fn example_processor(dir: &TempDir) -> Result<ConcurrentLineProcessor> {
    let embeddings_path = write_fixture(dir, "embeddings.txt", EXAMPLE_EMBEDDINGS)?;
    let vocabulary_path = write_fixture(dir, "vocabulary.txt", EXAMPLE_VOCABULARY)?;
    let options = StageOptions::new(WorkerPool::new(4));

    let (embeddings, _) = EmbeddingsStore::load(&embeddings_path, &options).await?;
    let (vocabulary, _) = VocabularySet::load(&vocabulary_path, &options).await?;
    let engine = SimilarityEngine::new(
        Arc::new(embeddings),
        Arc::new(vocabulary),
        &SimplifierConfig::default(),
    )?;

    Ok(ConcurrentLineProcessor::new(
        Arc::new(LineSimplifier::new(engine)),
        options,
    ))
}

// =========================================================================
// Embeddings Load Tests
// =========================================================================

#[tokio::test]
async fn test_embeddings_load_skips_bad_lines() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(
        &dir,
        "embeddings.txt",
        "Cat, 1.0, 0.0\n\
         broken, 0.5, oops\n\
         \n\
         short, 1.0\n\
         dog,0.9,0.1\n\
         cat, 0.0, 1.0\n",
    )?;

    let (store, report) = EmbeddingsStore::load(&path, &StageOptions::new(WorkerPool::new(3))).await?;

    assert_eq!(report.total_lines, 6);
    assert_eq!(report.loaded, 2);
    assert_eq!(store.len(), 2);
    assert_eq!(store.dimension(), Some(2));

    // Later duplicate wins, in file order
    assert_eq!(store.get("CAT")?, Some(&[0.0, 1.0][..]));
    assert_eq!(store.get("dog")?, Some(&[0.9, 0.1][..]));
    assert_eq!(store.get("broken")?, None);

    let failed_lines: Vec<usize> = report.failures.iter().map(|f| f.line_number).collect();
    assert_eq!(failed_lines, vec![2, 4]);
    assert!(matches!(
        report.failures[0].kind,
        LineFailureKind::MalformedEmbeddingLine { field: 2, .. }
    ));
    assert_eq!(
        report.failures[1].kind,
        LineFailureKind::DimensionMismatch {
            expected: 2,
            found: 1
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_embeddings_progress_cadence() -> Result<()> {
    let dir = TempDir::new()?;
    let contents: String = (0..250).map(|i| format!("word{}, {}, 1.0\n", i, i)).collect();
    let path = write_fixture(&dir, "embeddings.txt", &contents)?;
    let (options, calls) = recording_options(4, 100);

    let (store, _) = EmbeddingsStore::load(&path, &options).await?;
    assert_eq!(store.len(), 250);

    let calls = calls.lock().unwrap().clone();
    // Counter updates race between workers, but the completion counts are exact
    let mut completed: Vec<usize> = calls.iter().map(|(done, _)| *done).collect();
    completed.sort_unstable();
    assert_eq!(completed, vec![100, 200, 250]);
    assert!(calls.iter().all(|(_, total)| *total == 250));
    Ok(())
}

#[tokio::test]
async fn test_missing_file_is_fatal() -> Result<()> {
    let dir = TempDir::new()?;
    let options = StageOptions::new(WorkerPool::new(2));

    let result = EmbeddingsStore::load(dir.path().join("nope.txt"), &options).await;
    assert!(matches!(result, Err(SimplifierError::FileNotFound { .. })));

    let result = VocabularySet::load(dir.path().join("nope.txt"), &options).await;
    assert!(matches!(result, Err(SimplifierError::FileNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_is_fatal() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("binary.txt");
    std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3])?;

    let result = EmbeddingsStore::load(&path, &StageOptions::new(WorkerPool::new(2))).await;
    assert!(matches!(result, Err(SimplifierError::FileUnreadable { .. })));
    Ok(())
}

// =========================================================================
// Vocabulary Load Tests
// =========================================================================

#[tokio::test]
async fn test_vocabulary_preserves_file_order() -> Result<()> {
    let dir = TempDir::new()?;
    let words: Vec<String> = (0..500).map(|i| format!("Word{}", 499 - i)).collect();
    let contents = format!("\n  {}\n\nword499\n", words.join("\n"));
    let path = write_fixture(&dir, "vocabulary.txt", &contents)?;

    let (vocabulary, report) = VocabularySet::load(&path, &StageOptions::new(WorkerPool::new(8))).await?;

    assert_eq!(report.loaded, 500);
    assert_eq!(report.duplicates, 1);
    let expected: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    assert_eq!(vocabulary.ordered_words(), expected.as_slice());
    assert!(vocabulary.contains("word0"));
    Ok(())
}

// =========================================================================
// End-to-end Simplification Tests
// =========================================================================

#[tokio::test]
async fn test_example_file_simplification() -> Result<()> {
    let dir = TempDir::new()?;
    let processor = example_processor(&dir).await?;
    let input = write_fixture(&dir, "input.txt", "I love my cat.\n\n   \nMy Cat, my phone!\n")?;
    let output = dir.path().join("out.txt");

    let result = processor.simplify_file(&input, &output).await?;

    assert!(result.failures.is_empty());
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "I love my dog\n\n\nMy Dog my phone!\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_input_file_produces_empty_output() -> Result<()> {
    let dir = TempDir::new()?;
    let processor = example_processor(&dir).await?;
    let input = write_fixture(&dir, "input.txt", "")?;
    let output = dir.path().join("out.txt");

    let result = processor.simplify_file(&input, &output).await?;
    assert!(result.lines.is_empty());
    assert_eq!(std::fs::read_to_string(&output)?, "");
    Ok(())
}

#[tokio::test]
async fn test_same_input_and_output_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let processor = example_processor(&dir).await?;
    let input = write_fixture(&dir, "input.txt", "cat\n")?;

    let result = processor.simplify_file(&input, &input).await;
    assert!(matches!(result, Err(SimplifierError::InvalidArgument(_))));
    assert_eq!(std::fs::read_to_string(&input)?, "cat\n");
    Ok(())
}

#[tokio::test]
async fn test_line_progress_reports_final_line() -> Result<()> {
    let dir = TempDir::new()?;
    let embeddings_path = write_fixture(&dir, "embeddings.txt", EXAMPLE_EMBEDDINGS)?;
    let vocabulary_path = write_fixture(&dir, "vocabulary.txt", EXAMPLE_VOCABULARY)?;
    let plain = StageOptions::new(WorkerPool::new(2));

    let (embeddings, _) = EmbeddingsStore::load(&embeddings_path, &plain).await?;
    let (vocabulary, _) = VocabularySet::load(&vocabulary_path, &plain).await?;
    let engine = SimilarityEngine::new(
        Arc::new(embeddings),
        Arc::new(vocabulary),
        &SimplifierConfig::default(),
    )?;

    let (options, calls) = recording_options(3, 10);
    let processor = ConcurrentLineProcessor::new(Arc::new(LineSimplifier::new(engine)), options);
    processor.process(vec!["my cat".to_string(); 25]).await?;

    let mut completed: Vec<usize> = calls.lock().unwrap().iter().map(|(done, _)| *done).collect();
    completed.sort_unstable();
    assert_eq!(completed, vec![10, 20, 25]);
    Ok(())
}

#[tokio::test]
async fn test_missing_stores_block_run() -> Result<()> {
    let dir = TempDir::new()?;
    let empty = write_fixture(&dir, "empty.txt", "\n\n")?;
    let vocabulary_path = write_fixture(&dir, "vocabulary.txt", EXAMPLE_VOCABULARY)?;
    let options = StageOptions::new(WorkerPool::new(2));

    let (embeddings, report) = EmbeddingsStore::load(&empty, &options).await?;
    assert_eq!(report.loaded, 0);
    let (vocabulary, _) = VocabularySet::load(&vocabulary_path, &options).await?;

    let result = SimilarityEngine::new(
        Arc::new(embeddings),
        Arc::new(vocabulary),
        &SimplifierConfig::default(),
    );
    assert!(matches!(result, Err(SimplifierError::MissingPrecondition(_))));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_load_reports_interruption() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_fixture(&dir, "embeddings.txt", EXAMPLE_EMBEDDINGS)?;
    let cancel = StageCancellation::new();
    cancel.cancel();
    let options = StageOptions::new(WorkerPool::new(1)).with_cancellation(cancel);

    let result = EmbeddingsStore::load(&path, &options).await;
    assert!(matches!(
        result,
        Err(SimplifierError::StageInterrupted {
            stage: "embeddings"
        })
    ));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_lookups_share_engine() -> Result<()> {
    let dir = TempDir::new()?;
    let processor = Arc::new(example_processor(&dir).await?);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let processor = processor.clone();
            tokio::spawn(async move {
                let line = if i % 2 == 0 { "my cat" } else { "my Cat." };
                processor.process(vec![line.to_string()]).await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    for (i, result) in results.into_iter().enumerate() {
        let result = result??;
        let expected = if i % 2 == 0 { "my dog" } else { "my Dog" };
        assert_eq!(result.lines, vec![expected.to_string()]);
    }
    Ok(())
}
