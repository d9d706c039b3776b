//! Concurrent line processing
//!
//! Fans one unit of work per input line out to the worker pool and gathers the
//! simplified lines back in input order. A line that fails is kept verbatim and
//! recorded in [`SimplificationResult::failures`]; its siblings are unaffected.

use crate::error::{Result, SimplifierError};
use crate::pool::StageOptions;
use crate::simplifier::LineSimplifier;
use std::path::Path;
use std::sync::Arc;

/// One input line tagged with its position
#[derive(Debug, Clone, PartialEq)]
pub struct LineTask {
    pub index: usize,
    pub raw_text: Arc<str>,
}

/// Outcome of simplifying one line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Simplified(String),
    Failed { original: String, reason: String },
}

/// A line that could not be simplified and was passed through unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLine {
    pub index: usize,
    pub reason: String,
}

/// Output lines in input order plus any per-line failures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplificationResult {
    pub lines: Vec<String>,
    pub failures: Vec<FailedLine>,
}

impl SimplificationResult {
    /// Output text with one newline-terminated line per input line
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Simplifies many lines concurrently on a bounded worker pool
pub struct ConcurrentLineProcessor {
    simplifier: Arc<LineSimplifier>,
    options: StageOptions,
}

impl ConcurrentLineProcessor {
    pub fn new(simplifier: Arc<LineSimplifier>, options: StageOptions) -> Self {
        Self {
            simplifier,
            options,
        }
    }

    /// Simplify `lines`, returning output line `i` for input line `i`
    ///
    /// Nothing is returned until every line has finished. Cancellation while
    /// waiting fails the whole call with `StageInterrupted`.
    pub async fn process(&self, lines: Vec<String>) -> Result<SimplificationResult> {
        self.run_lines(lines, |simplifier, line| simplifier.simplify(line))
            .await
    }

    /// Run `work` over every line; an `Err` or a panic keeps that line as it was
    pub(crate) async fn run_lines<F>(&self, lines: Vec<String>, work: F) -> Result<SimplificationResult>
    where
        F: Fn(&LineSimplifier, &str) -> Result<String> + Send + Sync + 'static,
    {
        let total = lines.len();
        tracing::info!(
            "Simplifying {} lines with {} workers",
            total,
            self.options.pool.workers()
        );

        let tasks: Vec<LineTask> = lines
            .into_iter()
            .enumerate()
            .map(|(index, raw_text)| LineTask {
                index,
                raw_text: raw_text.into(),
            })
            .collect();
        // Shares each line's buffer with its task, for the panic fallback
        let originals: Vec<Arc<str>> = tasks.iter().map(|task| task.raw_text.clone()).collect();

        let simplifier = self.simplifier.clone();
        let outcomes = self
            .options
            .pool
            .run(
                "simplify",
                tasks,
                move |task: LineTask| match work(&simplifier, &task.raw_text) {
                    Ok(line) => LineOutcome::Simplified(line),
                    Err(e) => LineOutcome::Failed {
                        original: task.raw_text.to_string(),
                        reason: e.to_string(),
                    },
                },
                self.options.counter(total),
                &self.options.cancel,
            )
            .await?;

        let mut result = SimplificationResult {
            lines: Vec::with_capacity(total),
            failures: Vec::new(),
        };
        for ((index, unit), original) in outcomes.into_iter().enumerate().zip(originals) {
            let outcome = unit.unwrap_or_else(|panic| LineOutcome::Failed {
                original: original.to_string(),
                reason: format!("worker panicked: {}", panic),
            });
            match outcome {
                LineOutcome::Simplified(line) => result.lines.push(line),
                LineOutcome::Failed { original, reason } => {
                    tracing::warn!("Line {} left unchanged: {}", index + 1, reason);
                    result.lines.push(original);
                    result.failures.push(FailedLine { index, reason });
                }
            }
        }

        tracing::info!(
            "Simplified {} lines ({} failed)",
            result.lines.len(),
            result.failures.len()
        );
        Ok(result)
    }

    /// Simplify a whole text, split into lines
    pub async fn process_text(&self, text: &str) -> Result<SimplificationResult> {
        self.process(text.lines().map(str::to_owned).collect())
            .await
    }

    /// Simplify `input` into `output`, one output line per input line
    ///
    /// The output file is only written after every line has been processed.
    pub async fn simplify_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<SimplificationResult> {
        let (input, output) = (input.as_ref(), output.as_ref());
        if same_file(input, output) {
            return Err(SimplifierError::InvalidArgument(
                "Input and output file paths cannot be the same".to_string(),
            ));
        }

        let text = tokio::fs::read_to_string(input)
            .await
            .map_err(|e| SimplifierError::from_read(input, e))?;
        let result = self.process_text(&text).await?;

        tokio::fs::write(output, result.to_text()).await?;
        tracing::info!("Simplified text written to {:?}", output);
        Ok(result)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
