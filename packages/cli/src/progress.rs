//! Terminal progress bars for engine stages

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use lexisimplify_engine::ProgressReporter;
use std::sync::{Arc, Mutex};

/// Adapts an indicatif bar to the engine's progress callback
///
/// Workers report concurrently, so an update can arrive after a larger one.
/// Stale updates are dropped and the bar never moves backwards.
pub struct BarReporter {
    bar: ProgressBar,
    highest: Mutex<Option<usize>>,
}

impl BarReporter {
    fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            highest: Mutex::new(None),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn report(&self, completed: usize, total: usize) {
        let mut highest = self.highest.lock().unwrap_or_else(|p| p.into_inner());
        if highest.is_some_and(|seen| completed <= seen) {
            return;
        }
        *highest = Some(completed);

        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        if completed == total {
            self.bar.finish();
        }
    }
}

/// Create a labelled bar attached to `multi`
pub fn stage_bar(multi: &MultiProgress, label: &'static str) -> Arc<dyn ProgressReporter> {
    let bar = multi.add(ProgressBar::new(0));
    let style = ProgressStyle::with_template("{prefix:>12} [{bar:50.yellow}] {percent:>3}% {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░");
    bar.set_style(style);
    bar.set_prefix(label);
    Arc::new(BarReporter::new(bar))
}
