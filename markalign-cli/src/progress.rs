//! Terminal progress bar for long pipeline stages

use indicatif::{ProgressBar, ProgressStyle};
use markalign_core::ProgressReporter;

const TEMPLATE: &str = "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}";

pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, stage: &str, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, begin: u64, end: u64) {
        self.bar.inc(end.saturating_sub(begin));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
