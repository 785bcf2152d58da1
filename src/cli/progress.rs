use indicatif::{ProgressBar, ProgressStyle};

use crate::common::format;
use crate::duplicates::DuplicateGroup;
use crate::scanner::large::LargeFile;
use crate::scanner::progress::ScanObserver;

const STEPS: u64 = 1000;

/// Terminal progress bar driven by scan snapshots
pub struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(STEPS);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("━━░"));
        }
        bar.set_message(message.to_string());
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ScanObserver for BarObserver {
    fn on_progress(&self, fraction: f64, message: &str) {
        self.bar
            .set_position((fraction.clamp(0.0, 1.0) * STEPS as f64) as u64);
        self.bar.set_message(format::truncate(message, 50));
    }

    fn on_duplicates(&self, groups: &[DuplicateGroup]) {
        let wasted: u64 = groups.iter().map(|g| g.wasted_bytes()).sum();
        self.bar.set_message(format!(
            "{} duplicate groups, {} reclaimable",
            groups.len(),
            format::format_size(wasted)
        ));
    }

    fn on_large_files(&self, files: &[LargeFile]) {
        let total: u64 = files.iter().map(|f| f.size).sum();
        self.bar.set_message(format!(
            "{} large files, {}",
            files.len(),
            format::format_size(total)
        ));
    }
}

/// Either a visible bar or nothing, depending on output mode
pub fn observer(show: bool, message: &str) -> Option<BarObserver> {
    show.then(|| BarObserver::new(message))
}
