//! Progress reporting for long-running scans.
//!
//! Scans push snapshots into a [`ScanObserver`]. The CLI implements it with
//! progress bars; embedders that run scans in the background use
//! [`ChannelObserver`], which forwards every snapshot as a [`ScanEvent`]
//! tagged with the scan generation that produced it.

use crossbeam_channel::Sender;

use crate::duplicates::DuplicateGroup;
use crate::junk::JunkCategory;
use crate::scanner::large::LargeFile;

/// Identifies one scan invocation. Newer scans get larger numbers.
pub type Generation = u64;

/// Receives incremental results from a scan.
///
/// Every method has a no-op default, so implementors only override what
/// they display. Snapshots are complete, already-sorted result lists, not
/// deltas.
pub trait ScanObserver: Send + Sync {
    /// A unit of work finished. `fraction` is in `0.0..=1.0`.
    fn on_progress(&self, _fraction: f64, _message: &str) {}

    /// Confirmed duplicate groups so far, largest groups first
    fn on_duplicates(&self, _groups: &[DuplicateGroup]) {}

    /// Large files found so far, biggest first
    fn on_large_files(&self, _files: &[LargeFile]) {}

    /// Measured junk categories (published once per scan)
    fn on_categories(&self, _categories: &[JunkCategory]) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Messages emitted by background scans
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Progress {
        generation: Generation,
        fraction: f64,
        message: String,
    },
    Duplicates {
        generation: Generation,
        groups: Vec<DuplicateGroup>,
    },
    LargeFiles {
        generation: Generation,
        files: Vec<LargeFile>,
    },
    Categories {
        generation: Generation,
        categories: Vec<JunkCategory>,
    },
}

impl ScanEvent {
    pub fn generation(&self) -> Generation {
        match self {
            ScanEvent::Progress { generation, .. }
            | ScanEvent::Duplicates { generation, .. }
            | ScanEvent::LargeFiles { generation, .. }
            | ScanEvent::Categories { generation, .. } => *generation,
        }
    }
}

/// Forwards snapshots over a channel.
///
/// Sends never block. When a bounded channel is full the snapshot is
/// dropped (a later one supersedes it), and a disconnected receiver means
/// the caller moved on to a newer scan.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    generation: Generation,
    tx: Sender<ScanEvent>,
}

impl ChannelObserver {
    pub fn new(generation: Generation, tx: Sender<ScanEvent>) -> Self {
        Self { generation, tx }
    }

    fn send(&self, event: ScanEvent) {
        let _ = self.tx.try_send(event);
    }
}

impl ScanObserver for ChannelObserver {
    fn on_progress(&self, fraction: f64, message: &str) {
        self.send(ScanEvent::Progress {
            generation: self.generation,
            fraction,
            message: message.to_string(),
        });
    }

    fn on_duplicates(&self, groups: &[DuplicateGroup]) {
        self.send(ScanEvent::Duplicates {
            generation: self.generation,
            groups: groups.to_vec(),
        });
    }

    fn on_large_files(&self, files: &[LargeFile]) {
        self.send(ScanEvent::LargeFiles {
            generation: self.generation,
            files: files.to_vec(),
        });
    }

    fn on_categories(&self, categories: &[JunkCategory]) {
        self.send(ScanEvent::Categories {
            generation: self.generation,
            categories: categories.to_vec(),
        });
    }
}
