//! Engine facade.
//!
//! Owns the configuration, the bounded worker pool every scan hashes and
//! measures on, the shared [`SizeCache`], the deletion [`Executor`] and the
//! scan generation counter. Scans can run inline (`find_*`, with any
//! observer) or on a background thread (`spawn_*`), in which case snapshots
//! arrive as [`ScanEvent`]s on the returned handle's channel.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Receiver;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

use crate::cleaner::executor::{CleanReport, Executor};
use crate::common::config::Config;
use crate::duplicates::{self, DupConfig, DuplicateGroup};
use crate::junk::{self, catalog, JunkAnalyzer, JunkCategory};
use crate::scanner::cache::SizeCache;
use crate::scanner::large::{LargeFile, LargeFileFinder};
use crate::scanner::progress::{ChannelObserver, Generation, ScanEvent, ScanObserver};
use crate::scanner::walker::{self, FileEntry, WalkPolicy};

/// Maximum number of snapshots that may queue up before newer ones are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// A scan running on a background thread
pub struct ScanHandle<T> {
    generation: Generation,
    events: Receiver<ScanEvent>,
    thread: thread::JoinHandle<T>,
}

impl<T> ScanHandle<T> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Progressive snapshots, each tagged with this handle's generation
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the scan completes and return its final result
    pub fn wait(self) -> Result<T> {
        self.thread
            .join()
            .map_err(|_| anyhow!("scan thread for generation {} panicked", self.generation))
    }
}

pub struct Engine {
    config: Config,
    pool: Arc<ThreadPool>,
    cache: SizeCache,
    executor: Executor,
    generation: AtomicU64,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        let workers = config.worker_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("diskbroom-worker-{}", i))
            .build()
            .context("Failed to build worker pool")?;
        info!("Engine ready with {} workers", workers);

        Ok(Self {
            config,
            pool: Arc::new(pool),
            cache: SizeCache::new(),
            executor: Executor::default(),
            generation: AtomicU64::new(0),
        })
    }

    /// Replace the deletion executor (tests use this to avoid the real trash)
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn cache(&self) -> &SizeCache {
        &self.cache
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    fn next_generation(&self) -> Generation {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` belongs to the most recently started scan
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn policy(&self) -> WalkPolicy {
        WalkPolicy::default().with_exclusions(self.config.exclude_paths.clone())
    }

    /// Walk `roots` honouring the configured exclusions
    pub fn walk<I, P>(&self, roots: I, min_size: Option<u64>) -> impl Iterator<Item = FileEntry>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        walker::walk_with(roots, min_size, self.policy())
    }

    pub fn directory_size(&self, path: &Path) -> u64 {
        walker::directory_size(path)
    }

    /// Size of a stable entity (an installed application, say), memoized
    pub fn cached_size(&self, path: &Path) -> u64 {
        self.cache.get_or_measure(path)
    }

    /// Duplicate settings from config; `roots` overrides the default roots
    pub fn duplicate_config(&self, roots: Option<Vec<PathBuf>>) -> DupConfig {
        let config = DupConfig::from_config(&self.config);
        match roots {
            Some(roots) => config.with_roots(roots),
            None => config,
        }
    }

    /// Large-file finder from config; `roots` overrides the default roots
    pub fn large_file_finder(&self, roots: Option<Vec<PathBuf>>) -> LargeFileFinder {
        let mut finder = match roots {
            Some(roots) => LargeFileFinder::new(roots),
            None => LargeFileFinder::default(),
        }
        .with_policy(self.policy());
        finder.set_threshold(self.config.large_file_threshold_bytes());
        finder
    }

    /// Analyzer over the built-in catalog plus configured extras
    pub fn junk_analyzer(&self) -> JunkAnalyzer {
        JunkAnalyzer::new(catalog::with_extras(&self.config.extra_categories))
    }

    pub fn find_duplicates(
        &self,
        config: &DupConfig,
        observer: &dyn ScanObserver,
    ) -> Vec<DuplicateGroup> {
        self.next_generation();
        duplicates::find_duplicates(config, &self.pool, observer)
    }

    pub fn find_large_files(
        &self,
        finder: &LargeFileFinder,
        observer: &dyn ScanObserver,
    ) -> Vec<LargeFile> {
        self.next_generation();
        finder.scan(observer)
    }

    /// Run a junk scan inline; the analyzer ends in `Summary`
    pub fn analyze_junk(&self, analyzer: &mut JunkAnalyzer, observer: &dyn ScanObserver) {
        let generation = self.next_generation();
        analyzer.scan_at(generation, &self.pool, observer);
    }

    fn spawn<T, F>(&self, name: &str, generation: Generation, job: F) -> io::Result<ScanHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&ThreadPool, &ChannelObserver) -> T + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY);
        let pool = Arc::clone(&self.pool);
        let thread = thread::Builder::new()
            .name(format!("diskbroom-{}", name))
            .spawn(move || {
                let observer = ChannelObserver::new(generation, tx);
                job(&pool, &observer)
            })?;
        info!("Started {} scan, generation {}", name, generation);

        Ok(ScanHandle {
            generation,
            events: rx,
            thread,
        })
    }

    pub fn spawn_duplicates(&self, config: DupConfig) -> io::Result<ScanHandle<Vec<DuplicateGroup>>> {
        let generation = self.next_generation();
        self.spawn("duplicates", generation, move |pool, observer| {
            duplicates::find_duplicates(&config, pool, observer)
        })
    }

    pub fn spawn_large_files(&self, finder: LargeFileFinder) -> io::Result<ScanHandle<Vec<LargeFile>>> {
        let generation = self.next_generation();
        self.spawn("large-files", generation, move |_, observer| finder.scan(observer))
    }

    /// Start measuring the analyzer's catalog in the background.
    ///
    /// The analyzer enters `Scanning` immediately, under the engine
    /// generation the handle carries. Hand the result to
    /// [`JunkAnalyzer::finish_scan`] with that generation.
    pub fn spawn_junk(
        &self,
        analyzer: &mut JunkAnalyzer,
    ) -> io::Result<ScanHandle<Vec<JunkCategory>>> {
        let generation = analyzer.begin_scan_at(self.next_generation());
        let specs = analyzer.catalog().to_vec();
        self.spawn("junk", generation, move |pool, observer| {
            let categories = junk::measure_catalog(&specs, pool, observer);
            observer.on_categories(&categories);
            categories
        })
    }

    /// Clean one target and return the bytes freed
    pub fn delete(&self, path: &Path) -> u64 {
        let freed = self.executor.clean_path(path);
        self.cache.remove(path);
        freed
    }

    /// Clean every target; cached sizes for them are invalidated
    pub fn delete_batch<I, P>(&self, paths: I) -> CleanReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        let report = self.executor.delete_batch(&paths);
        for path in &paths {
            self.cache.remove(path);
        }
        report
    }
}
