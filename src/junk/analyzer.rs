use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use super::catalog::{self, CategorySpec};
use crate::scanner::progress::{Generation, ScanObserver};
use crate::scanner::walker;

/// A measured catalog location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunkItem {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub selected: bool,
    pub recommended: bool,
}

/// A catalog category with at least one non-empty item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunkCategory {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub description: String,
    /// Sum of item sizes
    pub size: u64,
    /// Collapsed tri-state: true when any item is selected
    pub selected: bool,
    pub items: Vec<JunkItem>,
}

impl JunkCategory {
    /// Bytes that a cleanup of this category would target
    pub fn selected_size(&self) -> u64 {
        if self.items.is_empty() {
            return if self.selected { self.size } else { 0 };
        }
        self.items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.size)
            .sum()
    }

    fn all_selected(&self) -> bool {
        self.items.iter().all(|i| i.selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanState {
    Idle,
    Scanning,
    Summary,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    SizeDesc,
    NameAsc,
}

/// Measure every catalog item on `pool` and build the categories.
///
/// Items measuring 0 bytes are left out, and so are categories left without
/// items. Initial selection follows each item's `recommended` flag.
pub fn measure_catalog(
    specs: &[CategorySpec],
    pool: &ThreadPool,
    observer: &dyn ScanObserver,
) -> Vec<JunkCategory> {
    let targets: Vec<(usize, usize, PathBuf)> = specs
        .iter()
        .enumerate()
        .flat_map(|(c, spec)| {
            spec.items
                .iter()
                .enumerate()
                .map(move |(i, item)| (c, i, item.resolved_path()))
        })
        .collect();
    let total = targets.len().max(1);
    let done = AtomicUsize::new(0);

    let sizes: Vec<u64> = pool.install(|| {
        targets
            .par_iter()
            .map(|(_, _, path)| {
                let size = walker::directory_size(path);
                debug!("Measured {}: {} bytes", path.display(), size);
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                observer.on_progress(n as f64 / total as f64, &path.display().to_string());
                size
            })
            .collect()
    });

    let mut built: Vec<JunkCategory> = Vec::new();
    for (c, spec) in specs.iter().enumerate() {
        let items: Vec<JunkItem> = targets
            .iter()
            .zip(&sizes)
            .filter(|((cat, _, _), size)| *cat == c && **size > 0)
            .map(|((_, i, path), size)| {
                let item = &spec.items[*i];
                JunkItem {
                    id: Uuid::new_v4(),
                    name: item.name.clone(),
                    path: path.clone(),
                    size: *size,
                    selected: item.recommended,
                    recommended: item.recommended,
                }
            })
            .collect();

        if items.is_empty() {
            continue;
        }

        let mut category = JunkCategory {
            id: Uuid::new_v4(),
            key: spec.key.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            size: items.iter().map(|i| i.size).sum(),
            selected: false,
            items,
        };
        category.selected = category.all_selected();
        built.push(category);
    }

    info!(
        "Junk scan: {} categories, {} bytes",
        built.len(),
        built.iter().map(|c| c.size).sum::<u64>()
    );
    built
}

/// Junk categories plus the selection and screen state around them.
///
/// Results are only accepted for the generation handed out by the latest
/// [`begin_scan`](Self::begin_scan); anything older is dropped.
#[derive(Debug, Clone)]
pub struct JunkAnalyzer {
    catalog: Vec<CategorySpec>,
    state: ScanState,
    generation: Generation,
    categories: Vec<JunkCategory>,
    total: u64,
    selected_bytes: u64,
    selected_category: Option<Uuid>,
}

impl Default for JunkAnalyzer {
    fn default() -> Self {
        Self::new(catalog::builtin())
    }
}

impl JunkAnalyzer {
    pub fn new(catalog: Vec<CategorySpec>) -> Self {
        Self {
            catalog,
            state: ScanState::Idle,
            generation: 0,
            categories: Vec::new(),
            total: 0,
            selected_bytes: 0,
            selected_category: None,
        }
    }

    pub fn catalog(&self) -> &[CategorySpec] {
        &self.catalog
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn categories(&self) -> &[JunkCategory] {
        &self.categories
    }

    /// Sum of all category sizes
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn selected_bytes(&self) -> u64 {
        self.selected_bytes
    }

    /// Reset results and enter `Scanning`. Returns the new generation.
    pub fn begin_scan(&mut self) -> Generation {
        self.begin_scan_at(self.generation + 1)
    }

    /// Like [`begin_scan`](Self::begin_scan), tagging the scan with a
    /// generation handed out elsewhere (the engine's counter). A value not
    /// above the current one is bumped past it, so generations only grow.
    pub fn begin_scan_at(&mut self, generation: Generation) -> Generation {
        self.generation = generation.max(self.generation + 1);
        self.state = ScanState::Scanning;
        self.categories.clear();
        self.total = 0;
        self.selected_bytes = 0;
        self.selected_category = None;
        self.generation
    }

    /// Accept measured categories for `generation`. Returns false (and
    /// changes nothing) when a newer scan has started since.
    pub fn finish_scan(&mut self, generation: Generation, categories: Vec<JunkCategory>) -> bool {
        if generation != self.generation || self.state != ScanState::Scanning {
            debug!(
                "Dropping junk results for generation {} (current {})",
                generation, self.generation
            );
            return false;
        }
        self.total = categories.iter().map(|c| c.size).sum();
        self.selected_category = categories.first().map(|c| c.id);
        self.categories = categories;
        self.recompute();
        self.state = ScanState::Summary;
        true
    }

    /// Measure the catalog synchronously and land in `Summary`
    pub fn scan(&mut self, pool: &ThreadPool, observer: &dyn ScanObserver) -> Generation {
        let generation = self.begin_scan();
        self.measure_into(generation, pool, observer)
    }

    /// [`scan`](Self::scan) under a caller-supplied generation
    pub fn scan_at(
        &mut self,
        generation: Generation,
        pool: &ThreadPool,
        observer: &dyn ScanObserver,
    ) -> Generation {
        let generation = self.begin_scan_at(generation);
        self.measure_into(generation, pool, observer)
    }

    fn measure_into(
        &mut self,
        generation: Generation,
        pool: &ThreadPool,
        observer: &dyn ScanObserver,
    ) -> Generation {
        let categories = measure_catalog(&self.catalog, pool, observer);
        observer.on_categories(&categories);
        self.finish_scan(generation, categories);
        generation
    }

    /// Drill into one category
    pub fn open_category(&mut self, id: Uuid) -> bool {
        if self.category(id).is_none() {
            return false;
        }
        self.selected_category = Some(id);
        self.state = ScanState::Details;
        true
    }

    pub fn close_details(&mut self) {
        if self.state == ScanState::Details {
            self.state = ScanState::Summary;
        }
    }

    /// The category shown in details (the first one after a scan)
    pub fn selected_category(&self) -> Option<&JunkCategory> {
        self.selected_category.and_then(|id| self.category(id))
    }

    pub fn category(&self, id: Uuid) -> Option<&JunkCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_by_key(&self, key: &str) -> Option<&JunkCategory> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn sorted_categories(&self, mode: SortMode) -> Vec<&JunkCategory> {
        let mut sorted: Vec<&JunkCategory> = self.categories.iter().collect();
        match mode {
            SortMode::SizeDesc => sorted.sort_by(|a, b| b.size.cmp(&a.size)),
            SortMode::NameAsc => {
                sorted.sort_by_key(|c| c.name.to_lowercase());
            }
        }
        sorted
    }

    pub fn deselect_all(&mut self) {
        for category in &mut self.categories {
            category.selected = false;
            for item in &mut category.items {
                item.selected = false;
            }
        }
        self.recompute();
    }

    /// Select exactly the recommended items
    pub fn apply_smart_selection(&mut self) {
        for category in &mut self.categories {
            for item in &mut category.items {
                item.selected = item.recommended;
            }
            category.selected = category.all_selected();
        }
        self.recompute();
    }

    /// Select or clear a category and all of its items
    pub fn toggle_category(&mut self, id: Uuid, value: bool) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == id) else {
            return;
        };
        category.selected = value;
        for item in &mut category.items {
            item.selected = value;
        }
        self.recompute();
    }

    pub fn toggle_item(&mut self, category_id: Uuid, item_id: Uuid, value: bool) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) else {
            return;
        };
        let Some(item) = category.items.iter_mut().find(|i| i.id == item_id) else {
            return;
        };
        item.selected = value;

        let all = category.items.iter().all(|i| i.selected);
        let none = category.items.iter().all(|i| !i.selected);
        // Mixed collapses to selected
        category.selected = all || !none;
        self.recompute();
    }

    /// Paths a cleanup of the current selection would target
    pub fn selected_paths(&self) -> Vec<PathBuf> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().filter(|i| i.selected).map(|i| i.path.clone()))
            .collect()
    }

    fn recompute(&mut self) {
        self.selected_bytes = self.categories.iter().map(|c| c.selected_size()).sum();
    }
}
