pub mod analyzer;
pub mod catalog;

pub use analyzer::{measure_catalog, JunkAnalyzer, JunkCategory, JunkItem, ScanState, SortMode};
pub use catalog::{CategorySpec, ItemSpec};
