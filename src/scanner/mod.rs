pub mod cache;
pub mod large;
pub mod progress;
pub mod walker;

pub use cache::{CacheStats, SizeCache};
pub use large::{LargeFile, LargeFileFinder, LargeFileSet};
pub use progress::{ChannelObserver, Generation, NoopObserver, ScanEvent, ScanObserver};
pub use walker::{directory_size, walk, FileEntry, WalkPolicy};
