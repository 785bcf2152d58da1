pub mod grouper;
pub mod hasher;
pub mod resolver;

pub use grouper::{find_duplicates, DupConfig, DuplicateGroup, DuplicateSet};
pub use resolver::{resolve_all, resolve_group, KeepStrategy, ResolvedGroup};
