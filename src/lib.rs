//! # diskbroom
//!
//! A scan-and-cleanup engine for the usual suspects filling a disk.
//!
//! - **Junk analysis**: measures a catalog of cache, log, build-data and
//!   leftover locations, with a recommended selection you can adjust
//! - **Duplicate detection**: size buckets, then prefix fingerprints hashed
//!   in parallel, with partial results published as they are confirmed
//! - **Large files**: everything above a threshold in your user folders
//! - **Safe deletion**: Trash first, permanent removal as a fallback, one
//!   failure never stops a batch, and protected locations are refused
//!
//! The [`engine::Engine`] ties these together around a bounded worker pool
//! and can run any scan on a background thread.

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod engine;
pub mod junk;
pub mod scanner;

pub use engine::{Engine, ScanHandle};
