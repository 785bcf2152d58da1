pub mod executor;

pub use executor::{CleanReport, Executor, Remover, Removed, SystemRemover};
