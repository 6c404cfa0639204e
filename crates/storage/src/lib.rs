//! Storage abstraction and implementations for reviewgate.
//!
//! This crate provides a trait-based storage interface with a JSON file
//! reference implementation, plus CSV export of the review sheets.

#![warn(missing_docs)]

pub mod trait_;
pub mod model;
pub mod json_storage;
pub mod export;

#[cfg(test)]
pub(crate) mod testing;

pub use trait_::{Storage, StorageError, Result};
pub use model::{StoredReview, ReviewFilter};
pub use json_storage::JsonStorage;
pub use export::{SheetExporter, ExportedSheets};
