//! Persistent store for FlowGuard.
//!
//! A [`Database`] is opened and closed explicitly by its owner and handed to
//! the components that need it. [`FlowRepository`] reads and writes flow
//! definitions and run results on top of it; the vision cache keeps its
//! entries in the same file.

pub mod db;
pub mod errors;
pub mod repository;

pub use db::Database;
pub use errors::StoreError;
pub use repository::{FlowRepository, RunSummary, SaveOutcome};

pub type Result<T> = std::result::Result<T, StoreError>;
