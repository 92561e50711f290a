//! # cell-quota
//!
//! Quota-balanced weighted sampling of measurement cells.
//!
//! A cell is a contiguous group of rows cut from a larger measurement
//! table. Given several named collections of cells, this crate selects
//! exactly the same number of cells for every collection, weighting each
//! draw by row count, and lets collections that are too small borrow
//! surplus cells from the others. The selected cells are then combined
//! into one table under a canonical header.
//!
//! ## Modules
//!
//! - [`random`] — Seeded RNG and weighted sampling without replacement
//! - [`table`] — In-memory tables and blank-row cell splitting
//! - [`catalog`] — Collections of cells with stable identities
//! - [`allocator`] — Two-phase quota allocation with deficit resolution
//! - [`combiner`] — Canonical column ordering and row concatenation
//! - [`config`] — Run configuration
//! - [`picker`] — Config-driven allocate-then-combine runs
//! - [`error`] — Typed failures
//!
//! ## Design Philosophy
//!
//! - **All or nothing**: a run returns a complete, validated allocation or
//!   an error, never a partial one
//! - **Reproducible**: all randomness flows from a caller-supplied seed
//! - **Explicit identity**: cells are keyed by collection name and
//!   load-time position
//! - **Property-based testing**: count and uniqueness invariants verified
//!   via proptest

pub mod allocator;
pub mod catalog;
pub mod combiner;
pub mod config;
pub mod error;
pub mod picker;
pub mod random;
pub mod table;

pub use allocator::{allocate, AllocationState, Selection};
pub use catalog::{Cell, CellCatalog, CellId, Collection};
pub use combiner::{combine, ColumnOrder, CombinedTable};
pub use config::PickerConfig;
pub use error::{AllocationError, CatalogError, PickError};
pub use picker::{CellPicker, PickOutcome};
