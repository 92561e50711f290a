//! Named collections of cells with stable identities.
//!
//! A [`CellCatalog`] is built once from pre-parsed tables and is read-only
//! afterwards. Every [`Cell`] receives a [`CellId`] made of its collection
//! name and its position within that collection at load time, so identity
//! never depends on where the cell happens to live in memory.
//!
//! A cell's sampling weight is its row count.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{AllocationError, AllocationResult, CatalogError, CatalogResult};
use crate::table::Table;

/// Stable identity of a cell: owning collection plus load-time position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    collection: String,
    index: usize,
}

impl CellId {
    pub fn new(collection: impl Into<String>, index: usize) -> Self {
        Self {
            collection: collection.into(),
            index,
        }
    }

    /// Name of the collection the cell was loaded into.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Position of the cell within its collection.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.index)
    }
}

/// An indivisible group of rows sharing its collection's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    id: CellId,
    columns: Arc<[String]>,
    rows: Vec<Vec<String>>,
}

impl Cell {
    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Sampling weight: the number of rows.
    pub fn weight(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// A named, ordered group of cells from one source dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    columns: Arc<[String]>,
    cells: Vec<Cell>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells held before any allocation.
    pub fn original_count(&self) -> usize {
        self.cells.len()
    }

    /// How many cells this collection may lend to others under `quota`.
    ///
    /// Zero when the collection has no surplus.
    pub fn max_lendable(&self, quota: usize) -> usize {
        self.original_count().saturating_sub(quota)
    }
}

/// All collections taking part in an allocation, in insertion order.
///
/// # Examples
/// ```
/// use cell_quota::catalog::CellCatalog;
/// let mut catalog = CellCatalog::new();
/// let cell = vec![vec!["1".to_string()], vec!["2".to_string()]];
/// catalog.add_collection("a.csv", ["Height [m]"], vec![cell.clone(), cell]).unwrap();
/// assert_eq!(catalog.total_cells(), 2);
/// assert_eq!(catalog.collection("a.csv").unwrap().cells()[1].weight(), 2);
/// assert!(catalog.add_collection("a.csv", ["x"], vec![]).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellCatalog {
    collections: Vec<Collection>,
    by_name: HashMap<String, usize>,
}

impl CellCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection from its columns and already-split cells.
    ///
    /// Cells are numbered in the order given.
    ///
    /// # Errors
    /// - [`CatalogError::EmptyName`] for a blank name.
    /// - [`CatalogError::DuplicateCollection`] if the name is taken.
    /// - [`CatalogError::RaggedRow`] if any row's width differs from the
    ///   column count.
    pub fn add_collection<C, S>(
        &mut self,
        name: impl Into<String>,
        columns: C,
        cells: Vec<Vec<Vec<String>>>,
    ) -> CatalogResult<&Collection>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateCollection { name });
        }

        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();

        let mut row_number = 0;
        for row in cells.iter().flatten() {
            if row.len() != width {
                return Err(CatalogError::RaggedRow {
                    collection: name,
                    row: row_number,
                    expected: width,
                    found: row.len(),
                });
            }
            row_number += 1;
        }

        let cells: Vec<Cell> = cells
            .into_iter()
            .enumerate()
            .map(|(index, rows)| Cell {
                id: CellId::new(name.clone(), index),
                columns: Arc::clone(&columns),
                rows,
            })
            .collect();

        tracing::debug!(collection = %name, cells = cells.len(), "registered collection");

        let position = self.collections.len();
        self.by_name.insert(name.clone(), position);
        self.collections.push(Collection {
            name,
            columns,
            cells,
        });
        Ok(&self.collections[position])
    }

    /// Splits `table` at blank rows and registers the resulting cells.
    pub fn add_table(&mut self, name: impl Into<String>, table: &Table) -> CatalogResult<&Collection> {
        let cells = table.split_cells();
        self.add_collection(name, table.columns().iter().cloned(), cells)
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns `true` if no collection is registered.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Collections in insertion order.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Looks up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.by_name.get(name).map(|&i| &self.collections[i])
    }

    /// Looks up a cell by identity.
    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.collection(id.collection())?.cells.get(id.index())
    }

    /// Total cells across all collections.
    pub fn total_cells(&self) -> usize {
        self.collections.iter().map(Collection::original_count).sum()
    }

    /// Pre-flight check: can every collection reach `quota` at all?
    ///
    /// # Errors
    /// [`AllocationError::InsufficientData`] if the total cell count is
    /// below `len() * quota`.
    pub fn ensure_capacity(&self, quota: usize) -> AllocationResult<()> {
        let required = self.len().saturating_mul(quota);
        let found = self.total_cells();
        if found < required {
            return Err(AllocationError::InsufficientData {
                collections: self.len(),
                quota,
                required,
                found,
            });
        }
        Ok(())
    }
}
