//! Concatenation of selected cells into one table.
//!
//! The header is built once, from the first collection's columns arranged
//! by a [`ColumnOrder`]. Every selected cell then contributes its rows,
//! realigned to that header by column name, in catalog order and within a
//! collection in selection order.

use crate::allocator::AllocationState;
use crate::catalog::{CellCatalog, CellId};
use crate::error::{AllocationError, AllocationResult};

/// Preferred column order of AFM force-map exports.
///
/// "Baseline Offset [N]" appears twice in the exporter's layout, so a
/// header built from it repeats that column.
pub const DEFAULT_COLUMN_ORDER: &[&str] = &[
    "Filename",
    "Position Index",
    "X Position",
    "Y Position",
    "Baseline Offset [N]",
    "Contact Point Offset [m]",
    "Young's Modulus [Pa]",
    "Contact Point [m]",
    "Baseline [N]",
    "ResidualRMS [N]",
    "Height [m]",
    "Ref. Value For Feedback Chan. [N]",
    "Baseline Offset [N]",
    "Adhesion [N]",
    "Minimum Value [N]",
    "Minimum Position [m]",
];

/// A canonical column ordering.
///
/// Columns named in the preferred list come first, in list order; any other
/// columns follow in their original order. A name listed twice in the
/// preferred list is emitted twice, and both positions carry the same
/// values after realignment.
///
/// # Examples
/// ```
/// use cell_quota::combiner::ColumnOrder;
/// let order = ColumnOrder::new(["id", "x", "y"]);
/// let columns: Vec<String> = ["note", "y", "id"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(order.arrange(&columns), vec!["id", "y", "note"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    preferred: Vec<String>,
}

impl Default for ColumnOrder {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_ORDER.iter().copied())
    }
}

impl ColumnOrder {
    pub fn new<C, S>(preferred: C) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferred: preferred.into_iter().map(Into::into).collect(),
        }
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    /// Arranges `columns` under this ordering.
    pub fn arrange(&self, columns: &[String]) -> Vec<String> {
        let preferred_present = self
            .preferred
            .iter()
            .filter(|p| columns.contains(p));
        let extras = columns.iter().filter(|c| !self.preferred.contains(c));
        preferred_present.chain(extras).cloned().collect()
    }
}

/// The combined output: one header plus the rows of every selected cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinedTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    cells: Vec<CellId>,
    cell_ends: Vec<usize>,
}

impl CombinedTable {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, without header or separators.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cells in output order.
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Rows contributed by the `i`-th output cell.
    pub fn cell_rows(&self, i: usize) -> Option<&[Vec<String>]> {
        let end = *self.cell_ends.get(i)?;
        let start = if i == 0 { 0 } else { self.cell_ends[i - 1] };
        Some(&self.rows[start..end])
    }

    /// Header row followed by every data row.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Header row, then each cell's rows followed by one blank row.
    pub fn to_rows_with_separators(&self) -> Vec<Vec<String>> {
        let blank = vec![String::new(); self.header.len()];
        let mut out = Vec::with_capacity(1 + self.rows.len() + self.cells.len());
        out.push(self.header.clone());
        for i in 0..self.cells.len() {
            if let Some(rows) = self.cell_rows(i) {
                out.extend(rows.iter().cloned());
            }
            out.push(blank.clone());
        }
        out
    }
}

/// Combines the selected cells of `state` into one table.
///
/// Each cell value lands under the header column of the same name. Header
/// columns a cell lacks are emitted empty; cell columns missing from the
/// header are dropped.
///
/// # Errors
/// - [`AllocationError::EmptyCatalog`] if `catalog` has no collections.
/// - [`AllocationError::UnknownCell`] if `state` references a cell the
///   catalog does not hold.
pub fn combine(
    catalog: &CellCatalog,
    state: &AllocationState,
    order: &ColumnOrder,
) -> AllocationResult<CombinedTable> {
    let first = catalog
        .collections()
        .first()
        .ok_or(AllocationError::EmptyCatalog)?;
    let header = order.arrange(first.columns());

    let mut table = CombinedTable {
        header,
        ..CombinedTable::default()
    };

    for selection in state.selections() {
        for id in selection.cells() {
            let cell = catalog
                .cell(id)
                .ok_or_else(|| AllocationError::UnknownCell { id: id.clone() })?;

            let positions: Vec<Option<usize>> = table
                .header
                .iter()
                .map(|h| cell.columns().iter().position(|c| c == h))
                .collect();

            for row in cell.rows() {
                let aligned = positions
                    .iter()
                    .map(|p| p.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect();
                table.rows.push(aligned);
            }
            table.cells.push(id.clone());
            table.cell_ends.push(table.rows.len());
        }
    }

    tracing::info!(
        cells = table.cells.len(),
        rows = table.rows.len(),
        columns = table.header.len(),
        "combined selected cells"
    );
    Ok(table)
}
