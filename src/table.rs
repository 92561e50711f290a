//! In-memory measurement tables and blank-row cell splitting.
//!
//! A [`Table`] is a header plus rows of string fields, as produced by
//! whatever loader read the source file. Measurement exports separate
//! consecutive cells with blank rows; [`Table::split_cells`] recovers
//! those cells.

/// A parsed table: column names plus rows of fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table from column names and rows.
    pub fn new<C, S>(columns: C, rows: Vec<Vec<String>>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the number of rows, blank separators included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the rows into cells at blank rows.
    ///
    /// A row is blank when every field is empty or whitespace. Runs of
    /// blank rows never produce empty cells, and a final cell without a
    /// closing blank row is kept.
    ///
    /// # Complexity
    /// Time: O(total fields)
    ///
    /// # Examples
    /// ```
    /// use cell_quota::table::Table;
    /// let row = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    /// let t = Table::new(
    ///     ["x", "y"],
    ///     vec![row(&["1", "2"]), row(&["", ""]), row(&["", " "]), row(&["3", "4"]), row(&["5", "6"])],
    /// );
    /// let cells = t.split_cells();
    /// assert_eq!(cells.len(), 2);
    /// assert_eq!(cells[0].len(), 1);
    /// assert_eq!(cells[1].len(), 2);
    /// ```
    pub fn split_cells(&self) -> Vec<Vec<Vec<String>>> {
        let mut cells = Vec::new();
        let mut current: Vec<Vec<String>> = Vec::new();

        for row in &self.rows {
            if is_blank(row) {
                if !current.is_empty() {
                    cells.push(std::mem::take(&mut current));
                }
            } else {
                current.push(row.clone());
            }
        }
        if !current.is_empty() {
            cells.push(current);
        }

        tracing::debug!(cells = cells.len(), rows = self.rows.len(), "split table into cells");
        cells
    }
}

/// Returns `true` if every field of `row` is empty or whitespace.
pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|field| field.trim().is_empty())
}
