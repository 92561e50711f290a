//! One-shot, config-driven runs: allocate, then combine.

use crate::allocator::{allocate, AllocationState};
use crate::catalog::CellCatalog;
use crate::combiner::{combine, CombinedTable};
use crate::config::PickerConfig;
use crate::error::{AllocationError, PickResult};
use crate::random::create_rng;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub state: AllocationState,
    pub table: CombinedTable,
}

/// Runs allocation and combination with a fixed configuration.
///
/// # Examples
/// ```
/// use cell_quota::catalog::CellCatalog;
/// use cell_quota::config::PickerConfig;
/// use cell_quota::picker::CellPicker;
///
/// let cell = vec![vec!["0.5".to_string(), "a".to_string()]];
/// let mut catalog = CellCatalog::new();
/// catalog.add_collection("a", ["Note", "Height [m]"], vec![cell.clone(); 3]).unwrap();
/// catalog.add_collection("b", ["Note", "Height [m]"], vec![cell; 1]).unwrap();
///
/// let picker = CellPicker::new(PickerConfig::new(42).with_quota(2).with_expected_collections(Some(2)));
/// let outcome = picker.run(&catalog).unwrap();
/// assert_eq!(outcome.table.header(), ["Height [m]", "Note"]);
/// assert_eq!(outcome.table.rows().len(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellPicker {
    config: PickerConfig,
}

impl CellPicker {
    pub fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    /// Allocates `quota` cells per collection and combines them.
    ///
    /// The same catalog and configuration always yield the same outcome.
    ///
    /// # Errors
    /// - [`AllocationError::CollectionCountMismatch`] if the catalog size
    ///   differs from `expected_collections`.
    /// - Any error of [`allocate`] or [`combine`].
    pub fn run(&self, catalog: &CellCatalog) -> PickResult<PickOutcome> {
        self.config.validate()?;
        if let Some(expected) = self.config.expected_collections {
            if catalog.len() != expected {
                return Err(AllocationError::CollectionCountMismatch {
                    expected,
                    found: catalog.len(),
                }
                .into());
            }
        }

        tracing::info!(
            collections = catalog.len(),
            cells = catalog.total_cells(),
            quota = self.config.quota,
            seed = self.config.seed,
            "selecting cells"
        );

        let mut rng = create_rng(self.config.seed);
        let state = allocate(catalog, self.config.quota, &mut rng)?;
        let table = combine(catalog, &state, &self.config.column_order())?;
        Ok(PickOutcome { state, table })
    }
}
