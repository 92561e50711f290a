//! Picker configuration.
//!
//! Every field has a default matching the AFM cell-picking workflow, and
//! deserialization accepts any subset of fields.

use serde::{Deserialize, Serialize};

use crate::combiner::{ColumnOrder, DEFAULT_COLUMN_ORDER};
use crate::error::{AllocationError, AllocationResult};

/// Default number of cells every collection must end with.
pub const DEFAULT_QUOTA: usize = 30;

/// Default number of collections a run expects.
pub const DEFAULT_EXPECTED_COLLECTIONS: usize = 3;

/// Configuration for a [`CellPicker`](crate::picker::CellPicker) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Cells per collection.
    pub quota: usize,

    /// Seed for the sampling generator.
    pub seed: u64,

    /// Required number of collections, if any.
    pub expected_collections: Option<usize>,

    /// Preferred column order of the combined header.
    pub column_order: Vec<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            seed: 0,
            expected_collections: Some(DEFAULT_EXPECTED_COLLECTIONS),
            column_order: DEFAULT_COLUMN_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PickerConfig {
    /// Creates a configuration with the given seed and defaults otherwise.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Sets the quota.
    #[must_use]
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the required collection count; `None` accepts any count.
    #[must_use]
    pub fn with_expected_collections(mut self, expected: Option<usize>) -> Self {
        self.expected_collections = expected;
        self
    }

    /// Sets the preferred column order.
    #[must_use]
    pub fn with_column_order<C, S>(mut self, columns: C) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_order = columns.into_iter().map(Into::into).collect();
        self
    }

    /// The column ordering used by the combiner.
    pub fn column_order(&self) -> ColumnOrder {
        ColumnOrder::new(self.column_order.iter().cloned())
    }

    /// Checks the configuration on its own.
    ///
    /// # Errors
    /// [`AllocationError::InvalidQuota`] if `quota == 0`.
    pub fn validate(&self) -> AllocationResult<()> {
        if self.quota == 0 {
            return Err(AllocationError::InvalidQuota);
        }
        Ok(())
    }
}
