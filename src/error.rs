//! Error types for catalog construction, allocation, and full picker runs.

use thiserror::Error;

use crate::catalog::CellId;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for allocation operations.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Result type for a full picker run.
pub type PickResult<T> = Result<T, PickError>;

/// Errors raised while building a [`CellCatalog`](crate::catalog::CellCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A collection with this name is already registered.
    #[error("duplicate collection name: {name}")]
    DuplicateCollection { name: String },

    /// Collection names must be non-empty.
    #[error("collection name must not be empty")]
    EmptyName,

    /// A row's width does not match the collection's column count.
    #[error("collection {collection}: row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        collection: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised by [`allocate`](crate::allocator::allocate).
///
/// All variants are fatal: the allocator never returns a partial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The catalog cannot possibly satisfy every quota.
    #[error(
        "insufficient data: {found} cells across {collections} collections, \
         need at least {required} ({collections} x quota {quota})"
    )]
    InsufficientData {
        collections: usize,
        quota: usize,
        required: usize,
        found: usize,
    },

    /// A deficient collection's eligible donor pool is too small.
    #[error("donor shortage for collection {collection}: needed {needed} cells, found {found}")]
    DonorShortage {
        collection: String,
        needed: usize,
        found: usize,
    },

    /// Post-allocation validation found a selection of the wrong size.
    #[error("allocation integrity violated: collection {collection} has {actual} cells, expected {expected}")]
    AllocationIntegrity {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// A sampling pool has no weight left to draw from.
    #[error("cannot draw {requested} cells from a pool of {pool_size} with zero total weight")]
    ZeroWeightPool { pool_size: usize, requested: usize },

    /// The catalog holds a different number of collections than configured.
    #[error("expected exactly {expected} collections, found {found}")]
    CollectionCountMismatch { expected: usize, found: usize },

    /// The catalog has no collections at all.
    #[error("catalog contains no collections")]
    EmptyCatalog,

    /// A quota of zero selects nothing.
    #[error("quota must be at least 1")]
    InvalidQuota,

    /// An allocation state was built for a different catalog.
    #[error("allocation state does not match catalog: {reason}")]
    StateMismatch { reason: String },

    /// An allocation references a cell the catalog does not hold.
    #[error("unknown cell: {id}")]
    UnknownCell { id: CellId },
}

impl AllocationError {
    /// Creates a donor shortage error.
    pub fn donor_shortage(collection: impl Into<String>, needed: usize, found: usize) -> Self {
        Self::DonorShortage {
            collection: collection.into(),
            needed,
            found,
        }
    }

    /// Creates an integrity error.
    pub fn integrity(collection: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::AllocationIntegrity {
            collection: collection.into(),
            expected,
            actual,
        }
    }

    /// Creates a state mismatch error.
    pub fn state_mismatch(reason: impl Into<String>) -> Self {
        Self::StateMismatch {
            reason: reason.into(),
        }
    }

    /// Returns true if the failure is caused by the input data or
    /// configuration rather than an internal defect.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Self::AllocationIntegrity { .. }
                | Self::UnknownCell { .. }
                | Self::StateMismatch { .. }
        )
    }

    /// Process exit code a command-line front end should report.
    ///
    /// Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InsufficientData { .. } => 2,
            Self::DonorShortage { .. } => 3,
            Self::AllocationIntegrity { .. } => 4,
            Self::ZeroWeightPool { .. } => 5,
            Self::CollectionCountMismatch { .. } => 6,
            Self::EmptyCatalog => 7,
            Self::InvalidQuota => 8,
            Self::UnknownCell { .. } => 9,
            Self::StateMismatch { .. } => 10,
        }
    }
}

/// Any failure of a [`CellPicker`](crate::picker::CellPicker) run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl PickError {
    /// Process exit code a command-line front end should report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Catalog(_) => 1,
            Self::Allocation(e) => e.exit_code(),
        }
    }
}
