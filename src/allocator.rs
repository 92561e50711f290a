//! Quota allocation: weighted sampling without replacement with deficit
//! resolution.
//!
//! Every collection must end with exactly `quota` cells and no cell may be
//! selected for two collections.
//!
//! # Algorithm
//!
//! 1. **Self-allocation.** Each collection with at least `quota` unclaimed
//!    cells draws `quota` of them, weighted by row count, without
//!    replacement. A smaller collection claims all of its cells and is
//!    left short.
//! 2. **Deficit resolution.** Short collections are visited in catalog
//!    order. Each builds a donor pool from the unclaimed cells of every
//!    *other* collection whose surplus `original_count - quota` is
//!    positive, taking at most that surplus from each donor, then draws
//!    its shortfall from the pool with the same weighting. Cells claimed
//!    for one deficit are excluded from every later pool.
//! 3. **Validation.** Every selection must hold exactly `quota` cells.
//!
//! [`allocate`] runs a pre-flight capacity check and all three phases.
//! The phases are also exposed individually ([`self_allocate`],
//! [`resolve_deficits`], [`validate`]) over an explicit
//! [`AllocationState`].
//!
//! # Determinism
//!
//! Collections, cells, and donors are always visited in catalog order and
//! the generator is consumed in that order, so a fixed seed reproduces the
//! same state.

use std::collections::BTreeSet;

use rand::Rng;

use crate::catalog::{Cell, CellCatalog, CellId};
use crate::error::{AllocationError, AllocationResult};
use crate::random::sample_without_replacement;

/// The cells chosen for one collection, in selection order.
///
/// Self-allocated cells come first, then cells borrowed from donors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    collection: String,
    cells: Vec<CellId>,
    own: usize,
}

impl Selection {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells drawn from the collection itself.
    pub fn own(&self) -> &[CellId] {
        &self.cells[..self.own]
    }

    /// Cells borrowed from other collections; each id names its donor.
    pub fn borrowed(&self) -> &[CellId] {
        &self.cells[self.own..]
    }
}

/// Per-collection counts of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary<'a> {
    pub collection: &'a str,
    pub own: usize,
    pub borrowed: usize,
}

/// Selections per collection plus the set of claimed cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationState {
    quota: usize,
    selections: Vec<Selection>,
    claimed: BTreeSet<CellId>,
}

impl AllocationState {
    /// Creates an empty state with one selection slot per collection.
    pub fn new(catalog: &CellCatalog, quota: usize) -> Self {
        let selections = catalog
            .collections()
            .iter()
            .map(|c| Selection {
                collection: c.name().to_owned(),
                cells: Vec::with_capacity(quota),
                own: 0,
            })
            .collect();
        Self {
            quota,
            selections,
            claimed: BTreeSet::new(),
        }
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Selections in catalog order.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Looks up the selection of a collection by name.
    pub fn selection(&self, collection: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.collection == collection)
    }

    /// All claimed cells, in identity order.
    pub fn claimed(&self) -> &BTreeSet<CellId> {
        &self.claimed
    }

    pub fn is_claimed(&self, id: &CellId) -> bool {
        self.claimed.contains(id)
    }

    /// Checks that this state has one selection per collection of
    /// `catalog`, in catalog order.
    ///
    /// # Errors
    /// [`AllocationError::StateMismatch`] otherwise.
    pub fn ensure_matches(&self, catalog: &CellCatalog) -> AllocationResult<()> {
        if self.selections.len() != catalog.len() {
            return Err(AllocationError::state_mismatch(format!(
                "state has {} collections, catalog has {}",
                self.selections.len(),
                catalog.len()
            )));
        }
        for (selection, collection) in self.selections.iter().zip(catalog.collections()) {
            if selection.collection != collection.name() {
                return Err(AllocationError::state_mismatch(format!(
                    "state expects collection {}, catalog has {}",
                    selection.collection,
                    collection.name()
                )));
            }
        }
        Ok(())
    }

    /// Shortfall of the selection at `slot` against the quota.
    fn needed(&self, slot: usize) -> usize {
        self.quota.saturating_sub(self.selections[slot].len())
    }

    /// Per-collection own/borrowed counts, in catalog order.
    pub fn summary(&self) -> Vec<SelectionSummary<'_>> {
        self.selections
            .iter()
            .map(|s| SelectionSummary {
                collection: &s.collection,
                own: s.own().len(),
                borrowed: s.borrowed().len(),
            })
            .collect()
    }

    /// Cells of `catalog` that no selection claimed.
    pub fn unclaimed<'c>(&self, catalog: &'c CellCatalog) -> Vec<&'c CellId> {
        catalog
            .collections()
            .iter()
            .flat_map(|c| c.cells())
            .map(Cell::id)
            .filter(|id| !self.claimed.contains(*id))
            .collect()
    }

    fn claim(&mut self, slot: usize, ids: Vec<CellId>, own: bool) {
        let selection = &mut self.selections[slot];
        for id in ids {
            self.claimed.insert(id.clone());
            selection.cells.push(id);
        }
        if own {
            selection.own = selection.cells.len();
        }
    }
}

/// Draws `k` cells from `pool`, weighted by row count, without replacement.
fn draw<R: Rng + ?Sized>(pool: &[&Cell], k: usize, rng: &mut R) -> AllocationResult<Vec<CellId>> {
    let weights: Vec<u64> = pool.iter().map(|c| c.weight()).collect();
    let picked = sample_without_replacement(&weights, k, rng).ok_or(
        AllocationError::ZeroWeightPool {
            pool_size: pool.len(),
            requested: k,
        },
    )?;
    Ok(picked.into_iter().map(|i| pool[i].id().clone()).collect())
}

/// Runs the full allocation for `catalog` at `quota`.
///
/// Either a complete state where every collection holds exactly `quota`
/// cells is returned, or an error; nothing partial escapes.
///
/// # Errors
/// - [`AllocationError::InvalidQuota`] if `quota == 0`.
/// - [`AllocationError::EmptyCatalog`] if there are no collections.
/// - [`AllocationError::InsufficientData`] before any sampling when the
///   catalog holds fewer than `collections * quota` cells.
/// - [`AllocationError::DonorShortage`], [`AllocationError::ZeroWeightPool`],
///   [`AllocationError::AllocationIntegrity`] from the phases.
///
/// # Examples
/// ```
/// use cell_quota::allocator::allocate;
/// use cell_quota::catalog::CellCatalog;
/// use cell_quota::random::create_rng;
///
/// let cells = |n: usize| (0..n).map(|_| vec![vec!["1".to_string()]]).collect::<Vec<_>>();
/// let mut catalog = CellCatalog::new();
/// catalog.add_collection("a", ["v"], cells(6)).unwrap();
/// catalog.add_collection("b", ["v"], cells(2)).unwrap();
///
/// let state = allocate(&catalog, 4, &mut create_rng(1)).unwrap();
/// assert_eq!(state.selection("a").unwrap().len(), 4);
/// assert_eq!(state.selection("b").unwrap().borrowed().len(), 2);
/// assert_eq!(state.claimed().len(), 8);
/// ```
pub fn allocate<R: Rng + ?Sized>(
    catalog: &CellCatalog,
    quota: usize,
    rng: &mut R,
) -> AllocationResult<AllocationState> {
    if quota == 0 {
        return Err(AllocationError::InvalidQuota);
    }
    if catalog.is_empty() {
        return Err(AllocationError::EmptyCatalog);
    }
    catalog.ensure_capacity(quota)?;

    let mut state = AllocationState::new(catalog, quota);
    self_allocate(catalog, &mut state, rng)?;
    resolve_deficits(catalog, &mut state, rng)?;
    validate(&state)?;

    for s in state.summary() {
        tracing::info!(
            collection = s.collection,
            own = s.own,
            borrowed = s.borrowed,
            "final selection"
        );
    }
    Ok(state)
}

/// Phase 1: each collection draws from its own unclaimed cells.
///
/// # Errors
/// [`AllocationError::StateMismatch`] if `state` was not built for
/// `catalog`; [`AllocationError::ZeroWeightPool`] from sampling.
pub fn self_allocate<R: Rng + ?Sized>(
    catalog: &CellCatalog,
    state: &mut AllocationState,
    rng: &mut R,
) -> AllocationResult<()> {
    state.ensure_matches(catalog)?;
    let quota = state.quota;
    for (slot, collection) in catalog.collections().iter().enumerate() {
        let unused: Vec<&Cell> = collection
            .cells()
            .iter()
            .filter(|c| !state.is_claimed(c.id()))
            .collect();

        // Exactly `quota` unused cells still goes through the sampler so
        // the selection order is a weighted permutation.
        let picked = if unused.len() >= quota {
            draw(&unused, quota, rng)?
        } else {
            unused.iter().map(|c| c.id().clone()).collect()
        };

        tracing::info!(
            collection = collection.name(),
            selected = picked.len(),
            available = unused.len(),
            "self-allocated"
        );
        state.claim(slot, picked, true);
    }
    Ok(())
}

/// Phase 2: short collections borrow from eligible donors, one at a time.
///
/// # Errors
/// [`AllocationError::StateMismatch`] if `state` was not built for
/// `catalog`; [`AllocationError::DonorShortage`] or
/// [`AllocationError::ZeroWeightPool`] for a deficit that cannot be covered.
pub fn resolve_deficits<R: Rng + ?Sized>(
    catalog: &CellCatalog,
    state: &mut AllocationState,
    rng: &mut R,
) -> AllocationResult<()> {
    state.ensure_matches(catalog)?;
    let quota = state.quota;
    for (slot, target) in catalog.collections().iter().enumerate() {
        let needed = state.needed(slot);
        if needed == 0 {
            continue;
        }

        let claimed = &state.claimed;
        let pool: Vec<&Cell> = catalog
            .collections()
            .iter()
            .filter(|donor| donor.name() != target.name())
            .flat_map(move |donor| {
                donor
                    .cells()
                    .iter()
                    .filter(move |c| !claimed.contains(c.id()))
                    .take(donor.max_lendable(quota))
            })
            .collect();

        if pool.len() < needed {
            tracing::warn!(
                collection = target.name(),
                needed,
                found = pool.len(),
                "donor pool too small"
            );
            return Err(AllocationError::donor_shortage(target.name(), needed, pool.len()));
        }

        tracing::info!(
            collection = target.name(),
            needed,
            pool = pool.len(),
            "borrowing cells"
        );
        let borrowed = draw(&pool, needed, rng)?;
        state.claim(slot, borrowed, false);
    }
    Ok(())
}

/// Phase 3: every selection must hold exactly `quota` cells.
pub fn validate(state: &AllocationState) -> AllocationResult<()> {
    for selection in &state.selections {
        if selection.len() != state.quota {
            return Err(AllocationError::integrity(
                selection.collection.clone(),
                state.quota,
                selection.len(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use std::collections::HashSet;

    /// Builds a catalog whose collection `i` has `sizes[i]` cells with
    /// varying row counts.
    fn catalog(sizes: &[(&str, usize)]) -> CellCatalog {
        let mut catalog = CellCatalog::new();
        for &(name, n) in sizes {
            let cells: Vec<Vec<Vec<String>>> = (0..n)
                .map(|i| (0..(i % 4 + 1)).map(|r| vec![format!("{name}-{i}-{r}")]).collect())
                .collect();
            catalog.add_collection(name, ["v"], cells).unwrap();
        }
        catalog
    }

    fn assert_unique(state: &AllocationState) {
        let mut seen = HashSet::new();
        for s in state.selections() {
            for id in s.cells() {
                assert!(seen.insert(id.clone()), "{id} selected twice");
            }
        }
        assert_eq!(seen.len(), state.claimed().len());
    }

    #[test]
    fn test_self_sufficient_plus_two_deficient() {
        let catalog = catalog(&[("a", 40), ("b", 25), ("c", 28)]);
        let state = allocate(&catalog, 30, &mut create_rng(42)).unwrap();

        for s in state.selections() {
            assert_eq!(s.len(), 30);
        }
        assert_unique(&state);
        assert_eq!(state.claimed().len(), 90);

        let summary = state.summary();
        assert_eq!((summary[0].own, summary[0].borrowed), (30, 0));
        assert_eq!((summary[1].own, summary[1].borrowed), (25, 5));
        assert_eq!((summary[2].own, summary[2].borrowed), (28, 2));

        // Only "a" has a surplus, so every borrowed cell comes from it.
        for s in &state.selections()[1..] {
            assert!(s.borrowed().iter().all(|id| id.collection() == "a"));
            assert!(s.own().iter().all(|id| id.collection() == s.collection()));
        }

        let unclaimed = state.unclaimed(&catalog);
        assert_eq!(unclaimed.len(), 3);
        assert!(unclaimed.iter().all(|id| id.collection() == "a"));
    }

    #[test]
    fn test_insufficient_data_rejected_before_sampling() {
        let catalog = catalog(&[("a", 10), ("b", 10), ("c", 10)]);
        let mut rng = create_rng(0);
        let mut untouched = rng.clone();
        let err = allocate(&catalog, 30, &mut rng).unwrap_err();
        // The generator was never advanced.
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
        assert_eq!(
            err,
            AllocationError::InsufficientData {
                collections: 3,
                quota: 30,
                required: 90,
                found: 30,
            }
        );
    }

    #[test]
    fn test_total_below_required_fails_preflight_even_when_donors_empty() {
        let catalog = catalog(&[("a", 30), ("b", 30), ("c", 20)]);
        let err = allocate(&catalog, 30, &mut create_rng(0)).unwrap_err();
        assert!(matches!(err, AllocationError::InsufficientData { found: 80, .. }));
    }

    #[test]
    fn test_donor_shortage_names_collection() {
        // Without the pre-flight, exactly self-sufficient collections have
        // nothing to lend.
        let catalog = catalog(&[("a", 30), ("b", 30), ("c", 20)]);
        let mut state = AllocationState::new(&catalog, 30);
        let mut rng = create_rng(0);
        self_allocate(&catalog, &mut state, &mut rng).unwrap();
        let err = resolve_deficits(&catalog, &mut state, &mut rng).unwrap_err();
        assert_eq!(err, AllocationError::donor_shortage("c", 10, 0));
    }

    #[test]
    fn test_donor_cap_limits_lending() {
        // Skipping self-allocation leaves all of "b" unclaimed, but it may
        // still lend only its surplus of 2.
        let catalog = catalog(&[("a", 2), ("b", 5)]);
        let mut state = AllocationState::new(&catalog, 3);
        let err = resolve_deficits(&catalog, &mut state, &mut create_rng(5)).unwrap_err();
        assert_eq!(err, AllocationError::donor_shortage("a", 3, 2));
    }

    #[test]
    fn test_borrowed_cells_are_excluded_from_later_pools() {
        let catalog = catalog(&[("a", 3), ("b", 7), ("c", 2)]);
        let state = allocate(&catalog, 4, &mut create_rng(5)).unwrap();
        assert_eq!(state.selection("a").unwrap().borrowed().len(), 1);
        assert_eq!(state.selection("c").unwrap().borrowed().len(), 2);
        assert!(state.unclaimed(&catalog).is_empty());
        assert_unique(&state);
    }

    #[test]
    fn test_deficient_collection_never_lends() {
        let catalog = catalog(&[("a", 2), ("b", 8), ("c", 2)]);
        let state = allocate(&catalog, 4, &mut create_rng(9)).unwrap();
        for s in state.selections() {
            assert!(s.borrowed().iter().all(|id| id.collection() == "b"));
        }
        assert_unique(&state);
    }

    #[test]
    fn test_exact_quota_still_sampled() {
        let catalog = catalog(&[("a", 12)]);
        let state = allocate(&catalog, 12, &mut create_rng(1)).unwrap();
        let selection = state.selection("a").unwrap();
        let mut indices: Vec<usize> = selection.cells().iter().map(CellId::index).collect();
        indices.sort();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_collection_keeps_positional_order() {
        let catalog = catalog(&[("a", 10), ("b", 3)]);
        let state = allocate(&catalog, 5, &mut create_rng(1)).unwrap();
        let own: Vec<usize> = state.selection("b").unwrap().own().iter().map(CellId::index).collect();
        assert_eq!(own, vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_weight_pool_fails() {
        let mut catalog = CellCatalog::new();
        catalog
            .add_collection("a", ["v"], vec![Vec::new(), Vec::new(), Vec::new()])
            .unwrap();
        let err = allocate(&catalog, 2, &mut create_rng(0)).unwrap_err();
        assert_eq!(
            err,
            AllocationError::ZeroWeightPool {
                pool_size: 3,
                requested: 2,
            }
        );
    }

    #[test]
    fn test_zero_weight_donor_pool_fails() {
        // "b" self-allocates its two weighted cells; only its empty cell is
        // left to lend.
        let mut catalog = CellCatalog::new();
        catalog
            .add_collection("a", ["v"], vec![vec![vec!["1".to_string()]]])
            .unwrap();
        let weighted = vec![vec!["1".to_string()]; 5];
        catalog
            .add_collection("b", ["v"], vec![weighted.clone(), weighted, Vec::new()])
            .unwrap();

        let mut state = AllocationState::new(&catalog, 2);
        let mut rng = create_rng(8);
        self_allocate(&catalog, &mut state, &mut rng).unwrap();
        assert!(state.is_claimed(&CellId::new("b", 0)));
        assert!(state.is_claimed(&CellId::new("b", 1)));

        let err = resolve_deficits(&catalog, &mut state, &mut rng).unwrap_err();
        assert_eq!(
            err,
            AllocationError::ZeroWeightPool {
                pool_size: 1,
                requested: 1,
            }
        );
        assert_eq!(
            allocate(&catalog, 2, &mut create_rng(8)).unwrap_err(),
            AllocationError::ZeroWeightPool {
                pool_size: 1,
                requested: 1,
            }
        );
    }

    #[test]
    fn test_phases_reject_foreign_state() {
        let small = catalog(&[("a", 3)]);
        let big = catalog(&[("a", 3), ("b", 3)]);
        let renamed = catalog(&[("z", 3)]);
        let mut rng = create_rng(0);

        let mut state = AllocationState::new(&small, 2);
        let err = self_allocate(&big, &mut state, &mut rng).unwrap_err();
        assert!(matches!(err, AllocationError::StateMismatch { .. }));
        let err = resolve_deficits(&big, &mut state, &mut rng).unwrap_err();
        assert!(matches!(err, AllocationError::StateMismatch { .. }));

        let err = self_allocate(&renamed, &mut state, &mut rng).unwrap_err();
        assert!(err.to_string().contains("collection a"));
        assert!(state.claimed().is_empty());

        assert!(state.ensure_matches(&small).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let empty = CellCatalog::new();
        assert_eq!(
            allocate(&empty, 3, &mut create_rng(0)).unwrap_err(),
            AllocationError::EmptyCatalog
        );
        let catalog = catalog(&[("a", 3)]);
        assert_eq!(
            allocate(&catalog, 0, &mut create_rng(0)).unwrap_err(),
            AllocationError::InvalidQuota
        );
    }

    #[test]
    fn test_validate_flags_short_selection() {
        let catalog = catalog(&[("a", 3)]);
        let state = AllocationState::new(&catalog, 3);
        assert_eq!(
            validate(&state).unwrap_err(),
            AllocationError::integrity("a", 3, 0)
        );
    }

    #[test]
    fn test_deterministic_for_seed() {
        let catalog = catalog(&[("a", 40), ("b", 25), ("c", 28)]);
        let first = allocate(&catalog, 30, &mut create_rng(7)).unwrap();
        let second = allocate(&catalog, 30, &mut create_rng(7)).unwrap();
        assert_eq!(first, second);
    }
}
