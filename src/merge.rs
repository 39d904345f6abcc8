//! Synchronized merge of two position-sorted marker streams.
//!
//! Every reconciliation step that pairs markers across datasets goes through
//! [`synchronized_merge`]: a two-pointer merge-join that visits each dataset
//! once and hands every same-key pair to an acceptance predicate.

use crate::chromosome::{compare_chromosomes, compare_ranked, rank_labels, ChromosomeRank};
use crate::dataset::VariantDataset;
use crate::reconcile::observer::ReconcileObserver;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Both datasets hold a single chromosome; markers are ordered by position
    SingleChromosome,
    /// Markers are grouped by chromosome, ordered by chromosome rank then position
    MultiChromosome,
}

impl MergeMode {
    /// Single-chromosome mode when both datasets hold the same single
    /// chromosome (or one of them is empty)
    pub fn for_datasets(a: &VariantDataset, b: &VariantDataset) -> Self {
        match (a.chromosomes().as_slice(), b.chromosomes().as_slice()) {
            ([], []) | ([], [_]) | ([_], []) => MergeMode::SingleChromosome,
            ([x], [y]) if compare_chromosomes(x, y) == Ordering::Equal => MergeMode::SingleChromosome,
            _ => MergeMode::MultiChromosome,
        }
    }
}

/// Index pairs produced by a merge: `left[k]` pairs with `right[k]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    /// Number of same-key coincidences visited, accepted or not
    pub same_position: usize,
}

/// Aligned indexes of the common markers of a reference and a query dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonMarkers {
    pub reference: Vec<usize>,
    pub query: Vec<usize>,
}

impl CommonMarkers {
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

struct MergeKeys<'a> {
    left: &'a VariantDataset,
    right: &'a VariantDataset,
    ranks: Option<(Vec<ChromosomeRank>, Vec<ChromosomeRank>)>,
}

impl<'a> MergeKeys<'a> {
    fn new(left: &'a VariantDataset, right: &'a VariantDataset, mode: MergeMode) -> Self {
        let ranks = match mode {
            MergeMode::SingleChromosome => None,
            MergeMode::MultiChromosome => Some((
                rank_labels(left.chromosome_labels()),
                rank_labels(right.chromosome_labels()),
            )),
        };
        Self { left, right, ranks }
    }

    fn compare(&self, i: usize, j: usize) -> Ordering {
        let chromosome_order = match &self.ranks {
            None => Ordering::Equal,
            Some((left_ranks, right_ranks)) => compare_ranked(
                left_ranks[i],
                self.left.chromosome(i),
                right_ranks[j],
                self.right.chromosome(j),
            ),
        };
        chromosome_order.then_with(|| self.left.position(i).cmp(&self.right.position(j)))
    }
}

/// Walk both datasets in key order and record every same-key pair `(i, j)` for
/// which `accept(i, j)` holds. Both cursors advance after any coincidence.
///
/// Inputs must be sorted by the key of `mode`; unsorted input yields an
/// undercount rather than an error.
pub fn synchronized_merge<F>(
    left: &VariantDataset,
    right: &VariantDataset,
    mode: MergeMode,
    mut accept: F,
) -> MergeOutcome
where
    F: FnMut(usize, usize) -> bool,
{
    let keys = MergeKeys::new(left, right, mode);
    let mut outcome = MergeOutcome::default();

    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match keys.compare(i, j) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                outcome.same_position += 1;
                if accept(i, j) {
                    outcome.left.push(i);
                    outcome.right.push(j);
                }
                i += 1;
                j += 1;
            }
        }
    }

    assert_eq!(
        outcome.left.len(),
        outcome.right.len(),
        "Merge produced index lists of different lengths"
    );
    outcome
}

/// REF and first ALT are identical in both datasets
pub fn alleles_match(a: &VariantDataset, i: usize, b: &VariantDataset, j: usize) -> bool {
    a.reference(i) == b.reference(j) && a.alternate(i) == b.alternate(j)
}

/// Indexes of the markers present in both datasets with the same REF and ALT
pub fn common_markers(
    reference: &VariantDataset,
    query: &VariantDataset,
    mode: MergeMode,
) -> CommonMarkers {
    let outcome = synchronized_merge(reference, query, mode, |i, j| {
        alleles_match(reference, i, query, j)
    });
    CommonMarkers {
        reference: outcome.left,
        query: outcome.right,
    }
}

/// Narrow both datasets to their common markers
pub fn keep_common_markers(
    reference: VariantDataset,
    query: VariantDataset,
    mode: MergeMode,
    observer: &mut dyn ReconcileObserver,
) -> (VariantDataset, VariantDataset, CommonMarkers) {
    let common = common_markers(&reference, &query, mode);
    observer.common_markers_found(common.len());

    let reference = reference.select(&common.reference);
    let query = query.select(&common.query);
    (reference, query, common)
}

/// Number of markers found at the same key in both datasets, regardless of alleles
pub fn count_same_position(a: &VariantDataset, b: &VariantDataset, mode: MergeMode) -> usize {
    synchronized_merge(a, b, mode, |_, _| false).same_position
}
