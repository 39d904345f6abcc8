use crate::dataset::VariantDataset;
use crate::merge::{alleles_match, synchronized_merge, MergeMode};
use crate::reconcile::observer::ReconcileObserver;
use log::debug;

/// Remove the markers at the same position whose REF or ALT differ between the
/// two datasets. Meant to run after flip correction, so that true flips are not
/// counted as mismatches.
pub fn remove_mismatches(
    reference: VariantDataset,
    query: VariantDataset,
    mode: MergeMode,
    observer: &mut dyn ReconcileObserver,
) -> (VariantDataset, VariantDataset) {
    let outcome = synchronized_merge(&reference, &query, mode, |i, j| {
        !alleles_match(&reference, i, &query, j)
    });
    observer.same_position_found(outcome.same_position);
    observer.mismatches_found(outcome.left.len());

    let (reference_len, query_len) = (reference.len(), query.len());
    debug!("Removing {} SNP mismatches", outcome.left.len());
    let reference = reference.remove(&outcome.left);
    let query = query.remove(&outcome.right);

    assert_eq!(
        reference_len - reference.len(),
        query_len - query.len(),
        "A different number of mismatching SNPs was removed from each dataset"
    );

    observer.dataset_summary("reference", "after removing mismatching SNPs", reference.len(), reference.num_samples());
    observer.dataset_summary("query", "after removing mismatching SNPs", query.len(), query.num_samples());
    (reference, query)
}
