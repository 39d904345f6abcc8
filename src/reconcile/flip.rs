use crate::dataset::VariantDataset;
use crate::merge::{synchronized_merge, MergeMode};
use crate::reconcile::observer::ReconcileObserver;
use log::debug;

/// REF and ALT are swapped between the two markers. Markers without an ALT
/// allele are never flips.
pub fn is_flip(reference: &VariantDataset, i: usize, query: &VariantDataset, j: usize) -> bool {
    !reference.alternates(i).is_empty()
        && !query.alternates(j).is_empty()
        && reference.reference(i) == query.alternate(j)
        && reference.alternate(i) == query.reference(j)
}

/// Indexes of the query markers whose REF/ALT are swapped relative to the reference
pub fn find_flips(reference: &VariantDataset, query: &VariantDataset, mode: MergeMode) -> (Vec<usize>, usize) {
    let outcome = synchronized_merge(reference, query, mode, |i, j| is_flip(reference, i, query, j));
    (outcome.right, outcome.same_position)
}

/// Swap REF/ALT and invert the 0/1 calls of the markers at `indexes`.
///
/// Each marker is flipped once even if listed more than once.
pub fn flip_markers(mut dataset: VariantDataset, indexes: &[usize]) -> VariantDataset {
    let mut indexes = indexes.to_vec();
    indexes.sort_unstable();
    indexes.dedup();

    let mut ones_before = 0;
    let mut zeros_after = 0;
    for &idx in &indexes {
        let (ones, zeros) = dataset.flip_marker(idx);
        ones_before += ones;
        zeros_after += zeros;
    }

    assert_eq!(
        ones_before, zeros_after,
        "The zeros and ones were not swapped correctly"
    );
    dataset
}

/// Correct the flips of `query` with respect to `reference`.
///
/// Markers at the same position that are neither a direct match nor a flip are
/// left untouched.
pub fn correct_flips(
    reference: &VariantDataset,
    query: VariantDataset,
    mode: MergeMode,
    observer: &mut dyn ReconcileObserver,
) -> VariantDataset {
    let (flips, same_position) = find_flips(reference, &query, mode);
    observer.same_position_found(same_position);
    observer.flips_found(flips.len());

    debug!("Correcting {} SNP flips", flips.len());
    flip_markers(query, &flips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;
    use crate::dataset::MarkerRecord;
    use crate::genotype::MISSING;
    use crate::reconcile::observer::CountingObserver;

    #[test]
    fn test_flip_scenario() {
        let reference = dataset(&[("chr1", 500, "A", "G")]);
        let query = VariantDataset::from_records(
            vec!["s1".to_string(), "s2".to_string()],
            vec![MarkerRecord::snp("chr1", 500, "G", "A")],
            &[vec![[1, 0], [0, 1]]],
        );
        let mut observer = CountingObserver::default();

        let query = correct_flips(&reference, query, MergeMode::SingleChromosome, &mut observer);
        assert_eq!(query.reference(0), "A");
        assert_eq!(query.alternate(0), "G");
        assert_eq!(query.genotypes().get(0, 0), [0, 1]);
        assert_eq!(query.genotypes().get(0, 1), [1, 0]);
        assert_eq!(observer.flips, Some(1));
        assert_eq!(observer.same_position, Some(1));
    }

    #[test]
    fn test_marker_without_alternate_is_not_a_flip() {
        let reference = dataset(&[("chr1", 5, "", "G")]);
        let query = VariantDataset::from_records(
            vec!["s1".to_string()],
            vec![MarkerRecord {
                alternate: Vec::new(),
                ..MarkerRecord::snp("chr1", 5, "G", "")
            }],
            &[vec![[0, 0]]],
        );
        let mut observer = CountingObserver::default();

        let corrected = correct_flips(&reference, query.clone(), MergeMode::SingleChromosome, &mut observer);
        assert_eq!(observer.flips, Some(0));
        assert_eq!(observer.same_position, Some(1));
        assert_eq!(corrected, query);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let original = VariantDataset::from_records(
            vec!["s1".to_string(), "s2".to_string()],
            vec![
                MarkerRecord::snp("chr1", 10, "C", "T"),
                MarkerRecord::snp("chr1", 20, "G", "A"),
            ],
            &[vec![[1, MISSING], [0, 0]], vec![[1, 1], [0, 1]]],
        );

        let flipped = flip_markers(original.clone(), &[0, 1]);
        assert_ne!(flipped, original);
        assert_eq!(flipped.genotypes().get(0, 0), [0, MISSING]);
        assert_eq!(flip_markers(flipped, &[1, 0]), original);
    }

    #[test]
    fn test_duplicate_indexes_flip_once() {
        let original = dataset(&[("chr1", 10, "C", "T")]);
        let flipped = flip_markers(original, &[0, 0]);
        assert_eq!(flipped.reference(0), "T");
        assert_eq!(flipped.genotypes().get(0, 0), [1, 0]);
    }

    #[test]
    fn test_non_flipped_markers_untouched() {
        let reference = dataset(&[
            ("chr1", 100, "A", "G"),
            ("chr1", 200, "C", "T"),
            ("chr1", 300, "G", "T"),
        ]);
        let query = dataset(&[
            ("chr1", 100, "A", "G"), // direct match
            ("chr1", 200, "T", "C"), // flip
            ("chr1", 300, "A", "C"), // mismatch
        ]);
        let mut observer = CountingObserver::default();

        let corrected = correct_flips(&reference, query.clone(), MergeMode::SingleChromosome, &mut observer);
        assert_eq!(observer.flips, Some(1));
        assert_eq!((corrected.reference(0), corrected.alternate(0)), ("A", "G"));
        assert_eq!((corrected.reference(1), corrected.alternate(1)), ("C", "T"));
        assert_eq!((corrected.reference(2), corrected.alternate(2)), ("A", "C"));
        assert_eq!(corrected.genotypes().get(0, 0), query.genotypes().get(0, 0));
        assert_eq!(corrected.genotypes().get(2, 0), query.genotypes().get(2, 0));
    }
}
