use crate::dataset::VariantDataset;
use crate::genotype::combine_strands;
use crate::merge::{common_markers, MergeMode};
use crate::reconcile::observer::ReconcileObserver;
use log::debug;
use std::io;

/// Reject thresholds outside `[0, 1]`
pub fn validate_threshold(threshold: f64) -> io::Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Divergence threshold must be between 0.0 and 1.0, got {}",
                threshold
            ),
        ));
    }
    Ok(())
}

/// Mean allele frequency of each marker in `indexes`, averaging maternal and
/// paternal calls per sample and then across samples. Samples with a missing
/// call at a marker do not contribute to its mean.
pub fn allele_frequency_means(dataset: &VariantDataset, indexes: &[usize]) -> Vec<Option<f64>> {
    let strands = dataset.genotypes().split_strands().select_columns(indexes);
    combine_strands(&strands).column_means()
}

/// Remove the common markers whose mean allele frequency differs by more than
/// `threshold` between the two datasets. Markers with no observed call on
/// either side are kept.
pub fn remove_divergent(
    reference: VariantDataset,
    query: VariantDataset,
    threshold: f64,
    mode: MergeMode,
    observer: &mut dyn ReconcileObserver,
) -> io::Result<(VariantDataset, VariantDataset)> {
    validate_threshold(threshold)?;

    let common = common_markers(&reference, &query, mode);
    observer.common_markers_found(common.len());

    let reference_means = allele_frequency_means(&reference, &common.reference);
    let query_means = allele_frequency_means(&query, &common.query);

    let mut reference_to_remove = Vec::new();
    let mut query_to_remove = Vec::new();
    let mut unobserved = 0;
    for (k, (mean_ref, mean_query)) in reference_means.iter().zip(&query_means).enumerate() {
        match (mean_ref, mean_query) {
            (Some(mean_ref), Some(mean_query)) => {
                if (mean_ref - mean_query).abs() > threshold {
                    reference_to_remove.push(common.reference[k]);
                    query_to_remove.push(common.query[k]);
                }
            }
            _ => unobserved += 1,
        }
    }
    if unobserved > 0 {
        debug!(
            "{} common markers have no observed calls in one of the datasets and are kept",
            unobserved
        );
    }

    let divergent = reference_to_remove.len();
    assert_eq!(
        divergent,
        query_to_remove.len(),
        "The amount of indexes removed in each dataset is not the same"
    );
    observer.divergent_found(divergent, threshold);

    let reference = reference.remove(&reference_to_remove);
    let query = query.remove(&query_to_remove);
    observer.dataset_summary("reference", "after removing divergent SNPs", reference.len(), reference.num_samples());
    observer.dataset_summary("query", "after removing divergent SNPs", query.len(), query.num_samples());
    Ok((reference, query))
}
