use crate::chromosome::compare_chromosomes;
use crate::dataset::VariantDataset;
use crate::genotype::MISSING;
use crate::merge::MergeMode;
use crate::reconcile::ambiguity::remove_ambiguous;
use crate::reconcile::divergence::{remove_divergent, validate_threshold};
use crate::reconcile::flip::correct_flips;
use crate::reconcile::mismatch::remove_mismatches;
use crate::reconcile::observer::ReconcileObserver;
use crate::sample_filter::SampleFilter;
use log::debug;
use std::cmp::Ordering;
use std::io;

/// Configuration for cleaning a reference/query pair
#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    pub remove_sample_ids_query: Vec<String>,
    pub remove_sample_ids_reference: Vec<String>,
    pub remove_ambiguous_query: bool,
    pub remove_ambiguous_reference: bool,
    pub correct_flips: bool,
    pub remove_mismatches: bool,
    pub divergence_threshold: Option<f64>,
    /// Allele value written in place of missing query calls
    pub fill_missing_query: Option<i8>,
    pub fill_missing_reference: Option<i8>,
}

impl CleanConfig {
    pub fn validate(&self) -> io::Result<()> {
        if let Some(threshold) = self.divergence_threshold {
            validate_threshold(threshold)?;
        }
        for fill in [self.fill_missing_query, self.fill_missing_reference].into_iter().flatten() {
            if fill < 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Missing calls can only be replaced by an allele index, got {}", fill),
                ));
            }
        }
        Ok(())
    }

    /// Any enabled stage or option that involves the reference dataset
    pub fn needs_reference(&self) -> bool {
        self.correct_flips
            || self.remove_mismatches
            || self.divergence_threshold.is_some()
            || self.remove_ambiguous_reference
            || self.fill_missing_reference.is_some()
            || !self.remove_sample_ids_reference.is_empty()
    }
}

/// Run the enabled cleaning stages on one reference/query pair, in order:
/// sample removal, ambiguous SNP removal, flip correction, mismatch removal,
/// divergence filtering and finally replacement of missing calls.
pub fn clean_pair(
    reference: VariantDataset,
    query: VariantDataset,
    config: &CleanConfig,
    observer: &mut dyn ReconcileObserver,
) -> io::Result<(VariantDataset, VariantDataset)> {
    config.validate()?;
    reference.validate()?;
    query.validate()?;
    ensure_matching_chromosome(&reference, &query)?;

    let query_filter = SampleFilter::from_substrings(&config.remove_sample_ids_query)?;
    let reference_filter = SampleFilter::from_substrings(&config.remove_sample_ids_reference)?;

    let mode = MergeMode::for_datasets(&reference, &query);
    debug!("Merging markers in {:?} mode", mode);

    let mut query = query;
    let mut reference = reference;

    if let Some(filter) = query_filter {
        debug!("Removing samples by ID from the query");
        query = filter.apply(query, "query").0;
        observer.dataset_summary("query", "after removing undesired samples", query.len(), query.num_samples());
    }
    if let Some(filter) = reference_filter {
        debug!("Removing samples by ID from the reference");
        reference = filter.apply(reference, "reference").0;
        observer.dataset_summary("reference", "after removing undesired samples", reference.len(), reference.num_samples());
    }

    if config.remove_ambiguous_query {
        debug!("Searching and removing ambiguous SNPs in the query");
        query = remove_ambiguous(query, "query", observer).0;
    }
    if config.remove_ambiguous_reference {
        debug!("Searching and removing ambiguous SNPs in the reference");
        reference = remove_ambiguous(reference, "reference", observer).0;
    }

    if config.correct_flips {
        debug!("Searching and correcting SNP flips in the query with respect to the reference");
        query = correct_flips(&reference, query, mode, observer);
    }

    if config.remove_mismatches {
        debug!("Searching and removing mismatching SNPs between the reference and the query");
        (reference, query) = remove_mismatches(reference, query, mode, observer);
    }

    if let Some(threshold) = config.divergence_threshold {
        debug!("Removing SNPs with a mean absolute difference higher than {}", threshold);
        (reference, query) = remove_divergent(reference, query, threshold, mode, observer)?;
    }

    if let Some(fill) = config.fill_missing_query {
        let replaced = query.rename_missing_calls(MISSING, fill);
        debug!("Replaced {} missing calls in the query by {}", replaced, fill);
    }
    if let Some(fill) = config.fill_missing_reference {
        let replaced = reference.rename_missing_calls(MISSING, fill);
        debug!("Replaced {} missing calls in the reference by {}", replaced, fill);
    }

    Ok((reference, query))
}

/// Two single-chromosome datasets must hold the same chromosome
fn ensure_matching_chromosome(reference: &VariantDataset, query: &VariantDataset) -> io::Result<()> {
    if let ([reference_chrom], [query_chrom]) =
        (reference.chromosomes().as_slice(), query.chromosomes().as_slice())
    {
        if compare_chromosomes(reference_chrom, query_chrom) != Ordering::Equal {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "The reference holds chromosome {} but the query holds chromosome {}",
                    reference_chrom, query_chrom
                ),
            ));
        }
    }
    Ok(())
}

/// Clean a query on its own. Only the stages that need no reference may be enabled.
pub fn clean_query(
    query: VariantDataset,
    config: &CleanConfig,
    observer: &mut dyn ReconcileObserver,
) -> io::Result<VariantDataset> {
    config.validate()?;
    if config.needs_reference() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Flip correction, mismatch removal, divergence filtering and reference options need a reference dataset",
        ));
    }

    let mut query = query;
    if let Some(filter) = SampleFilter::from_substrings(&config.remove_sample_ids_query)? {
        query = filter.apply(query, "query").0;
        observer.dataset_summary("query", "after removing undesired samples", query.len(), query.num_samples());
    }
    if config.remove_ambiguous_query {
        query = remove_ambiguous(query, "query", observer).0;
    }
    if let Some(fill) = config.fill_missing_query {
        let replaced = query.rename_missing_calls(MISSING, fill);
        debug!("Replaced {} missing calls in the query by {}", replaced, fill);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MarkerRecord;
    use crate::merge::common_markers;
    use crate::reconcile::observer::CountingObserver;

    fn build(samples: &[&str], markers: &[(u64, &str, &str)], rows: &[Vec<[i8; 2]>]) -> VariantDataset {
        VariantDataset::from_records(
            samples.iter().map(|s| s.to_string()).collect(),
            markers
                .iter()
                .map(|&(pos, r, a)| MarkerRecord::snp("chr1", pos, r, a))
                .collect(),
            rows,
        )
    }

    #[test]
    fn test_clean_pair_full_pipeline() {
        let reference = build(
            &["r1"],
            &[(100, "A", "G"), (150, "C", "T"), (200, "C", "T"), (300, "G", "T"), (400, "A", "T")],
            &[
                vec![[0, 1]],
                vec![[0, 0]],
                vec![[1, 1]],
                vec![[0, 1]],
                vec![[0, 1]],
            ],
        );
        let query = build(
            &["q1", "wolf7"],
            &[(100, "G", "A"), (150, "A", "T"), (200, "C", "T"), (300, "G", "C")],
            &[
                vec![[1, 0], [1, 1]],
                vec![[0, 1], [0, 1]],
                vec![[1, 1], [0, 0]],
                vec![[0, 1], [0, 1]],
            ],
        );
        let config = CleanConfig {
            remove_sample_ids_query: vec!["WOLF".to_string()],
            remove_ambiguous_query: true,
            remove_ambiguous_reference: true,
            correct_flips: true,
            remove_mismatches: true,
            ..Default::default()
        };
        let mut observer = CountingObserver::default();

        let (reference, query) = clean_pair(reference, query, &config, &mut observer).unwrap();

        assert_eq!(query.samples(), ["q1".to_string()]);
        assert_eq!(observer.flips, Some(1));
        assert_eq!(observer.mismatches, Some(1));
        // Query 150 A/T and reference 400 A/T were ambiguous; 300 mismatched
        let ref_positions: Vec<u64> = (0..reference.len()).map(|i| reference.position(i)).collect();
        let query_positions: Vec<u64> = (0..query.len()).map(|i| query.position(i)).collect();
        assert_eq!(ref_positions, vec![100, 150, 200]);
        assert_eq!(query_positions, vec![100, 200]);
        assert_eq!(query.genotypes().get(0, 0), [0, 1]);

        let common = common_markers(&reference, &query, MergeMode::SingleChromosome);
        assert_eq!(common.len(), 2);
    }

    #[test]
    fn test_invalid_threshold_rejected_before_any_stage() {
        let reference = build(&["r1"], &[(100, "A", "T")], &[vec![[0, 1]]]);
        let query = reference.clone();
        let config = CleanConfig {
            remove_ambiguous_query: true,
            divergence_threshold: Some(2.0),
            ..Default::default()
        };
        let mut observer = CountingObserver::default();

        let err = clean_pair(reference, query, &config, &mut observer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(observer.ambiguities.is_empty());
    }

    #[test]
    fn test_fill_missing_runs_last() {
        let reference = build(&["r1"], &[(100, "A", "G")], &[vec![[1, -1]]]);
        let query = build(&["q1"], &[(100, "G", "A")], &[vec![[-1, 1]]]);
        let config = CleanConfig {
            correct_flips: true,
            fill_missing_query: Some(0),
            ..Default::default()
        };
        let (reference, query) =
            clean_pair(reference, query, &config, &mut CountingObserver::default()).unwrap();

        // The flip leaves the missing call alone, then it is filled
        assert_eq!(query.genotypes().get(0, 0), [0, 0]);
        assert_eq!(reference.genotypes().get(0, 0), [1, -1]);

        let negative = CleanConfig {
            fill_missing_reference: Some(-2),
            ..Default::default()
        };
        assert_eq!(negative.validate().unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_clean_query_without_reference() {
        let query = build(
            &["q1", "Wolf2"],
            &[(100, "A", "T"), (200, "C", "T")],
            &[vec![[0, 1], [1, 1]], vec![[-1, 1], [0, 0]]],
        );
        let config = CleanConfig {
            remove_sample_ids_query: vec!["wolf".to_string()],
            remove_ambiguous_query: true,
            fill_missing_query: Some(0),
            ..Default::default()
        };
        let mut observer = CountingObserver::default();
        let query = clean_query(query, &config, &mut observer).unwrap();

        assert_eq!(query.len(), 1);
        assert_eq!(query.position(0), 200);
        assert_eq!(query.num_samples(), 1);
        assert_eq!(query.genotypes().get(0, 0), [0, 1]);
        assert_eq!(observer.ambiguities.len(), 1);

        let with_flips = CleanConfig {
            correct_flips: true,
            ..Default::default()
        };
        let err = clean_query(build(&["q1"], &[], &[]), &with_flips, &mut observer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let reference = build(&["r1"], &[(200, "A", "G"), (100, "C", "T")], &[vec![[0, 1]], vec![[0, 1]]]);
        let query = build(&["q1"], &[(100, "C", "T")], &[vec![[0, 1]]]);
        let err = clean_pair(reference, query, &CleanConfig::default(), &mut CountingObserver::default())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_different_chromosomes_rejected() {
        let reference = build(&["r1"], &[(100, "A", "G")], &[vec![[0, 1]]]);
        let query = VariantDataset::from_records(
            vec!["q1".to_string()],
            vec![MarkerRecord::snp("chr2", 100, "G", "A")],
            &[vec![[0, 1]]],
        );
        let config = CleanConfig {
            correct_flips: true,
            ..Default::default()
        };
        let mut observer = CountingObserver::default();
        let err = clean_pair(reference.clone(), query, &config, &mut observer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(observer.flips, None);

        // `1` and `chr1` are the same chromosome
        let query = VariantDataset::from_records(
            vec!["q1".to_string()],
            vec![MarkerRecord::snp("1", 100, "G", "A")],
            &[vec![[0, 1]]],
        );
        clean_pair(reference, query, &config, &mut observer).unwrap();
        assert_eq!(observer.flips, Some(1));
    }
}
