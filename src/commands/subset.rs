use crate::commands::{
    ensure_output_dir, ensure_same_chromosome, for_each_pair, output_path, pair_paths, path_str,
};
use crate::merge::{count_same_position, keep_common_markers, MergeMode};
use crate::reconcile::{LogObserver, ReconcileObserver};
use crate::vcf::{read_vcf, write_vcf, WriteOptions};
use log::{debug, info};
use std::io;
use std::num::NonZeroUsize;

/// Narrow every (query, reference) pair to their common markers, writing
/// `<stem>_subset.vcf` for both sides.
pub fn run_subset(
    queries: &[String],
    references: &[String],
    output_dir: &str,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<()> {
    let pairs = pair_paths(queries, references)?;
    ensure_output_dir(output_dir)?;
    info!("Subsetting {} query/reference pairs to their common markers", pairs.len());

    for_each_pair(&pairs, |query_path, reference_path| {
        let query = read_vcf(query_path, threads)?;
        let reference = read_vcf(reference_path, threads)?;
        let chromosome = ensure_same_chromosome(&query, query_path, &reference, reference_path)?;
        query.validate()?;
        reference.validate()?;

        let mut observer = LogObserver::new(&chromosome);
        observer.same_position_found(count_same_position(
            &reference,
            &query,
            MergeMode::SingleChromosome,
        ));
        let (reference, query, _) =
            keep_common_markers(reference, query, MergeMode::SingleChromosome, &mut observer);
        observer.dataset_summary("reference", "after subsetting to common markers", reference.len(), reference.num_samples());
        observer.dataset_summary("query", "after subsetting to common markers", query.len(), query.num_samples());

        let query_out = output_path(output_dir, query_path, "subset");
        let reference_out = output_path(output_dir, reference_path, "subset");
        debug!("Writing subsets to {} and {}", query_out.display(), reference_out.display());
        write_vcf(&query, path_str(&query_out)?, options)?;
        write_vcf(&reference, path_str(&reference_out)?, options)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;

    #[test]
    fn test_subset_keeps_common_markers_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let query = dir.path().join("q.vcf").to_str().unwrap().to_string();
        let reference = dir.path().join("r.vcf").to_str().unwrap().to_string();
        write_vcf(
            &dataset(&[("7", 10, "A", "G"), ("7", 20, "C", "T"), ("7", 30, "G", "A")]),
            &query,
            &WriteOptions::default(),
        )
        .unwrap();
        write_vcf(
            &dataset(&[("7", 10, "A", "G"), ("7", 20, "C", "A"), ("7", 40, "G", "A")]),
            &reference,
            &WriteOptions::default(),
        )
        .unwrap();

        let out = dir.path().join("out");
        let threads = NonZeroUsize::new(2).unwrap();
        run_subset(&[query], &[reference], out.to_str().unwrap(), &WriteOptions::default(), threads)
            .unwrap();

        for name in ["q_subset.vcf", "r_subset.vcf"] {
            let ds = read_vcf(out.join(name).to_str().unwrap(), threads).unwrap();
            assert_eq!(ds.len(), 1);
            assert_eq!(ds.position(0), 10);
        }
    }

    #[test]
    fn test_subset_rejects_unsorted_pair() {
        let dir = tempfile::TempDir::new().unwrap();
        let query = dir.path().join("q.vcf").to_str().unwrap().to_string();
        let reference = dir.path().join("r.vcf").to_str().unwrap().to_string();
        write_vcf(
            &dataset(&[("7", 30, "A", "G"), ("7", 10, "C", "T")]),
            &query,
            &WriteOptions::default(),
        )
        .unwrap();
        write_vcf(
            &dataset(&[("7", 10, "C", "T"), ("7", 30, "A", "G")]),
            &reference,
            &WriteOptions::default(),
        )
        .unwrap();

        let out = dir.path().join("out");
        let err = run_subset(
            &[query],
            &[reference],
            out.to_str().unwrap(),
            &WriteOptions::default(),
            NonZeroUsize::new(1).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!out.join("q_subset.vcf").exists());
    }
}
