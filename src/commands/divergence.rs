use crate::commands::{
    ensure_output_dir, ensure_same_chromosome, for_each_pair, output_path, pair_paths, path_str,
};
use crate::merge::MergeMode;
use crate::reconcile::divergence::{remove_divergent, validate_threshold};
use crate::reconcile::{LogObserver, ReconcileObserver};
use crate::vcf::{read_vcf, write_vcf, WriteOptions};
use log::debug;
use std::io;
use std::num::NonZeroUsize;

/// Remove the common SNPs whose mean allele frequency differs by more than
/// `threshold` between query and reference, writing `<stem>_removed.vcf` for both.
pub fn run_remove_divergent(
    queries: &[String],
    references: &[String],
    output_dir: &str,
    threshold: f64,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<()> {
    validate_threshold(threshold)?;
    let pairs = pair_paths(queries, references)?;
    ensure_output_dir(output_dir)?;

    for_each_pair(&pairs, |query_path, reference_path| {
        let query = read_vcf(query_path, threads)?;
        let reference = read_vcf(reference_path, threads)?;
        let chromosome = ensure_same_chromosome(&query, query_path, &reference, reference_path)?;
        query.validate()?;
        reference.validate()?;

        let mut observer = LogObserver::new(&chromosome);
        observer.dataset_summary("query", "before filtering", query.len(), query.num_samples());
        observer.dataset_summary("reference", "before filtering", reference.len(), reference.num_samples());
        let (reference, query) = remove_divergent(
            reference,
            query,
            threshold,
            MergeMode::SingleChromosome,
            &mut observer,
        )?;

        let query_out = output_path(output_dir, query_path, "removed");
        let reference_out = output_path(output_dir, reference_path, "removed");
        debug!("Writing filtered data to {} and {}", query_out.display(), reference_out.display());
        write_vcf(&query, path_str(&query_out)?, options)?;
        write_vcf(&reference, path_str(&reference_out)?, options)
    })
}
