use crate::commands::{
    ensure_output_dir, ensure_same_chromosome, for_each_pair, output_path, pair_paths, path_str,
    single_chromosome,
};
use crate::reconcile::{clean_pair, clean_query, CleanConfig, LogObserver, ReconcileObserver};
use crate::vcf::{read_vcf, write_vcf, WriteOptions};
use log::{debug, info};
use rayon::prelude::*;
use std::io;
use std::num::NonZeroUsize;

const CLEANED_TAG: &str = "cleaned";

/// Clean every (query, reference) pair of single-chromosome VCF files and write
/// `<stem>_cleaned.vcf` for both sides. Without reference files, each query is
/// cleaned on its own.
pub fn run_clean(
    queries: &[String],
    references: &[String],
    output_dir: &str,
    config: &CleanConfig,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<()> {
    config.validate()?;
    ensure_output_dir(output_dir)?;

    if references.is_empty() {
        info!("No reference files given, cleaning {} query files on their own", queries.len());
        return queries
            .par_iter()
            .map(|query| clean_query_file(query, output_dir, config, options, threads))
            .collect::<io::Result<Vec<()>>>()
            .map(|_| ());
    }

    let pairs = pair_paths(queries, references)?;
    info!("Cleaning {} query/reference pairs", pairs.len());
    for_each_pair(&pairs, |query, reference| {
        clean_pair_files(query, reference, output_dir, config, options, threads)
    })
}

fn clean_query_file(
    query_path: &str,
    output_dir: &str,
    config: &CleanConfig,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<()> {
    let query = read_vcf(query_path, threads)?;
    let chromosome = single_chromosome(&query, query_path)?;
    let mut observer = LogObserver::new(&chromosome);
    observer.dataset_summary("query", "before cleaning", query.len(), query.num_samples());

    let query = clean_query(query, config, &mut observer)?;

    let path = output_path(output_dir, query_path, CLEANED_TAG);
    debug!("Writing cleaned query to {}", path.display());
    write_vcf(&query, path_str(&path)?, options)
}

fn clean_pair_files(
    query_path: &str,
    reference_path: &str,
    output_dir: &str,
    config: &CleanConfig,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<()> {
    let query = read_vcf(query_path, threads)?;
    let reference = read_vcf(reference_path, threads)?;
    let chromosome = ensure_same_chromosome(&query, query_path, &reference, reference_path)?;
    debug!("Cleaning chromosome {}", chromosome);

    let mut observer = LogObserver::new(&chromosome);
    observer.dataset_summary("query", "before cleaning", query.len(), query.num_samples());
    observer.dataset_summary("reference", "before cleaning", reference.len(), reference.num_samples());
    debug!(
        "[{}] {:.2}% of query SNPs and {:.2}% of reference SNPs have missing calls",
        chromosome,
        query.genotypes().missing_marker_percentage(),
        reference.genotypes().missing_marker_percentage()
    );

    let (reference, query) = clean_pair(reference, query, config, &mut observer)?;
    observer.dataset_summary("query", "after cleaning", query.len(), query.num_samples());
    observer.dataset_summary("reference", "after cleaning", reference.len(), reference.num_samples());

    let query_out = output_path(output_dir, query_path, CLEANED_TAG);
    let reference_out = output_path(output_dir, reference_path, CLEANED_TAG);
    debug!("Writing cleaned query to {}", query_out.display());
    write_vcf(&query, path_str(&query_out)?, options)?;
    debug!("Writing cleaned reference to {}", reference_out.display());
    write_vcf(&reference, path_str(&reference_out)?, options)
}
