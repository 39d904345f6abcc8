use crate::chromosome::ChromosomeRenamer;
use crate::commands::{ensure_output_dir, output_path, path_str};
use crate::vcf::{read_vcf, write_vcf, WriteOptions};
use log::{debug, info};
use std::io;
use std::num::NonZeroUsize;

/// Split a multi-chromosome VCF into one file per chromosome, in order of first
/// appearance, renaming chromosome labels with `renamer`.
///
/// Returns the paths written.
pub fn run_partition(
    query: &str,
    output_dir: &str,
    renamer: &ChromosomeRenamer,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<Vec<String>> {
    let dataset = read_vcf(query, threads)?;
    info!(
        "There are {} SNPs and {} samples in total",
        dataset.len(),
        dataset.num_samples()
    );

    let chromosomes = dataset.chromosomes();
    info!("There are {} chromosomes in total", chromosomes.len());
    ensure_output_dir(output_dir)?;

    let mut written = Vec::with_capacity(chromosomes.len());
    for chromosome in &chromosomes {
        debug!("Filtering {} for chromosome {}", query, chromosome);
        let mut part = dataset.clone().filter_by_chromosome(chromosome);
        info!(
            "There are {} SNPs and {} samples in chromosome {}",
            part.len(),
            part.num_samples(),
            chromosome
        );

        let new_chromosome = renamer.rename(chromosome);
        if new_chromosome != *chromosome {
            debug!("Renaming chromosome {} to {}", chromosome, new_chromosome);
            part.rename_chromosomes(renamer);
        }

        let path = output_path(output_dir, query, &new_chromosome);
        let path = path_str(&path)?.to_string();
        write_vcf(&part, &path, options)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_partition_writes_one_file_per_chromosome() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("query.vcf");
        let input = input.to_str().unwrap();
        let ds = dataset(&[
            ("2", 10, "A", "G"),
            ("2", 20, "C", "T"),
            ("1", 5, "G", "A"),
            ("X", 7, "T", "C"),
        ]);
        write_vcf(&ds, input, &WriteOptions::default()).unwrap();

        let out = dir.path().join("parts");
        let out = out.to_str().unwrap();
        let threads = NonZeroUsize::new(1).unwrap();
        let written =
            run_partition(input, out, &ChromosomeRenamer::TogglePrefix, &WriteOptions::default(), threads)
                .unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| std::path::Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["query_chr2.vcf", "query_chr1.vcf", "query_X.vcf"]);

        let chr2 = read_vcf(&written[0], threads).unwrap();
        assert_eq!(chr2.len(), 2);
        assert_eq!(chr2.chromosomes(), vec!["chr2".to_string()]);
    }

    #[test]
    fn test_partition_with_map_and_identity() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("array.vcf");
        let input = input.to_str().unwrap();
        write_vcf(
            &dataset(&[("chr1", 10, "A", "G"), ("chrUn", 20, "C", "T")]),
            input,
            &WriteOptions::default(),
        )
        .unwrap();
        let out = dir.path().to_str().unwrap();
        let threads = NonZeroUsize::new(1).unwrap();

        let mut map = FxHashMap::default();
        map.insert("chr1".to_string(), "1".to_string());
        let written =
            run_partition(input, out, &ChromosomeRenamer::Map(map), &WriteOptions::default(), threads)
                .unwrap();
        assert!(written[0].ends_with("array_1.vcf"));
        assert!(written[1].ends_with("array_chrUn.vcf"));

        let written =
            run_partition(input, out, &ChromosomeRenamer::Identity, &WriteOptions::default(), threads)
                .unwrap();
        assert!(written[0].ends_with("array_chr1.vcf"));
    }
}
