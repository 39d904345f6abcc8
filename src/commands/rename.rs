use crate::chromosome::ChromosomeRenamer;
use crate::commands::{ensure_output_dir, output_path, path_str, single_chromosome};
use crate::vcf::{read_vcf, write_vcf, WriteOptions};
use log::{debug, info};
use std::io;
use std::num::NonZeroUsize;

/// Rename the chromosome of a single-chromosome VCF, writing
/// `<stem>_<new label>.vcf` into `output_dir`. Returns the path written.
pub fn run_rename(
    input: &str,
    output_dir: &str,
    renamer: &ChromosomeRenamer,
    options: &WriteOptions,
    threads: NonZeroUsize,
) -> io::Result<String> {
    let mut dataset = read_vcf(input, threads)?;
    info!(
        "There are {} SNPs and {} samples in total",
        dataset.len(),
        dataset.num_samples()
    );

    let chromosome = single_chromosome(&dataset, input)?;
    let new_chromosome = renamer.rename(&chromosome);
    if new_chromosome != chromosome {
        debug!("Renaming chromosome {} to {}", chromosome, new_chromosome);
        dataset.rename_chromosomes(renamer);
    }

    ensure_output_dir(output_dir)?;
    let path = output_path(output_dir, input, &new_chromosome);
    let path = path_str(&path)?.to_string();
    write_vcf(&dataset, &path, options)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;

    #[test]
    fn test_rename_toggles_prefix() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("dogs_chr3.vcf");
        let input = input.to_str().unwrap();
        write_vcf(
            &dataset(&[("chr3", 10, "A", "G"), ("chr3", 30, "C", "T")]),
            input,
            &WriteOptions::default(),
        )
        .unwrap();
        let threads = NonZeroUsize::new(1).unwrap();

        let out = dir.path().join("renamed");
        let path = run_rename(
            input,
            out.to_str().unwrap(),
            &ChromosomeRenamer::TogglePrefix,
            &WriteOptions::default(),
            threads,
        )
        .unwrap();
        assert!(path.ends_with("dogs_chr3_3.vcf"));
        assert_eq!(read_vcf(&path, threads).unwrap().chromosomes(), vec!["3".to_string()]);
    }

    #[test]
    fn test_rename_rejects_multiple_chromosomes() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("all.vcf");
        let input = input.to_str().unwrap();
        write_vcf(
            &dataset(&[("1", 10, "A", "G"), ("2", 30, "C", "T")]),
            input,
            &WriteOptions::default(),
        )
        .unwrap();

        let err = run_rename(
            input,
            dir.path().to_str().unwrap(),
            &ChromosomeRenamer::TogglePrefix,
            &WriteOptions::default(),
            NonZeroUsize::new(1).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
