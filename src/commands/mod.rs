pub mod clean;
pub mod common_indexes;
pub mod divergence;
pub mod partition;
pub mod rename;
pub mod subset;

use crate::dataset::VariantDataset;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

const VCF_SUFFIXES: [&str; 4] = [".vcf.gz", ".vcf.bgz", ".vcf", ".bgz"];

/// File name of `path` without directories and VCF/compression suffixes
pub fn output_stem(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    VCF_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name.as_str())
        .to_string()
}

/// `<output_dir>/<stem of input>_<tag>.vcf`, compressed when the input was
pub fn output_path(output_dir: &str, input: &str, tag: &str) -> PathBuf {
    let extension = if [".gz", ".bgz"].iter().any(|e| input.ends_with(e)) {
        "vcf.gz"
    } else {
        "vcf"
    };
    Path::new(output_dir).join(format!("{}_{}.{}", output_stem(input), tag, extension))
}

pub fn ensure_output_dir(output_dir: &str) -> io::Result<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to create output directory '{}': {}", output_dir, e),
        )
    })
}

pub fn path_str(path: &Path) -> io::Result<&str> {
    path.to_str().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Path '{}' is not valid UTF-8", path.display()),
        )
    })
}

/// Pair each query file with the reference file at the same position
pub fn pair_paths(queries: &[String], references: &[String]) -> io::Result<Vec<(String, String)>> {
    if queries.len() != references.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Got {} query files but {} reference files; they are paired by position",
                queries.len(),
                references.len()
            ),
        ));
    }
    Ok(queries
        .iter()
        .cloned()
        .zip(references.iter().cloned())
        .collect())
}

/// The only chromosome of a dataset that must hold exactly one
pub fn single_chromosome(dataset: &VariantDataset, path: &str) -> io::Result<String> {
    let mut chromosomes = dataset.chromosomes();
    if chromosomes.len() != 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "'{}' holds data for {} chromosomes, expected one. Split it first with the partition command",
                path,
                chromosomes.len()
            ),
        ));
    }
    Ok(chromosomes.swap_remove(0))
}

/// Check that the two datasets of a pair cover the same single chromosome
pub fn ensure_same_chromosome(
    query: &VariantDataset,
    query_path: &str,
    reference: &VariantDataset,
    reference_path: &str,
) -> io::Result<String> {
    let query_chromosome = single_chromosome(query, query_path)?;
    let reference_chromosome = single_chromosome(reference, reference_path)?;
    if query_chromosome != reference_chromosome {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "'{}' holds chromosome {} but '{}' holds chromosome {}. Check the order of the inputs",
                query_path, query_chromosome, reference_path, reference_chromosome
            ),
        ));
    }
    Ok(query_chromosome)
}

/// Run `job` on every (query, reference) pair in parallel, stopping at the first error
pub fn for_each_pair<F>(pairs: &[(String, String)], job: F) -> io::Result<()>
where
    F: Fn(&str, &str) -> io::Result<()> + Sync,
{
    pairs
        .par_iter()
        .map(|(query, reference)| job(query, reference))
        .collect::<io::Result<Vec<()>>>()?;
    Ok(())
}
