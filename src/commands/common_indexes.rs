use crate::merge::{common_markers, CommonMarkers, MergeMode};
use crate::reconcile::{LogObserver, ReconcileObserver};
use crate::vcf::read_vcf;
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;

/// Find the common markers of a query and a reference VCF, which may span several
/// chromosomes, and store their aligned indexes in `output`.
pub fn run_store_common_indexes(
    query_path: &str,
    reference_path: &str,
    output: &str,
    force_single_chromosome: bool,
    threads: NonZeroUsize,
) -> io::Result<CommonMarkers> {
    let query = read_vcf(query_path, threads)?;
    let reference = read_vcf(reference_path, threads)?;
    let mut observer = LogObserver::new("common indexes");
    observer.dataset_summary("query", "as read", query.len(), query.num_samples());
    observer.dataset_summary("reference", "as read", reference.len(), reference.num_samples());
    query.validate()?;
    reference.validate()?;

    let mode = if force_single_chromosome {
        MergeMode::SingleChromosome
    } else {
        MergeMode::for_datasets(&reference, &query)
    };
    debug!("Searching common markers in {:?} mode", mode);

    let common = common_markers(&reference, &query, mode);
    observer.common_markers_found(common.len());

    write_common_markers(&common, output)?;
    info!("Stored {} common marker indexes in {}", common.len(), output);
    Ok(common)
}

pub fn write_common_markers(common: &CommonMarkers, path: &str) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serde::encode_into_std_write(common, &mut writer, bincode::config::standard())
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to serialize common indexes: {:?}", e),
            )
        })?;
    writer.flush()
}

pub fn read_common_markers(path: &str) -> io::Result<CommonMarkers> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let common: CommonMarkers =
        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard()).map_err(
            |e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Failed to deserialize common indexes from {}: {:?}", path, e),
                )
            },
        )?;
    if common.reference.len() != common.query.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Common indexes in {} are not aligned ({} reference, {} query)",
                path,
                common.reference.len(),
                common.query.len()
            ),
        ));
    }
    Ok(common)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;
    use crate::vcf::{write_vcf, WriteOptions};

    #[test]
    fn test_store_common_indexes_across_chromosomes() {
        let dir = tempfile::TempDir::new().unwrap();
        let query = dir.path().join("q.vcf").to_str().unwrap().to_string();
        let reference = dir.path().join("r.vcf").to_str().unwrap().to_string();
        write_vcf(
            &dataset(&[("1", 10, "A", "G"), ("2", 5, "C", "T"), ("X", 1, "G", "A")]),
            &query,
            &WriteOptions::default(),
        )
        .unwrap();
        write_vcf(
            &dataset(&[("chr1", 10, "A", "G"), ("chr1", 11, "A", "G"), ("chr2", 5, "C", "A"), ("chrX", 1, "G", "A")]),
            &reference,
            &WriteOptions::default(),
        )
        .unwrap();
        let output = dir.path().join("indexes.bin").to_str().unwrap().to_string();

        let common =
            run_store_common_indexes(&query, &reference, &output, false, NonZeroUsize::new(1).unwrap())
                .unwrap();
        assert_eq!(common.reference, vec![0, 3]);
        assert_eq!(common.query, vec![0, 2]);
        assert_eq!(read_common_markers(&output).unwrap(), common);
    }

    #[test]
    fn test_store_common_indexes_rejects_lexicographic_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let query = dir.path().join("q.vcf").to_str().unwrap().to_string();
        let reference = dir.path().join("r.vcf").to_str().unwrap().to_string();
        write_vcf(
            &dataset(&[("1", 5, "A", "G"), ("2", 5, "A", "G"), ("10", 5, "A", "G")]),
            &query,
            &WriteOptions::default(),
        )
        .unwrap();
        write_vcf(
            &dataset(&[("chr1", 5, "A", "G"), ("chr10", 5, "A", "G"), ("chr2", 5, "A", "G")]),
            &reference,
            &WriteOptions::default(),
        )
        .unwrap();
        let output = dir.path().join("indexes.bin");

        let err = run_store_common_indexes(
            &query,
            &reference,
            output.to_str().unwrap(),
            false,
            NonZeroUsize::new(1).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!output.exists());
    }

    #[test]
    fn test_read_common_markers_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        let err = read_common_markers(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
