use crate::chromosome::{compare_ranked, rank_labels, ChromosomeRenamer};
use crate::genotype::GenotypeMatrix;
use log::debug;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::io;

/// Per-marker fields of one variant record
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub chromosome: String,
    pub position: u64,
    pub id: String,
    pub reference: String,
    pub alternate: Vec<String>,
    pub quality: String,
}

impl MarkerRecord {
    /// Biallelic record with placeholder ID and quality
    pub fn snp(chromosome: &str, position: u64, reference: &str, alternate: &str) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            position,
            id: ".".to_string(),
            reference: reference.to_string(),
            alternate: vec![alternate.to_string()],
            quality: ".".to_string(),
        }
    }
}

/// The content of one variant file: index-aligned per-marker fields plus the
/// genotype calls of every sample.
///
/// The marker axis only changes through [`VariantDataset::select`] and
/// [`VariantDataset::remove`], which apply to every per-marker field at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantDataset {
    chromosome: Vec<String>,
    position: Vec<u64>,
    id: Vec<String>,
    reference: Vec<String>,
    alternate: Vec<Vec<String>>,
    quality: Vec<String>,
    genotypes: GenotypeMatrix,
    samples: Vec<String>,
}

impl VariantDataset {
    pub fn new(samples: Vec<String>) -> Self {
        let genotypes = GenotypeMatrix::new(samples.len());
        Self {
            samples,
            genotypes,
            ..Default::default()
        }
    }

    /// Append a marker with its calls (`[s0_mat, s0_pat, s1_mat, ...]`)
    pub fn push(&mut self, record: MarkerRecord, calls: &[i8]) {
        self.genotypes.push_marker(calls);
        self.chromosome.push(record.chromosome);
        self.position.push(record.position);
        self.id.push(record.id);
        self.reference.push(record.reference);
        self.alternate.push(record.alternate);
        self.quality.push(record.quality);
    }

    /// Build a dataset from records and `[maternal, paternal]` rows
    pub fn from_records(
        samples: Vec<String>,
        records: Vec<MarkerRecord>,
        genotypes: &[Vec<[i8; 2]>],
    ) -> Self {
        assert_eq!(records.len(), genotypes.len(), "One genotype row per record is required");
        let mut dataset = Self::new(samples);
        for (record, row) in records.into_iter().zip(genotypes) {
            let calls: Vec<i8> = row.iter().flat_map(|pair| pair.iter().copied()).collect();
            dataset.push(record, &calls);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn chromosome(&self, idx: usize) -> &str {
        &self.chromosome[idx]
    }

    pub fn chromosome_labels(&self) -> &[String] {
        &self.chromosome
    }

    pub fn position(&self, idx: usize) -> u64 {
        self.position[idx]
    }

    pub fn id(&self, idx: usize) -> &str {
        &self.id[idx]
    }

    pub fn reference(&self, idx: usize) -> &str {
        &self.reference[idx]
    }

    /// First alternate allele, or an empty string when the record has none
    pub fn alternate(&self, idx: usize) -> &str {
        self.alternate[idx].first().map_or("", String::as_str)
    }

    pub fn alternates(&self, idx: usize) -> &[String] {
        &self.alternate[idx]
    }

    pub fn quality(&self, idx: usize) -> &str {
        &self.quality[idx]
    }

    pub fn genotypes(&self) -> &GenotypeMatrix {
        &self.genotypes
    }

    /// Keep exactly the markers at `indexes`, in the order of `indexes`
    pub fn select(self, indexes: &[usize]) -> Self {
        self.assert_aligned();
        let len = self.len();
        for &idx in indexes {
            assert!(idx < len, "Marker index {} out of range ({} markers)", idx, len);
        }

        let dataset = Self {
            chromosome: pick(&self.chromosome, indexes),
            position: indexes.iter().map(|&i| self.position[i]).collect(),
            id: pick(&self.id, indexes),
            reference: pick(&self.reference, indexes),
            alternate: pick(&self.alternate, indexes),
            quality: pick(&self.quality, indexes),
            genotypes: self.genotypes.select_markers(indexes),
            samples: self.samples,
        };
        dataset.assert_aligned();
        dataset
    }

    /// Delete the markers at `indexes`, keeping the relative order of the rest.
    /// Order and repetitions in `indexes` do not matter.
    pub fn remove(self, indexes: &[usize]) -> Self {
        let len = self.len();
        let mut drop = vec![false; len];
        for &idx in indexes {
            assert!(idx < len, "Marker index {} out of range ({} markers)", idx, len);
            drop[idx] = true;
        }
        let keep: Vec<usize> = (0..len).filter(|&i| !drop[i]).collect();
        self.select(&keep)
    }

    /// Swap REF and the first ALT of a marker and invert its 0/1 calls.
    ///
    /// Returns `(ones_before, zeros_after)` over the marker's calls.
    pub(crate) fn flip_marker(&mut self, idx: usize) -> (usize, usize) {
        let alternate = self.alternate[idx]
            .first_mut()
            .expect("cannot flip a marker without an alternate allele");
        std::mem::swap(&mut self.reference[idx], alternate);
        self.genotypes.invert_marker(idx)
    }

    /// Keep the samples whose flag in `keep` is set
    pub fn select_samples(self, keep: &[bool]) -> Self {
        assert_eq!(keep.len(), self.samples.len(), "Sample mask length mismatch");
        let samples = self
            .samples
            .iter()
            .zip(keep)
            .filter(|(_, k)| **k)
            .map(|(s, _)| s.clone())
            .collect();
        let genotypes = self.genotypes.select_samples(keep);
        Self {
            samples,
            genotypes,
            ..self
        }
    }

    /// Unique chromosome labels in order of first appearance
    pub fn chromosomes(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        self.chromosome
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect()
    }

    /// Markers of one chromosome only
    pub fn filter_by_chromosome(self, chromosome: &str) -> Self {
        let indexes: Vec<usize> = (0..self.len())
            .filter(|&i| self.chromosome[i] == chromosome)
            .collect();
        self.select(&indexes)
    }

    /// Rename every chromosome label with `renamer`, returning the number of changed labels
    pub fn rename_chromosomes(&mut self, renamer: &ChromosomeRenamer) -> usize {
        let mut renamed = 0;
        for label in self.chromosome.iter_mut() {
            let new_label = renamer.rename(label);
            if new_label != *label {
                *label = new_label;
                renamed += 1;
            }
        }
        if renamed > 0 {
            debug!("Renamed {} chromosome labels", renamed);
        }
        renamed
    }

    /// Replace every genotype call equal to `from` by `to`
    pub fn rename_missing_calls(&mut self, from: i8, to: i8) -> usize {
        self.genotypes.replace_calls(from, to)
    }

    /// Check that per-marker fields are aligned and that markers are sorted by
    /// chromosome rank and position.
    pub fn validate(&self) -> io::Result<()> {
        let len = self.len();
        let lengths = [
            ("chromosome", self.chromosome.len()),
            ("id", self.id.len()),
            ("reference", self.reference.len()),
            ("alternate", self.alternate.len()),
            ("quality", self.quality.len()),
            ("genotypes", self.genotypes.num_markers()),
        ];
        if let Some((field, field_len)) = lengths.iter().find(|(_, l)| *l != len) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Field '{}' has {} entries but there are {} positions",
                    field, field_len, len
                ),
            ));
        }
        if self.genotypes.num_samples() != self.samples.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Genotypes have {} samples but {} sample names are present",
                    self.genotypes.num_samples(),
                    self.samples.len()
                ),
            ));
        }

        self.validate_order()
    }

    /// Markers must come in the order the multi-chromosome merge walks them:
    /// one contiguous block per chromosome label, blocks in chromosome rank
    /// order, positions non-decreasing within a rank.
    fn validate_order(&self) -> io::Result<()> {
        let unsorted = |message: String| -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}. Sort the markers by chromosome (numerically) and position, or partition the file by chromosome",
                    message
                ),
            ))
        };

        let ranks = rank_labels(&self.chromosome);
        let mut finished: FxHashSet<&str> = FxHashSet::default();
        for i in 1..self.len() {
            let (previous, current) = (self.chromosome[i - 1].as_str(), self.chromosome[i].as_str());
            if previous != current {
                finished.insert(previous);
                if finished.contains(current) {
                    return unsorted(format!(
                        "Markers of chromosome {} are split into several blocks ({}:{} follows {}:{})",
                        current, current, self.position[i], previous, self.position[i - 1]
                    ));
                }
            }

            match compare_ranked(ranks[i - 1], previous, ranks[i], current) {
                Ordering::Greater => {
                    return unsorted(format!(
                        "Chromosomes are not sorted: {} follows {}",
                        current, previous
                    ));
                }
                Ordering::Equal if self.position[i] < self.position[i - 1] => {
                    return unsorted(format!(
                        "Markers are not sorted by position: {}:{} follows {}:{}",
                        current, self.position[i], previous, self.position[i - 1]
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn assert_aligned(&self) {
        let len = self.len();
        assert!(
            self.chromosome.len() == len
                && self.id.len() == len
                && self.reference.len() == len
                && self.alternate.len() == len
                && self.quality.len() == len
                && self.genotypes.num_markers() == len,
            "Per-marker fields are not index-aligned"
        );
    }
}

fn pick<T: Clone>(values: &[T], indexes: &[usize]) -> Vec<T> {
    indexes.iter().map(|&i| values[i].clone()).collect()
}
