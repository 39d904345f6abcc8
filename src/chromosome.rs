//! Chromosome label ordering and renaming.
//!
//! Labels are free-form (`chr1`, `1`, `Chr_X`, `scaffold_12`...). For ordering,
//! a label is reduced to a numeric rank: the number left after stripping a
//! `chr`-style prefix, with sex and mitochondrial chromosomes mapped to fixed
//! sentinels so that every numbered chromosome sorts before them. Any other
//! label (`chrUn2`, `scaffold_12`, `chr1_random`) is "unplaced" and sorts last,
//! in natural order.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;

pub const CHROM_X_RANK: u32 = 10001;
pub const CHROM_Y_RANK: u32 = 10002;
pub const CHROM_MT_RANK: u32 = 10003;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChromosomeRank {
    Numbered(u32),
    Unplaced,
}

/// Numeric rank of a chromosome label
pub fn chromosome_rank(label: &str) -> ChromosomeRank {
    let name = strip_chromosome_prefix(label);

    match name.to_ascii_uppercase().as_str() {
        "X" => return ChromosomeRank::Numbered(CHROM_X_RANK),
        "Y" => return ChromosomeRank::Numbered(CHROM_Y_RANK),
        "M" | "MT" => return ChromosomeRank::Numbered(CHROM_MT_RANK),
        _ => {}
    }

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
        return ChromosomeRank::Unplaced;
    }
    name.parse::<u32>()
        .map(ChromosomeRank::Numbered)
        .unwrap_or(ChromosomeRank::Unplaced)
}

/// Total order over chromosome labels: numbered ranks first, then unplaced labels
/// in natural order. Labels with the same rank (`chr1` and `1`) compare equal.
pub fn compare_chromosomes(a: &str, b: &str) -> Ordering {
    compare_ranked(chromosome_rank(a), a, chromosome_rank(b), b)
}

pub(crate) fn compare_ranked(
    rank_a: ChromosomeRank,
    label_a: &str,
    rank_b: ChromosomeRank,
    label_b: &str,
) -> Ordering {
    match (rank_a, rank_b) {
        (ChromosomeRank::Unplaced, ChromosomeRank::Unplaced) => natord::compare(label_a, label_b),
        _ => rank_a.cmp(&rank_b),
    }
}

/// Ranks of a list of labels, computing each distinct label once
pub fn rank_labels(labels: &[String]) -> Vec<ChromosomeRank> {
    let mut cache: FxHashMap<&str, ChromosomeRank> = FxHashMap::default();
    labels
        .iter()
        .map(|label| {
            *cache
                .entry(label.as_str())
                .or_insert_with(|| chromosome_rank(label))
        })
        .collect()
}

fn strip_chromosome_prefix(label: &str) -> &str {
    let lower = label.to_ascii_lowercase();
    let prefix_len = ["chromosome", "chrom", "chr"]
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map_or(0, |prefix| prefix.len());
    label[prefix_len..].trim_start_matches(['_', '-'])
}

/// Toggle between `chr<N>` and `<N>` notation. Labels in neither form are
/// returned unchanged.
pub fn toggle_chr_prefix(label: &str) -> String {
    if let Some(number) = label.strip_prefix("chr") {
        if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
            return number.to_string();
        }
    } else if !label.is_empty() && label.chars().all(|c| c.is_ascii_digit()) {
        return format!("chr{}", label);
    }
    label.to_string()
}

/// Chromosome renaming rule built by the command line layer
#[derive(Debug, Clone, Default)]
pub enum ChromosomeRenamer {
    /// Keep labels as they are
    #[default]
    Identity,
    /// `chr<N>` <-> `<N>`
    TogglePrefix,
    /// Old label -> new label; unmapped labels are kept
    Map(FxHashMap<String, String>),
}

impl ChromosomeRenamer {
    pub fn rename(&self, label: &str) -> String {
        match self {
            ChromosomeRenamer::Identity => label.to_string(),
            ChromosomeRenamer::TogglePrefix => toggle_chr_prefix(label),
            ChromosomeRenamer::Map(map) => map
                .get(label)
                .cloned()
                .unwrap_or_else(|| label.to_string()),
        }
    }
}
