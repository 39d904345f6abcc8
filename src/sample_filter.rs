use crate::dataset::VariantDataset;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::io;

/// Filter for removing samples whose ID contains any of a list of substrings,
/// ignoring case (e.g. `wolf` removes `IrishWolfhound01`).
pub struct SampleFilter {
    pattern: Regex,
    substrings: Vec<String>,
}

impl SampleFilter {
    /// Build a filter from ID substrings. Returns `None` when there is nothing to filter.
    pub fn from_substrings(substrings: &[String]) -> io::Result<Option<Self>> {
        let substrings: Vec<String> = substrings
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if substrings.is_empty() {
            return Ok(None);
        }

        let alternation = substrings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid sample ID substrings: {e}"),
                )
            })?;

        Ok(Some(Self {
            pattern,
            substrings,
        }))
    }

    /// Check if a sample ID should be removed
    pub fn matches(&self, sample: &str) -> bool {
        self.pattern.is_match(sample)
    }

    /// Drop the matching samples from a dataset, returning it with the number of removed samples
    pub fn apply(&self, dataset: VariantDataset, label: &str) -> (VariantDataset, usize) {
        let keep: Vec<bool> = dataset.samples().iter().map(|s| !self.matches(s)).collect();
        let removed = keep.iter().filter(|&&k| !k).count();

        if removed > 0 {
            for sample in dataset.samples().iter().filter(|s| self.matches(s)) {
                debug!("{}: removing sample {}", label, sample);
            }
        }
        debug!(
            "{}: {} samples removed in total (substrings: {})",
            label,
            removed,
            self.substrings.join(",")
        );

        let dataset = dataset.select_samples(&keep);
        if dataset.num_samples() == 0 {
            warn!("{}: sample filtering removed every sample", label);
        }
        (dataset, removed)
    }
}
