use crate::reconcile::ambiguity::AmbiguityCounts;
use log::info;

/// Receives the counts reported by each reconciliation stage.
///
/// Reports are advisory; nothing an observer does feeds back into the stages.
pub trait ReconcileObserver {
    fn ambiguities_found(&mut self, _dataset: &str, _counts: &AmbiguityCounts) {}

    fn same_position_found(&mut self, _count: usize) {}

    fn common_markers_found(&mut self, _count: usize) {}

    fn flips_found(&mut self, _count: usize) {}

    fn mismatches_found(&mut self, _count: usize) {}

    fn divergent_found(&mut self, _count: usize, _threshold: f64) {}

    fn dataset_summary(&mut self, _dataset: &str, _stage: &str, _markers: usize, _samples: usize) {}
}

/// Writes every report to the log, prefixed with a context label
/// (typically the chromosome being processed).
pub struct LogObserver {
    context: String,
}

impl LogObserver {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }
}

impl ReconcileObserver for LogObserver {
    fn ambiguities_found(&mut self, dataset: &str, counts: &AmbiguityCounts) {
        info!("[{}] {}: {} ambiguities found of A-T type", self.context, dataset, counts.a_t);
        info!("[{}] {}: {} ambiguities found of T-A type", self.context, dataset, counts.t_a);
        info!("[{}] {}: {} ambiguities found of C-G type", self.context, dataset, counts.c_g);
        info!("[{}] {}: {} ambiguities found of G-C type", self.context, dataset, counts.g_c);
        info!(
            "[{}] {}: {} ambiguous SNPs in total",
            self.context,
            dataset,
            counts.total()
        );
    }

    fn same_position_found(&mut self, count: usize) {
        info!(
            "[{}] {} SNPs found at the same position in the two datasets",
            self.context, count
        );
    }

    fn common_markers_found(&mut self, count: usize) {
        info!("[{}] {} common markers in total", self.context, count);
    }

    fn flips_found(&mut self, count: usize) {
        info!("[{}] {} flips found in total", self.context, count);
    }

    fn mismatches_found(&mut self, count: usize) {
        info!("[{}] {} mismatches found in total", self.context, count);
    }

    fn divergent_found(&mut self, count: usize, threshold: f64) {
        info!(
            "[{}] {} SNPs with a mean absolute difference higher than {}",
            self.context, count, threshold
        );
    }

    fn dataset_summary(&mut self, dataset: &str, stage: &str, markers: usize, samples: usize) {
        info!(
            "[{}] There are {} SNPs and {} samples in total in the {} {}",
            self.context, markers, samples, dataset, stage
        );
    }
}

/// Keeps the last value of every report
#[derive(Debug, Default, Clone)]
pub struct CountingObserver {
    pub ambiguities: Vec<(String, AmbiguityCounts)>,
    pub same_position: Option<usize>,
    pub common_markers: Option<usize>,
    pub flips: Option<usize>,
    pub mismatches: Option<usize>,
    pub divergent: Option<usize>,
    pub summaries: Vec<(String, String, usize, usize)>,
}

impl ReconcileObserver for CountingObserver {
    fn ambiguities_found(&mut self, dataset: &str, counts: &AmbiguityCounts) {
        self.ambiguities.push((dataset.to_string(), *counts));
    }

    fn same_position_found(&mut self, count: usize) {
        self.same_position = Some(count);
    }

    fn common_markers_found(&mut self, count: usize) {
        self.common_markers = Some(count);
    }

    fn flips_found(&mut self, count: usize) {
        self.flips = Some(count);
    }

    fn mismatches_found(&mut self, count: usize) {
        self.mismatches = Some(count);
    }

    fn divergent_found(&mut self, count: usize, _threshold: f64) {
        self.divergent = Some(count);
    }

    fn dataset_summary(&mut self, dataset: &str, stage: &str, markers: usize, samples: usize) {
        self.summaries
            .push((dataset.to_string(), stage.to_string(), markers, samples));
    }
}
