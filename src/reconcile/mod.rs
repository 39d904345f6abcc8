//! Reconciliation of a query dataset against a reference dataset.
//!
//! Stages run in a fixed order, each one relying on the output of the previous:
//! ambiguity removal, flip correction, mismatch removal and, optionally,
//! allele-frequency divergence filtering.

pub mod ambiguity;
pub mod divergence;
pub mod flip;
pub mod mismatch;
pub mod observer;
pub mod pipeline;

pub use ambiguity::{remove_ambiguous, AmbiguityCounts};
pub use divergence::remove_divergent;
pub use flip::correct_flips;
pub use mismatch::remove_mismatches;
pub use observer::{CountingObserver, LogObserver, ReconcileObserver};
pub use pipeline::{clean_pair, clean_query, CleanConfig};
