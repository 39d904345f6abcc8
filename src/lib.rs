// lib.rs
pub mod chromosome;
pub mod commands;
pub mod dataset;
pub mod genotype;
pub mod merge;
pub mod reconcile;
pub mod sample_filter;
pub mod vcf;
