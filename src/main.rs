use clap::Parser;
use log::info;
use mergegenome::chromosome::ChromosomeRenamer;
use mergegenome::commands::clean::run_clean;
use mergegenome::commands::common_indexes::run_store_common_indexes;
use mergegenome::commands::divergence::run_remove_divergent;
use mergegenome::commands::partition::run_partition;
use mergegenome::commands::rename::run_rename;
use mergegenome::commands::subset::run_subset;
use mergegenome::reconcile::CleanConfig;
use mergegenome::vcf::WriteOptions;
use rayon::ThreadPoolBuilder;
use rustc_hash::FxHashMap;
use std::io;
use std::num::NonZeroUsize;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(4).unwrap())]
    threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Options for the VCF files written by a command
#[derive(Parser, Debug)]
struct OutputOpts {
    /// Output folder
    #[clap(short = 'o', long, value_parser)]
    output_folder: String,

    /// Symbol written in place of missing calls
    #[clap(long, value_parser, default_value = ".", allow_hyphen_values = true)]
    missing_symbol: String,
}

impl OutputOpts {
    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            missing_symbol: self.missing_symbol.clone(),
        }
    }
}

/// Reconcile SNP datasets from different sources before merging them.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Split a VCF file into one file per chromosome
    Partition {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Path to the query VCF file
        #[clap(short = 'q', long, value_parser)]
        query: String,

        /// Toggle the chromosome notation between 'chr<N>' and '<N>'
        #[clap(long, action)]
        rename_chr: bool,

        /// Chromosome renaming as 'old=new,old=new'; implies --rename-chr
        #[clap(long, value_parser)]
        rename_map: Option<String>,
    },
    /// Rename the chromosome of a single-chromosome VCF file
    Rename {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Path to the VCF file
        #[clap(short = 'q', long, value_parser)]
        query: String,

        /// Chromosome renaming as 'old=new,old=new' (toggles the 'chr' prefix if not given)
        #[clap(long, value_parser)]
        rename_map: Option<String>,
    },
    /// Clean query/reference VCF pairs of the same chromosome
    Clean {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Query VCF files, one per chromosome
        #[clap(short = 'q', long, value_parser, num_args = 1.., required = true)]
        query: Vec<String>,

        /// Reference VCF files, paired with the query files by position
        #[clap(short = 'r', long, value_parser, num_args = 1..)]
        reference: Vec<String>,

        /// Remove query samples whose ID contains any of these substrings (case-insensitive)
        #[clap(long, value_parser, num_args = 1..)]
        remove_sample_id_query: Vec<String>,

        /// Remove reference samples whose ID contains any of these substrings (case-insensitive)
        #[clap(long, value_parser, num_args = 1..)]
        remove_sample_id_reference: Vec<String>,

        /// Remove ambiguous SNPs (A/T, T/A, C/G, G/C) from the query
        #[clap(long, action)]
        remove_ambiguous_query: bool,

        /// Remove ambiguous SNPs (A/T, T/A, C/G, G/C) from the reference
        #[clap(long, action)]
        remove_ambiguous_reference: bool,

        /// Correct SNP flips in the query with respect to the reference
        #[clap(long, action)]
        correct_flips: bool,

        /// Remove SNPs whose REF or ALT differ between the reference and the query
        #[clap(long, action)]
        remove_mismatches: bool,

        /// Remove common SNPs whose mean allele frequency differs by more than this value
        #[clap(long, value_parser)]
        divergence_threshold: Option<f64>,

        /// Replace missing query calls by this allele index
        #[clap(long, value_parser)]
        fill_missing_query: Option<i8>,

        /// Replace missing reference calls by this allele index
        #[clap(long, value_parser)]
        fill_missing_reference: Option<i8>,
    },
    /// Narrow query/reference VCF pairs to their common markers
    Subset {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Query VCF files, one per chromosome
        #[clap(short = 'q', long, value_parser, num_args = 1.., required = true)]
        query: Vec<String>,

        /// Reference VCF files, paired with the query files by position
        #[clap(short = 'r', long, value_parser, num_args = 1.., required = true)]
        reference: Vec<String>,
    },
    /// Store the indexes of the common markers of two VCF files
    StoreCommonIndexes {
        #[clap(flatten)]
        common: CommonOpts,

        /// Path to the query VCF file
        #[clap(short = 'q', long, value_parser)]
        query: String,

        /// Path to the reference VCF file
        #[clap(short = 'r', long, value_parser)]
        reference: String,

        /// Output file for the indexes
        #[clap(short = 'o', long, value_parser)]
        output: String,

        /// Compare positions only, ignoring chromosome labels
        #[clap(long, action)]
        single_chromosome: bool,
    },
    /// Remove common SNPs with different mean allele frequencies
    RemoveSnpsDifferentMeans {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Query VCF files, one per chromosome
        #[clap(short = 'q', long, value_parser, num_args = 1.., required = true)]
        query: Vec<String>,

        /// Reference VCF files, paired with the query files by position
        #[clap(short = 'r', long, value_parser, num_args = 1.., required = true)]
        reference: Vec<String>,

        /// Maximum mean absolute difference kept, between 0.0 and 1.0
        #[clap(short = 'T', long, value_parser)]
        threshold: f64,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Partition {
            common,
            output,
            query,
            rename_chr,
            rename_map,
        } => {
            initialize(&common)?;
            let renamer = match rename_map {
                Some(map) => ChromosomeRenamer::Map(parse_rename_map(&map)?),
                None if rename_chr => ChromosomeRenamer::TogglePrefix,
                None => ChromosomeRenamer::Identity,
            };
            let written = run_partition(
                &query,
                &output.output_folder,
                &renamer,
                &output.write_options(),
                common.threads,
            )?;
            info!("Wrote {} files", written.len());
        }
        Args::Rename {
            common,
            output,
            query,
            rename_map,
        } => {
            initialize(&common)?;
            let renamer = match rename_map {
                Some(map) => ChromosomeRenamer::Map(parse_rename_map(&map)?),
                None => ChromosomeRenamer::TogglePrefix,
            };
            let written = run_rename(
                &query,
                &output.output_folder,
                &renamer,
                &output.write_options(),
                common.threads,
            )?;
            info!("Wrote {}", written);
        }
        Args::Clean {
            common,
            output,
            query,
            reference,
            remove_sample_id_query,
            remove_sample_id_reference,
            remove_ambiguous_query,
            remove_ambiguous_reference,
            correct_flips,
            remove_mismatches,
            divergence_threshold,
            fill_missing_query,
            fill_missing_reference,
        } => {
            let config = CleanConfig {
                remove_sample_ids_query: remove_sample_id_query,
                remove_sample_ids_reference: remove_sample_id_reference,
                remove_ambiguous_query,
                remove_ambiguous_reference,
                correct_flips,
                remove_mismatches,
                divergence_threshold,
                fill_missing_query,
                fill_missing_reference,
            };
            config.validate()?;
            initialize(&common)?;
            run_clean(
                &query,
                &reference,
                &output.output_folder,
                &config,
                &output.write_options(),
                common.threads,
            )?;
        }
        Args::Subset {
            common,
            output,
            query,
            reference,
        } => {
            initialize(&common)?;
            run_subset(
                &query,
                &reference,
                &output.output_folder,
                &output.write_options(),
                common.threads,
            )?;
        }
        Args::StoreCommonIndexes {
            common,
            query,
            reference,
            output,
            single_chromosome,
        } => {
            initialize(&common)?;
            run_store_common_indexes(&query, &reference, &output, single_chromosome, common.threads)?;
        }
        Args::RemoveSnpsDifferentMeans {
            common,
            output,
            query,
            reference,
            threshold,
        } => {
            initialize(&common)?;
            run_remove_divergent(
                &query,
                &reference,
                &output.output_folder,
                threshold,
                &output.write_options(),
                common.threads,
            )?;
        }
    }

    Ok(())
}

fn initialize(common: &CommonOpts) -> io::Result<()> {
    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    // Configure thread pool
    ThreadPoolBuilder::new()
        .num_threads(common.threads.into())
        .build_global()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to build thread pool: {}", e),
            )
        })
}

/// Parse `old=new,old=new` into a chromosome renaming map
fn parse_rename_map(text: &str) -> io::Result<FxHashMap<String, String>> {
    let mut map = FxHashMap::default();
    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (old, new) = entry.split_once('=').ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid rename map entry '{}', expected 'old=new'", entry),
            )
        })?;
        let (old, new) = (old.trim(), new.trim());
        if old.is_empty() || new.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid rename map entry '{}', expected 'old=new'", entry),
            ));
        }
        if map.insert(old.to_string(), new.to_string()).is_some() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Chromosome '{}' appears more than once in the rename map", old),
            ));
        }
    }
    if map.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "The rename map is empty",
        ));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename_map() {
        let map = parse_rename_map("chr1=1, chrX = X").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["chr1"], "1");
        assert_eq!(map["chrX"], "X");

        assert!(parse_rename_map("chr1").is_err());
        assert!(parse_rename_map("chr1=1,chr1=2").is_err());
        assert!(parse_rename_map("=1").is_err());
        assert!(parse_rename_map(" , ").is_err());
    }

    #[test]
    fn test_cli_parses_clean_flags() {
        let args = Args::try_parse_from([
            "mergegenome",
            "clean",
            "-q",
            "q1.vcf",
            "q2.vcf",
            "-r",
            "r1.vcf",
            "r2.vcf",
            "-o",
            "out",
            "--remove-sample-id-query",
            "wolf",
            "coyote",
            "--correct-flips",
            "--divergence-threshold",
            "0.2",
        ])
        .unwrap();
        match args {
            Args::Clean {
                query,
                reference,
                remove_sample_id_query,
                correct_flips,
                remove_mismatches,
                divergence_threshold,
                common,
                ..
            } => {
                assert_eq!(query, vec!["q1.vcf", "q2.vcf"]);
                assert_eq!(reference, vec!["r1.vcf", "r2.vcf"]);
                assert_eq!(remove_sample_id_query, vec!["wolf", "coyote"]);
                assert!(correct_flips);
                assert!(!remove_mismatches);
                assert_eq!(divergence_threshold, Some(0.2));
                assert_eq!(common.threads.get(), 4);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }
}
