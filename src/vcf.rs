//! VCF reading and writing
//!
//! Reads plain or BGZF-compressed VCF files into a [`VariantDataset`] and writes
//! datasets back as phased VCF. Only the `GT` field of each sample is kept.

use crate::dataset::{MarkerRecord, VariantDataset};
use crate::genotype::MISSING;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::num::NonZeroUsize;

#[derive(Debug)]
pub enum VcfError {
    NotEnoughFields { line: usize, found: usize },
    InvalidPosition { line: usize, value: String },
    InvalidGenotype { line: usize, value: String },
    InvalidAllele { line: usize, value: String },
    MissingHeader { line: usize },
    SampleCountMismatch { line: usize, expected: usize, found: usize },
    Io(io::Error),
}

impl std::fmt::Display for VcfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VcfError::NotEnoughFields { line, found } => {
                write!(f, "Not enough fields in VCF record at line {} (found {})", line, found)
            }
            VcfError::InvalidPosition { line, value } => {
                write!(f, "Invalid position '{}' at line {}", value, line)
            }
            VcfError::InvalidGenotype { line, value } => {
                write!(f, "Invalid genotype '{}' at line {}", value, line)
            }
            VcfError::InvalidAllele { line, value } => {
                write!(f, "Invalid allele field '{}' at line {}", value, line)
            }
            VcfError::MissingHeader { line } => {
                write!(f, "Record at line {} appears before the #CHROM header", line)
            }
            VcfError::SampleCountMismatch {
                line,
                expected,
                found,
            } => write!(
                f,
                "Expected {} sample columns at line {}, found {}",
                expected, line, found
            ),
            VcfError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for VcfError {}

impl From<VcfError> for io::Error {
    fn from(err: VcfError) -> Self {
        match err {
            VcfError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

const FIXED_COLUMNS: usize = 8;
const BGZF_HEADER_SIZE: usize = 18;

/// Check whether a file starts with a valid BGZF header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => Ok(header[0..2] == [0x1f, 0x8b]
            && header[2] == 0x08
            && header[3] == 0x04
            && header[10..12] == [0x06, 0x00]
            && header[12..14] == [b'B', b'C']
            && header[14..16] == [0x02, 0x00]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

fn is_compressed_path(path: &str) -> bool {
    [".gz", ".bgz"].iter().any(|e| path.ends_with(e))
}

/// Parse one `GT` value. Haploid calls get a missing second strand.
fn parse_genotype(value: &str, line: usize) -> Result<[i8; 2], VcfError> {
    let invalid = || VcfError::InvalidGenotype {
        line,
        value: value.to_string(),
    };
    let parse_allele = |allele: &str| -> Result<i8, VcfError> {
        if allele == "." {
            Ok(MISSING)
        } else {
            allele.parse::<i8>().ok().filter(|a| *a >= 0).ok_or_else(invalid)
        }
    };

    let mut alleles = value.split(['|', '/']);
    let first = alleles.next().ok_or_else(invalid)?;
    let second = alleles.next();
    if alleles.next().is_some() {
        return Err(invalid());
    }

    let maternal = parse_allele(first)?;
    let paternal = match second {
        Some(allele) => parse_allele(allele)?,
        None => MISSING,
    };
    Ok([maternal, paternal])
}

fn parse_record(
    fields: &[&str],
    num_samples: usize,
    line: usize,
    calls: &mut Vec<i8>,
) -> Result<MarkerRecord, VcfError> {
    if fields.len() < FIXED_COLUMNS {
        return Err(VcfError::NotEnoughFields {
            line,
            found: fields.len(),
        });
    }
    if num_samples > 0 && fields.len() != FIXED_COLUMNS + 1 + num_samples {
        return Err(VcfError::SampleCountMismatch {
            line,
            expected: num_samples,
            found: fields.len().saturating_sub(FIXED_COLUMNS + 1),
        });
    }

    let position = fields[1]
        .parse::<u64>()
        .map_err(|_| VcfError::InvalidPosition {
            line,
            value: fields[1].to_string(),
        })?;
    let invalid_allele = |value: &str| VcfError::InvalidAllele {
        line,
        value: value.to_string(),
    };
    if fields[3].is_empty() || fields[3] == "." {
        return Err(invalid_allele(fields[3]));
    }
    let alternate: Vec<String> = if fields[4] == "." {
        Vec::new()
    } else {
        fields[4].split(',').map(str::to_string).collect()
    };
    if alternate.iter().any(String::is_empty) {
        return Err(invalid_allele(fields[4]));
    }

    calls.clear();
    if num_samples > 0 {
        let gt_index = fields[FIXED_COLUMNS].split(':').position(|key| key == "GT");
        for sample in &fields[FIXED_COLUMNS + 1..] {
            let genotype = match gt_index.and_then(|k| sample.split(':').nth(k)) {
                Some(value) => parse_genotype(value, line)?,
                None => [MISSING, MISSING],
            };
            calls.extend_from_slice(&genotype);
        }
    }

    Ok(MarkerRecord {
        chromosome: fields[0].to_string(),
        position,
        id: fields[2].to_string(),
        reference: fields[3].to_string(),
        alternate,
        quality: fields[5].to_string(),
    })
}

pub fn parse_vcf<R: BufRead>(reader: R) -> Result<VariantDataset, VcfError> {
    let mut dataset: Option<VariantDataset> = None;
    let mut calls = Vec::new();

    for (k, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(VcfError::Io)?;
        let line_number = k + 1;
        if line.is_empty() || line.starts_with("##") {
            continue;
        }

        if let Some(header) = line.strip_prefix("#CHROM") {
            let samples: Vec<String> = header
                .split('\t')
                .skip(FIXED_COLUMNS + 1)
                .map(str::to_string)
                .collect();
            debug!("VCF header lists {} samples", samples.len());
            dataset = Some(VariantDataset::new(samples));
            continue;
        }

        let dataset = dataset
            .as_mut()
            .ok_or(VcfError::MissingHeader { line: line_number })?;
        let fields: Vec<&str> = line.split('\t').collect();
        let record = parse_record(&fields, dataset.num_samples(), line_number, &mut calls)?;
        dataset.push(record, &calls);
    }

    dataset.ok_or(VcfError::MissingHeader { line: 0 })
}

/// Read a VCF file, decompressing `.gz`/`.bgz` inputs with `threads` BGZF workers
pub fn read_vcf(path: &str, threads: NonZeroUsize) -> io::Result<VariantDataset> {
    let mut file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open VCF file '{}': {}", path, e))
    })?;

    let result = if is_compressed_path(path) {
        if !is_bgzf(&mut file)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > output.vcf.gz",
                    path, path
                ),
            ));
        }
        debug!("Reading {} with {} BGZF workers", path, threads);
        let reader = bgzf::io::MultithreadedReader::with_worker_count(threads, file);
        parse_vcf(BufReader::new(reader))
    } else {
        parse_vcf(BufReader::new(file))
    };

    let dataset = result.map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse VCF from {}: {}", path, e),
        )
    })?;
    debug!(
        "Read {} SNPs and {} samples from {}",
        dataset.len(),
        dataset.num_samples(),
        path
    );
    Ok(dataset)
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Written in place of missing calls
    pub missing_symbol: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            missing_symbol: ".".to_string(),
        }
    }
}

fn write_call<W: Write>(writer: &mut W, call: i8, options: &WriteOptions) -> io::Result<()> {
    if call == MISSING {
        writer.write_all(options.missing_symbol.as_bytes())
    } else {
        write!(writer, "{}", call)
    }
}

pub fn write_vcf_to<W: Write>(
    dataset: &VariantDataset,
    writer: &mut W,
    options: &WriteOptions,
) -> io::Result<()> {
    writeln!(writer, "##fileformat=VCFv4.1")?;
    writeln!(
        writer,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Phased Genotype\">"
    )?;
    write!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for sample in dataset.samples() {
        write!(writer, "\t{}", sample)?;
    }
    writeln!(writer)?;

    let genotypes = dataset.genotypes();
    for i in 0..dataset.len() {
        let alternate = match dataset.alternate(i) {
            "" => ".",
            alt => alt,
        };
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\tPASS\t.\tGT",
            dataset.chromosome(i),
            dataset.position(i),
            dataset.id(i),
            dataset.reference(i),
            alternate,
            dataset.quality(i)
        )?;
        for s in 0..dataset.num_samples() {
            let [maternal, paternal] = genotypes.get(i, s);
            writer.write_all(b"\t")?;
            write_call(writer, maternal, options)?;
            writer.write_all(b"|")?;
            write_call(writer, paternal, options)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a dataset to `path`, BGZF-compressed when the path ends in `.gz`/`.bgz`
pub fn write_vcf(dataset: &VariantDataset, path: &str, options: &WriteOptions) -> io::Result<()> {
    let file = File::create(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to create VCF file '{}': {}", path, e))
    })?;

    if is_compressed_path(path) {
        let mut writer = bgzf::io::Writer::new(file);
        write_vcf_to(dataset, &mut writer, options)?;
        writer.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_vcf_to(dataset, &mut writer, options)?;
        writer.flush()?;
    }
    debug!("Wrote {} SNPs to {}", dataset.len(), path);
    Ok(())
}
