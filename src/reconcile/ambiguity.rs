use crate::dataset::VariantDataset;
use crate::reconcile::observer::ReconcileObserver;
use log::debug;

/// Complementary REF/ALT pairs, whose strand cannot be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambiguity {
    AT,
    TA,
    CG,
    GC,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AmbiguityCounts {
    pub a_t: usize,
    pub t_a: usize,
    pub c_g: usize,
    pub g_c: usize,
}

impl AmbiguityCounts {
    pub fn total(&self) -> usize {
        self.a_t + self.t_a + self.c_g + self.g_c
    }

    fn record(&mut self, ambiguity: Ambiguity) {
        match ambiguity {
            Ambiguity::AT => self.a_t += 1,
            Ambiguity::TA => self.t_a += 1,
            Ambiguity::CG => self.c_g += 1,
            Ambiguity::GC => self.g_c += 1,
        }
    }
}

/// Outcome of looking at one REF/ALT pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleClass {
    Ambiguous(Ambiguity),
    Unambiguous,
    /// Empty or non-nucleotide allele symbols; never treated as ambiguous
    Malformed,
}

fn is_nucleotide_allele(allele: &str) -> bool {
    !allele.is_empty()
        && allele
            .bytes()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N'))
}

pub fn classify(reference: &str, alternate: &str) -> AlleleClass {
    if !is_nucleotide_allele(reference) || !is_nucleotide_allele(alternate) {
        return AlleleClass::Malformed;
    }
    if reference.len() != 1 || alternate.len() != 1 {
        return AlleleClass::Unambiguous;
    }

    let pair = (
        reference.as_bytes()[0].to_ascii_uppercase(),
        alternate.as_bytes()[0].to_ascii_uppercase(),
    );
    match pair {
        (b'A', b'T') => AlleleClass::Ambiguous(Ambiguity::AT),
        (b'T', b'A') => AlleleClass::Ambiguous(Ambiguity::TA),
        (b'C', b'G') => AlleleClass::Ambiguous(Ambiguity::CG),
        (b'G', b'C') => AlleleClass::Ambiguous(Ambiguity::GC),
        _ => AlleleClass::Unambiguous,
    }
}

/// Remove every marker whose REF/first ALT pair is A/T, T/A, C/G or G/C.
///
/// `label` names the dataset in observer reports.
pub fn remove_ambiguous(
    dataset: VariantDataset,
    label: &str,
    observer: &mut dyn ReconcileObserver,
) -> (VariantDataset, AmbiguityCounts) {
    let mut counts = AmbiguityCounts::default();
    let mut retained = Vec::with_capacity(dataset.len());
    let mut malformed = 0usize;

    for idx in 0..dataset.len() {
        match classify(dataset.reference(idx), dataset.alternate(idx)) {
            AlleleClass::Ambiguous(ambiguity) => counts.record(ambiguity),
            AlleleClass::Unambiguous => retained.push(idx),
            AlleleClass::Malformed => {
                debug!(
                    "Keeping {}:{} with unrecognized alleles {}/{}",
                    dataset.chromosome(idx),
                    dataset.position(idx),
                    dataset.reference(idx),
                    dataset.alternate(idx)
                );
                malformed += 1;
                retained.push(idx);
            }
        }
    }

    if malformed > 0 {
        debug!(
            "{}: {} markers with unrecognized alleles kept as non-ambiguous",
            label, malformed
        );
    }
    observer.ambiguities_found(label, &counts);

    let dataset = dataset.select(&retained);
    observer.dataset_summary(label, "after removing ambiguous SNPs", dataset.len(), dataset.num_samples());
    (dataset, counts)
}
