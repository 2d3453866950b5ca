//! DNA vs protein classification.
//!
//! Nucleotide IUPAC ambiguity codes share fourteen letters with the amino
//! acid alphabet (A C D G H K M N R S T V W Y), so a single threshold cannot
//! tell the two apart. The classifier applies a chain of checks, strongest
//! signal first:
//!
//! 1. any protein-exclusive letter present → protein
//! 2. more than 10 distinct letters → protein
//! 3. at most 4 distinct letters → DNA
//! 4. base ratio above 0.90 with at most 7 distinct letters → DNA
//! 5. base ratio below 0.80 → protein
//! 6. at most 6 distinct letters with base ratio above 0.85 → DNA
//! 7. anything else → protein
//!
//! Gaps and unknown symbols are ignored. An empty pool is protein.

use std::collections::HashSet;
use std::path::Path;

use crate::model::{Alignment, SequenceType};

/// Number of leading sequences inspected for routing.
pub const SAMPLE_SIZE: usize = 5;

/// Letters that never occur in nucleotide IUPAC codes.
const PROTEIN_EXCLUSIVE: &[u8] = b"EFIJLOPQZ";
/// Standard DNA/RNA bases.
const DNA_BASES: &[u8] = b"ATGCU";
/// Gap and unknown symbols, skipped before counting.
const IGNORED: &[u8] = b"-.*?X";

const HIGH_DIVERSITY: usize = 10;
const LOW_DIVERSITY: usize = 4;
const MAX_DNA_DIVERSITY: usize = 7;
const BORDERLINE_DNA_DIVERSITY: usize = 6;
const HIGH_DNA_RATIO: f64 = 0.90;
const LOW_DNA_RATIO: f64 = 0.80;
const BORDERLINE_DNA_RATIO: f64 = 0.85;

/// File name fragments that decide the type without looking at content.
const PROTEIN_HINTS: [&str; 3] = ["protein", "aa", "prot"];
const DNA_HINTS: [&str; 3] = ["dna", "nucleotide", "cds"];

/// Character statistics of a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Distinct characters after filtering
    pub diversity: usize,
    /// Whether a protein-exclusive letter was seen
    pub has_protein_exclusive: bool,
    /// Share of characters that are DNA/RNA bases
    pub dna_ratio: f64,
}

impl Composition {
    /// Computes statistics over the upper-cased sample, skipping gaps and
    /// unknowns. Returns `None` if nothing is left.
    pub fn of<'a, I>(sample: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unique = HashSet::new();
        let mut total = 0usize;
        let mut bases = 0usize;

        for seq in sample {
            for c in seq.chars().flat_map(char::to_uppercase) {
                if c.is_ascii() && IGNORED.contains(&(c as u8)) {
                    continue;
                }
                total += 1;
                if c.is_ascii() && DNA_BASES.contains(&(c as u8)) {
                    bases += 1;
                }
                unique.insert(c);
            }
        }

        if total == 0 {
            return None;
        }

        let has_protein_exclusive = unique
            .iter()
            .any(|c| c.is_ascii() && PROTEIN_EXCLUSIVE.contains(&(*c as u8)));

        Some(Self {
            diversity: unique.len(),
            has_protein_exclusive,
            dna_ratio: bases as f64 / total as f64,
        })
    }

    /// Applies the decision chain.
    pub fn sequence_type(&self) -> SequenceType {
        let Self {
            diversity,
            has_protein_exclusive,
            dna_ratio,
        } = *self;

        if has_protein_exclusive || diversity > HIGH_DIVERSITY {
            SequenceType::Protein
        } else if diversity <= LOW_DIVERSITY {
            SequenceType::Dna
        } else if dna_ratio > HIGH_DNA_RATIO && diversity <= MAX_DNA_DIVERSITY {
            SequenceType::Dna
        } else if dna_ratio < LOW_DNA_RATIO {
            SequenceType::Protein
        } else if diversity <= BORDERLINE_DNA_DIVERSITY && dna_ratio > BORDERLINE_DNA_RATIO {
            SequenceType::Dna
        } else {
            SequenceType::Protein
        }
    }
}

/// Classifies a sample of sequences by character composition.
pub fn classify_sequences<'a, I>(sample: I) -> SequenceType
where
    I: IntoIterator<Item = &'a str>,
{
    Composition::of(sample)
        .map(|composition| composition.sequence_type())
        .unwrap_or(SequenceType::Protein)
}

/// Looks for an explicit type hint in a file name (case-insensitive).
/// Protein hints win over DNA hints.
pub fn hint_from_file_name(name: &str) -> Option<SequenceType> {
    let lower = name.to_lowercase();
    if PROTEIN_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(SequenceType::Protein)
    } else if DNA_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(SequenceType::Dna)
    } else {
        None
    }
}

/// Decides the type of a parsed file: a file name hint first, otherwise the
/// first [`SAMPLE_SIZE`] sequences.
pub fn sequence_type_of(path: &Path, alignment: &Alignment) -> SequenceType {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    if let Some(hinted) = hint_from_file_name(&file_name) {
        log::debug!("{}: type {} from file name", file_name, hinted);
        return hinted;
    }

    let seq_type = classify_sequences(alignment.sequences().take(SAMPLE_SIZE));
    log::debug!("{}: type {} from content", file_name, seq_type);
    seq_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(sample: &[&str]) -> SequenceType {
        classify_sequences(sample.iter().copied())
    }

    #[test]
    fn test_pure_dna() {
        assert_eq!(classify(&["ATGCATGCATGC", "ATGC--ATGC"]), SequenceType::Dna);
    }

    #[test]
    fn test_lowercase_dna() {
        assert_eq!(classify(&["atgcatgc"]), SequenceType::Dna);
    }

    #[test]
    fn test_rna() {
        assert_eq!(classify(&["AUGCAUGCAUGC"]), SequenceType::Dna);
    }

    #[test]
    fn test_protein_exclusive_letter() {
        for c in ['E', 'F', 'I', 'L', 'P', 'Q'] {
            let seq = format!("ATGCATGC{}", c);
            assert_eq!(classify(&[seq.as_str()]), SequenceType::Protein, "letter {}", c);
        }
    }

    #[test]
    fn test_empty_and_gap_only_default_to_protein() {
        assert_eq!(classify(&[]), SequenceType::Protein);
        assert_eq!(classify(&["", ""]), SequenceType::Protein);
        assert_eq!(classify(&["----", "..??**XX"]), SequenceType::Protein);
    }

    #[test]
    fn test_high_diversity_without_exclusive_letters() {
        // 11 shared letters, none protein-exclusive
        assert_eq!(classify(&["ACDGHKMNRST"]), SequenceType::Protein);
    }

    #[test]
    fn test_dna_with_few_ambiguity_codes() {
        // 5 distinct letters, base ratio 0.95
        let seq = format!("{}N", "ACGT".repeat(5));
        assert_eq!(classify(&[seq.as_str()]), SequenceType::Dna);
    }

    #[test]
    fn test_low_base_ratio() {
        // 5 distinct letters, mostly non-bases
        assert_eq!(classify(&["KKKKMMMMRRRRSSSSAAAA"]), SequenceType::Protein);
    }

    #[test]
    fn test_borderline_dna() {
        // Base ratio 28/32 in both samples; only the letter count differs
        let seq = "AAAACCCCGGGGTTTTAAAACCCCGGGGNNRY";
        let composition = Composition::of([seq]).unwrap();
        assert_eq!(composition.diversity, 7);
        assert_eq!(composition.sequence_type(), SequenceType::Protein);

        let seq = "AAAACCCCGGGGTTTTAAAACCCCGGGGNNRR";
        let composition = Composition::of([seq]).unwrap();
        assert_eq!(composition.diversity, 6);
        assert_eq!(composition.sequence_type(), SequenceType::Dna);
    }

    #[test]
    fn test_composition_ignores_gaps() {
        let composition = Composition::of(["AC--GT??"]).unwrap();
        assert_eq!(composition.diversity, 4);
        assert!((composition.dna_ratio - 1.0).abs() < f64::EPSILON);
        assert!(!composition.has_protein_exclusive);
    }

    #[test]
    fn test_file_name_hints() {
        assert_eq!(hint_from_file_name("OG001_protein.fasta"), Some(SequenceType::Protein));
        assert_eq!(hint_from_file_name("gene_AA.nex"), Some(SequenceType::Protein));
        assert_eq!(hint_from_file_name("gene_cds.fa"), Some(SequenceType::Dna));
        assert_eq!(hint_from_file_name("Nucleotide.fas"), Some(SequenceType::Dna));
        assert_eq!(hint_from_file_name("prot_dna.fa"), Some(SequenceType::Protein));
        assert_eq!(hint_from_file_name("gene1.fasta"), None);
    }

    #[test]
    fn test_hint_short_circuits_content() {
        let alignment = crate::formats::fasta::parse_fasta_str(">x\nMKLVEFPQ\n");
        let seq_type = sequence_type_of(Path::new("dir/gene_cds.fasta"), &alignment);
        assert_eq!(seq_type, SequenceType::Dna);
    }

    #[test]
    fn test_sample_limited_to_first_sequences() {
        let mut content = String::new();
        for i in 0..SAMPLE_SIZE {
            content.push_str(&format!(">s{}\nACGTACGT\n", i));
        }
        content.push_str(">late\nMKLVEFPQW\n");
        let alignment = crate::formats::fasta::parse_fasta_str(&content);
        assert_eq!(sequence_type_of(Path::new("x.fasta"), &alignment), SequenceType::Dna);
    }

    proptest! {
        #[test]
        fn prop_atgc_only_is_dna(seq in "[ATGC]{1,200}") {
            prop_assert_eq!(classify(&[seq.as_str()]), SequenceType::Dna);
        }

        #[test]
        fn prop_exclusive_letter_is_protein(
            prefix in "[ACGT-]{0,50}",
            letter in "[EFILPQ]",
            suffix in "[ACGT-]{0,50}",
        ) {
            let seq = format!("{}{}{}", prefix, letter, suffix);
            prop_assert_eq!(classify(&[seq.as_str()]), SequenceType::Protein);
        }

        #[test]
        fn prop_gap_only_is_protein(seq in "[-.*?X]{0,50}") {
            prop_assert_eq!(classify(&[seq.as_str()]), SequenceType::Protein);
        }
    }
}
