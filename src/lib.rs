//! # phyloprep - Alignment preparation for phylogenetics
//!
//! Converts FASTA and NEXUS alignments to relaxed PHYLIP, cleaning sequence
//! names, dropping duplicate sequences and optionally sorting output into
//! `dna/` and `protein/` directories.
//!
//! ## Architecture
//!
//! - `model`: Sequences and alignments
//! - `sanitize`: Name cleaning
//! - `formats`: FASTA/NEXUS parsing, PHYLIP and FASTA writing
//! - `classify`: DNA vs protein heuristics
//! - `dedup`: Duplicate removal and cross-file merging
//! - `processor`: Directory walking, per-file pipeline and the run log

pub mod classify;
pub mod dedup;
pub mod formats;
pub mod model;
pub mod processor;
pub mod sanitize;
