//! Alignment file formats.
//!
//! Input is FASTA or NEXUS, told apart by content alone: text whose first
//! non-blank characters are `#NEXUS` (any case) is NEXUS, everything else
//! is FASTA. File extensions only decide which files are picked up.
//!
//! Output is relaxed PHYLIP (or FASTA for the conversion helpers).

pub mod fasta;
pub mod nexus;
pub mod phylip;

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::model::Alignment;

/// Extensions picked up during directory discovery.
pub const INPUT_EXTENSIONS: [&str; 5] = ["nex", "nexus", "fa", "fasta", "fas"];

/// Extension of every converted file.
pub const OUTPUT_EXTENSION: &str = "phy";

/// Input format, decided by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Nexus,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Nexus => write!(f, "NEXUS"),
        }
    }
}

/// Errors that can occur while reading an input file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    NexusError(#[from] nexus::NexusError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// True if the path carries one of the [`INPUT_EXTENSIONS`].
pub fn has_input_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| INPUT_EXTENSIONS.contains(&ext))
}

/// Detects the format from content.
pub fn detect_format(content: &str) -> FileFormat {
    let head = content.trim_start();
    let is_nexus = head
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("#NEXUS"));
    if is_nexus {
        FileFormat::Nexus
    } else {
        FileFormat::Fasta
    }
}

/// Parses content, returning the alignment and the format used.
///
/// An empty alignment is not an error here.
pub fn parse_content(content: &str) -> ParseResult<(Alignment, FileFormat)> {
    let format = detect_format(content);
    let alignment = match format {
        FileFormat::Fasta => fasta::parse_fasta_str(content),
        FileFormat::Nexus => nexus::parse_nexus_str(content)?,
    };
    Ok((alignment, format))
}

/// Reads and parses an alignment file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<(Alignment, FileFormat)> {
    let content = fs::read_to_string(path)?;
    parse_content(&content)
}
