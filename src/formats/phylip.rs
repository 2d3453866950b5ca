//! Relaxed PHYLIP writer.
//!
//! ## PHYLIP Format
//!
//! The first line holds the number of sequences and the sequence length,
//! followed by one line per sequence:
//! ```text
//! 3 10
//! Seq1      ACGTACGTAC
//! Seq_two   TGCATGCATG
//! S3        AAAACCCCGG
//! ```
//!
//! Names are not truncated to 10 characters as in strict PHYLIP. With name
//! alignment on, every name is left-justified to the longest name plus two
//! spaces so the sequences start in the same column.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::Alignment;

/// Errors that can occur while writing PHYLIP.
#[derive(Error, Debug)]
pub enum PhylipError {
    #[error("No sequences to write")]
    NoSequences,

    #[error("Sequences have different lengths: {}", format_lengths(.lengths))]
    LengthMismatch { lengths: BTreeSet<usize> },

    #[error("{0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for PHYLIP operations.
pub type PhylipResult<T> = Result<T, PhylipError>;

fn format_lengths(lengths: &BTreeSet<usize>) -> String {
    let parts: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Renders an alignment as relaxed PHYLIP text.
///
/// Fails if the alignment is empty or its sequences differ in length.
pub fn format_phylip(alignment: &Alignment, align_names: bool) -> PhylipResult<String> {
    if alignment.is_empty() {
        return Err(PhylipError::NoSequences);
    }
    if !alignment.is_valid_alignment() {
        return Err(PhylipError::LengthMismatch {
            lengths: alignment.lengths(),
        });
    }
    let seq_length = alignment.lengths().first().copied().unwrap_or(0);

    let width = alignment.max_id_length() + 2;
    let mut out = format!("{} {}\n", alignment.sequence_count(), seq_length);
    for (id, data) in alignment {
        if align_names {
            out.push_str(&format!("{:<width$}{}\n", id, data, width = width));
        } else {
            out.push_str(&format!("{} {}\n", id, data));
        }
    }
    Ok(out)
}

/// Writes an alignment to a PHYLIP file, creating parent directories.
///
/// Validation happens before the file is created, so a rejected alignment
/// leaves nothing on disk.
pub fn write_phylip<P: AsRef<Path>>(
    alignment: &Alignment,
    path: P,
    align_names: bool,
) -> PhylipResult<()> {
    let text = format_phylip(alignment, align_names)?;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}
