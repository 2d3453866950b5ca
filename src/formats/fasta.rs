//! FASTA reading and writing.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence identifier (free text, sanitized)
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The whole header line after `>` becomes the record name once forbidden
//! characters are replaced. Sequence lines are trimmed and concatenated;
//! case and gap symbols are kept.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::Alignment;
use crate::sanitize::sanitize_name;

/// Errors that can occur while writing FASTA.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to write file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No sequences to write")]
    NoSequences,
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Parses FASTA content into an alignment.
///
/// Never fails: content without any header line yields an empty alignment,
/// which callers treat as "no sequences found".
pub fn parse_fasta_str(content: &str) -> Alignment {
    let mut alignment = Alignment::new();
    let mut current_id: Option<String> = None;
    let mut current_seq = String::new();

    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(id) = current_id.take() {
                flush_record(&mut alignment, id, std::mem::take(&mut current_seq));
            }
            current_id = Some(sanitize_name(header));
            current_seq.clear();
        } else if current_id.is_some() {
            current_seq.push_str(line);
        } else {
            log::debug!(
                "Ignoring sequence data before first header at line {}",
                line_number + 1
            );
        }
    }

    if let Some(id) = current_id {
        flush_record(&mut alignment, id, current_seq);
    }

    alignment
}

fn flush_record(alignment: &mut Alignment, id: String, data: String) {
    // A bare '>' names nothing; the record is dropped
    if id.is_empty() {
        log::debug!("Dropping record with empty name ({} residues)", data.len());
        return;
    }
    if alignment.insert(id.as_str(), data).is_some() {
        log::warn!("Duplicate name '{}': later record replaces earlier one", id);
    }
}

/// Renders an alignment as FASTA text, one sequence line per record.
pub fn format_fasta(alignment: &Alignment, strip_gaps: bool) -> String {
    let mut out = String::new();
    for (id, data) in alignment {
        out.push('>');
        out.push_str(id);
        out.push('\n');
        if strip_gaps {
            out.extend(data.chars().filter(|&c| c != '-'));
        } else {
            out.push_str(data);
        }
        out.push('\n');
    }
    out
}

/// Writes an alignment to a FASTA file, creating parent directories.
pub fn write_fasta<P: AsRef<Path>>(
    alignment: &Alignment,
    path: P,
    strip_gaps: bool,
) -> FastaResult<()> {
    if alignment.is_empty() {
        return Err(FastaError::NoSequences);
    }

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(format_fasta(alignment, strip_gaps).as_bytes())?;
    writer.flush()?;
    Ok(())
}
