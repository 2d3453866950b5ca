//! NEXUS MATRIX reader.
//!
//! Only the first `MATRIX ... ;` block matters; everything around it
//! (DIMENSIONS, FORMAT, other blocks) is ignored.
//!
//! ```text
//! #NEXUS
//! BEGIN DATA;
//!   DIMENSIONS NTAX=2 NCHAR=10;
//!   FORMAT DATATYPE=DNA GAP=-;
//!   MATRIX
//!     Homo sapiens  ACGTACGTAC
//!     Pan           TGCATGCATG
//!   ;
//! END;
//! ```
//!
//! Each matrix line is split on whitespace: the last token is the sequence
//! and the tokens before it, joined with `_`, form the taxon name. So a
//! label may contain spaces but a sequence may not.

use thiserror::Error;

use crate::model::Alignment;
use crate::sanitize::sanitize_name;

const MATRIX_KEYWORD: &str = "MATRIX";

/// Errors that can occur during NEXUS parsing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NexusError {
    #[error("No MATRIX block found in NEXUS file")]
    NoMatrixBlock,
}

/// Result type for NEXUS operations.
pub type NexusResult<T> = Result<T, NexusError>;

/// Parses NEXUS content from a string.
pub fn parse_nexus_str(content: &str) -> NexusResult<Alignment> {
    let block = find_matrix_block(content).ok_or(NexusError::NoMatrixBlock)?;

    let mut alignment = Alignment::new();
    for line in block.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        // Needs at least a label and a sequence
        let Some((sequence, label)) = parts.split_last() else {
            continue;
        };
        if label.is_empty() {
            continue;
        }

        let name = sanitize_name(&label.join("_"));
        if alignment.insert(name.as_str(), *sequence).is_some() {
            log::warn!("Duplicate taxon '{}': later row replaces earlier one", name);
        }
    }

    Ok(alignment)
}

/// Returns the text between the first `MATRIX` keyword (any case) and the
/// next `;`, or `None` if either is missing.
fn find_matrix_block(content: &str) -> Option<&str> {
    // ASCII upper-casing keeps byte offsets valid for slicing `content`
    let upper = content.to_ascii_uppercase();
    let start = upper.find(MATRIX_KEYWORD)? + MATRIX_KEYWORD.len();
    let end = start + content[start..].find(';')?;
    Some(&content[start..end])
}
