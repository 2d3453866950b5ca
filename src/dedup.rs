//! Duplicate sequence removal.
//!
//! Two records are duplicates when their sequence strings are identical,
//! byte for byte. The first occurrence is kept.

use std::collections::HashSet;

use crate::model::Alignment;

/// Result of removing duplicates from one alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicated {
    /// Records kept, in original order
    pub kept: Alignment,
    /// Names of dropped records, in encounter order
    pub removed: Vec<String>,
}

/// Keeps the first record for each distinct sequence.
pub fn remove_duplicates(alignment: &Alignment) -> Deduplicated {
    let mut seen: HashSet<&str> = HashSet::with_capacity(alignment.sequence_count());
    let mut result = Deduplicated::default();

    for (id, data) in alignment {
        if seen.insert(data.as_str()) {
            result.kept.insert(id.as_str(), data.as_str());
        } else {
            result.removed.push(id.clone());
        }
    }

    result
}

/// A record dropped while merging several files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDuplicate {
    /// Label of the input the record came from (usually its path)
    pub source: String,
    /// Record name
    pub name: String,
}

/// Result of merging several alignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merged {
    pub kept: Alignment,
    pub removed: Vec<MergeDuplicate>,
}

/// Folds labelled alignments into one, keeping the first occurrence of each
/// sequence across all inputs. A later record whose name is already taken
/// by a different sequence replaces it, as within a single file; the
/// replaced sequence then counts as unseen again.
pub fn merge_unique<'a, I>(inputs: I) -> Merged
where
    I: IntoIterator<Item = (&'a str, &'a Alignment)>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Merged::default();

    for (source, alignment) in inputs {
        for (id, data) in alignment {
            if seen.insert(data.as_str()) {
                if let Some(previous) = merged.kept.insert(id.as_str(), data.as_str()) {
                    // The overwritten sequence is no longer in the output
                    seen.remove(previous.as_str());
                    log::warn!("{}: name '{}' already used by an earlier file", source, id);
                }
            } else {
                merged.removed.push(MergeDuplicate {
                    source: source.to_string(),
                    name: id.clone(),
                });
            }
        }
    }

    merged
}
