//! Data model for alignment processing.
//!
//! An [`Alignment`] is an insertion-ordered set of named sequences read from
//! one input file. Names are unique (they are map keys); inserting a name a
//! second time replaces its sequence in place and is remembered as a
//! collision so the caller can report it.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::map::Iter;
use indexmap::IndexMap;

/// A single named sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Sanitized identifier
    pub id: String,
    /// Residues, gaps and ambiguity symbols exactly as read
    pub data: String,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

/// Molecule type used to route output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceType {
    Dna,
    Protein,
}

impl SequenceType {
    /// Directory name used when splitting output by type.
    pub fn dir_name(self) -> &'static str {
        match self {
            SequenceType::Dna => "dna",
            SequenceType::Protein => "protein",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Ordered collection of sequences from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    records: IndexMap<String, String>,
    /// Names that were inserted more than once, in the order the repeat was seen
    collisions: Vec<String>,
}

impl Alignment {
    /// Creates an empty alignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an alignment from sequences, applying the same
    /// last-write-wins rule as [`Alignment::insert`].
    pub fn from_sequences(sequences: impl IntoIterator<Item = Sequence>) -> Self {
        let mut alignment = Self::new();
        for seq in sequences {
            alignment.insert(seq.id, seq.data);
        }
        alignment
    }

    /// Inserts a record. If the name already exists, the new sequence takes
    /// the existing slot and the previous sequence is returned.
    pub fn insert(&mut self, id: impl Into<String>, data: impl Into<String>) -> Option<String> {
        let id = id.into();
        let previous = self.records.insert(id.clone(), data.into());
        if previous.is_some() {
            self.collisions.push(id);
        }
        previous
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the alignment holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets the record at a position in insertion order.
    pub fn get(&self, index: usize) -> Option<(&str, &str)> {
        self.records
            .get_index(index)
            .map(|(id, data)| (id.as_str(), data.as_str()))
    }

    /// Looks up a sequence by name.
    pub fn sequence(&self, id: &str) -> Option<&str> {
        self.records.get(id).map(String::as_str)
    }

    /// Iterates over `(name, sequence)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.records.iter()
    }

    /// Iterates over the names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Iterates over the sequences in insertion order.
    pub fn sequences(&self) -> impl Iterator<Item = &str> {
        self.records.values().map(String::as_str)
    }

    /// Names that were overwritten by a later record with the same name.
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    /// Returns the distinct sequence lengths present.
    pub fn lengths(&self) -> BTreeSet<usize> {
        self.records.values().map(|s| s.chars().count()).collect()
    }

    /// True when every sequence has the same length (an alignment matrix).
    pub fn is_valid_alignment(&self) -> bool {
        self.lengths().len() <= 1
    }

    /// Returns the maximum identifier length (for name padding).
    pub fn max_id_length(&self) -> usize {
        self.records
            .keys()
            .map(|id| id.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
