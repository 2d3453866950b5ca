//! Sequence name cleaning.
//!
//! PHYLIP and most tree tools split on whitespace and treat Newick
//! punctuation as syntax, so every such character in a taxon label is
//! replaced by an underscore before the name reaches an output file.

/// Characters that may not appear in an output name.
pub const FORBIDDEN_NAME_CHARS: [char; 11] =
    [' ', '(', ')', ':', ';', ',', '[', ']', '/', '+', '\''];

/// Returns true if `c` would be replaced by [`sanitize_name`].
pub fn is_forbidden(c: char) -> bool {
    FORBIDDEN_NAME_CHARS.contains(&c)
}

/// Replaces every forbidden character with `_`; everything else passes through.
///
/// ```
/// use phyloprep::sanitize::sanitize_name;
///
/// assert_eq!(sanitize_name("seq (one)"), "seq__one_");
/// assert_eq!(sanitize_name("already_clean"), "already_clean");
/// ```
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}
