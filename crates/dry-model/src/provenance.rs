//! The provenance code: an append-only, ordered list of short tags recording
//! which stages have already run. Stored redundantly per-column in the
//! column-metadata table, but semantically a single attribute of the whole
//! matrix — validated uniform on ingestion, written identical on egress.

use crate::error::DryError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProvenanceCode {
    tags: Vec<String>,
}

impl ProvenanceCode {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Parse a delimited provenance string such as `"PRM+L2X+SF3"`.
    ///
    /// An empty string parses to an empty code rather than erroring — the
    /// emptiness check belongs to the caller, which knows whether an empty
    /// code is acceptable at that point (a freshly-parsed matrix may be
    /// legitimately un-processed).
    pub fn parse(joined: &str, delimiter: char) -> Self {
        if joined.is_empty() {
            return Self::new();
        }
        Self {
            tags: joined.split(delimiter).map(str::to_string).collect(),
        }
    }

    pub fn join(&self, delimiter: char) -> String {
        self.tags.join(&delimiter.to_string())
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn append(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn with_appended(&self, tag: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.append(tag);
        next
    }

    /// `self` is a valid continuation of `earlier`: `earlier`'s tags are a
    /// prefix of `self`'s tags.
    pub fn has_prefix(&self, earlier: &ProvenanceCode) -> bool {
        self.tags.len() >= earlier.tags.len() && self.tags[..earlier.tags.len()] == earlier.tags[..]
    }
}

/// Validate that every value in `raw_codes` is identical, and parse the
/// shared code. Fails with [`DryError::InvalidProvenance`] otherwise, or if
/// the (shared) code is empty.
pub fn extract_uniform_provenance(
    raw_codes: &[&str],
    delimiter: char,
) -> Result<ProvenanceCode, DryError> {
    let Some(first) = raw_codes.first() else {
        return Err(DryError::invalid_provenance(
            "provenance::extract",
            "no columns present",
        ));
    };
    if first.is_empty() {
        return Err(DryError::invalid_provenance(
            "provenance::extract",
            "provenance code is empty",
        ));
    }
    let mut mismatched: Vec<&str> = raw_codes.iter().copied().filter(|c| c != first).collect();
    if !mismatched.is_empty() {
        mismatched.sort_unstable();
        mismatched.dedup();
        return Err(DryError::invalid_provenance(
            "provenance::extract",
            format!(
                "all columns should have the same provenance code, but found distinct values: {mismatched:?}"
            ),
        ));
    }
    Ok(ProvenanceCode::parse(first, delimiter))
}
