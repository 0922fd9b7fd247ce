//! The P100 / GCP assay-type split that conditional stages dispatch on.

use crate::error::DryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssayType {
    /// A 96-plex peptide assay.
    P100,
    /// Global chromatin profiling.
    Gcp,
}

impl AssayType {
    /// The lowercased name used to prefix per-assay configuration keys
    /// (`p100_sample_frac_cutoff`, `gcp_sample_frac_cutoff`, ...).
    pub fn config_prefix(self) -> &'static str {
        match self {
            Self::P100 => "p100",
            Self::Gcp => "gcp",
        }
    }

    /// Resolve an assay type from a column-metadata value by case-insensitive
    /// membership in one of the two configured name lists, or from an
    /// override string if one was supplied.
    pub fn resolve(
        value: &str,
        override_value: Option<&str>,
        p100_assays: &[String],
        gcp_assays: &[String],
    ) -> Result<Self, DryError> {
        let candidate = override_value.unwrap_or(value);
        let lower = candidate.to_ascii_lowercase();
        if p100_assays.iter().any(|a| a.to_ascii_lowercase() == lower) {
            return Ok(Self::P100);
        }
        if gcp_assays.iter().any(|a| a.to_ascii_lowercase() == lower) {
            return Ok(Self::Gcp);
        }
        Err(DryError::unknown_assay(
            "assay::resolve",
            format!("assay value {candidate:?} matched neither the p100 nor gcp lists"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_prefix_matches_assay() {
        assert_eq!(AssayType::P100.config_prefix(), "p100");
        assert_eq!(AssayType::Gcp.config_prefix(), "gcp");
    }

    #[test]
    fn resolves_case_insensitively() {
        let p100 = vec!["P100".to_string()];
        let gcp = vec!["GCP".to_string()];
        assert_eq!(
            AssayType::resolve("p100", None, &p100, &gcp).unwrap(),
            AssayType::P100
        );
        assert_eq!(
            AssayType::resolve("gcp", None, &p100, &gcp).unwrap(),
            AssayType::Gcp
        );
    }

    #[test]
    fn override_takes_priority() {
        let p100 = vec!["P100".to_string()];
        let gcp = vec!["GCP".to_string()];
        assert_eq!(
            AssayType::resolve("gcp", Some("p100"), &p100, &gcp).unwrap(),
            AssayType::P100
        );
    }

    #[test]
    fn unmatched_value_is_an_error() {
        let p100 = vec!["P100".to_string()];
        let gcp = vec!["GCP".to_string()];
        assert!(AssayType::resolve("unknown", None, &p100, &gcp).is_err());
    }
}
