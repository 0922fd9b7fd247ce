//! Loads the three-section configuration record the pipeline driver
//! consults for nan markers, metadata field names, and per-assay
//! thresholds. TOML is used in place of the original `ConfigParser`/INI
//! format — same three sections, same keys, a syntax this corpus already
//! reaches for (see `sdtm-standards`'s use of the `toml` crate).

use std::collections::BTreeMap;
use std::path::Path;

use dry_model::DryError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IoSection {
    /// Values to treat as missing (NaN) when parsing the matrix file.
    pub nan_values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataSection {
    pub prov_code_field: String,
    pub prov_code_delimiter: String,
    pub assay_type_field: String,
    pub gcp_assays: Vec<String>,
    pub p100_assays: Vec<String>,
    #[serde(default)]
    pub gcp_normalization_peptide_id: Option<String>,
    pub manual_rejection_field: String,
    #[serde(default)]
    pub row_subset_field: Option<String>,
    #[serde(default)]
    pub col_subset_field: Option<String>,
    pub det_plate_field: String,
    pub det_well_field: String,
}

impl MetadataSection {
    /// The provenance delimiter must be exactly one character.
    pub fn prov_code_delimiter_char(&self) -> Result<char, DryError> {
        let mut chars = self.prov_code_delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DryError::config_missing(
                "config::metadata",
                format!(
                    "prov_code_delimiter must be a single character, got {:?}",
                    self.prov_code_delimiter
                ),
            )),
        }
    }
}

/// The `[parameters]` section: per-assay thresholds, the offset bounds, the
/// subset-normalization flag, and the configurable provenance tag names.
/// Kept as a loose key/value map because its keys are assay-prefixed
/// (`p100_sample_frac_cutoff`, `gcp_sample_frac_cutoff`, ...) rather than
/// fixed field names.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct ParametersSection(BTreeMap<String, toml::Value>);

impl dry_core::assay_config::ParameterLookup for ParametersSection {
    fn get_f64(&self, key: &str) -> Option<f64> {
        ParametersSection::get_f64(self, key)
    }
}

impl ParametersSection {
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|v| match v {
            toml::Value::Float(f) => Some(*f),
            toml::Value::Integer(i) => Some(*i as f64),
            toml::Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(toml::Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(toml::Value::as_bool)
    }

    pub fn require_f64(&self, key: &str, stage: &'static str) -> Result<f64, DryError> {
        self.get_f64(key)
            .ok_or_else(|| DryError::config_missing(stage, format!("missing numeric key {key:?}")))
    }

    pub fn require_str(&self, key: &str, stage: &'static str) -> Result<&str, DryError> {
        self.get_str(key)
            .ok_or_else(|| DryError::config_missing(stage, format!("missing key {key:?}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrySettings {
    pub io: IoSection,
    pub metadata: MetadataSection,
    pub parameters: ParametersSection,
}

pub fn load_settings(path: &Path) -> Result<DrySettings, DryError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|err| DryError::config_missing("config::load", format!("{path:?}: {err}")))
}

/// Parse an `"lo,hi"` offset-bounds string.
pub fn parse_offset_bounds(raw: &str) -> Result<(f64, f64), DryError> {
    let (lo, hi) = raw.split_once(',').ok_or_else(|| {
        DryError::config_missing(
            "config::offset_bounds",
            format!("expected \"lo,hi\", got {raw:?}"),
        )
    })?;
    let lo: f64 = lo.trim().parse().map_err(|_| {
        DryError::config_missing("config::offset_bounds", format!("invalid lower bound in {raw:?}"))
    })?;
    let hi: f64 = hi.trim().parse().map_err(|_| {
        DryError::config_missing("config::offset_bounds", format!("invalid upper bound in {raw:?}"))
    })?;
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[io]
nan_values = ["NaN", "#N/A", ""]

[metadata]
prov_code_field = "provenance_code"
prov_code_delimiter = "+"
assay_type_field = "assay_type"
gcp_assays = ["GCP"]
p100_assays = ["P100"]
gcp_normalization_peptide_id = "BI10052"
manual_rejection_field = "manual_reject"
row_subset_field = "pr_probe_normalization_group"
col_subset_field = "det_normalization_group_vector"
det_plate_field = "det_plate"
det_well_field = "det_well"

[parameters]
p100_sample_frac_cutoff = 0.8
gcp_sample_frac_cutoff = 0.5
p100_probe_frac_cutoff = 0.9
probe_sd_cutoff = 3.0
offset_bounds = "-3,3"
ignore_subset_norm = false
log_tag = "L2X"
"#;

    #[test]
    fn parses_three_sections() {
        let settings: DrySettings = toml::from_str(SAMPLE).unwrap();
        assert_eq!(settings.io.nan_values, vec!["NaN", "#N/A", ""]);
        assert_eq!(settings.metadata.prov_code_delimiter_char().unwrap(), '+');
        assert_eq!(
            settings
                .parameters
                .require_f64("p100_sample_frac_cutoff", "test")
                .unwrap(),
            0.8
        );
        assert_eq!(settings.parameters.get_bool("ignore_subset_norm"), Some(false));
    }

    #[test]
    fn parses_offset_bounds() {
        assert_eq!(parse_offset_bounds("-3,3").unwrap(), (-3.0, 3.0));
        assert!(parse_offset_bounds("garbage").is_err());
    }
}
