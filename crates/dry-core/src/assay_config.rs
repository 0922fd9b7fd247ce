//! Resolves the three per-assay numeric thresholds: a caller
//! override wins when present, otherwise the assay-prefixed configuration
//! key (`p100_sample_frac_cutoff`, `gcp_sample_frac_cutoff`, ...) is looked
//! up. Decoupled from any concrete configuration file format — callers
//! supply a [`ParameterLookup`] impl (the ingest crate implements it over
//! its parsed TOML `[parameters]` section).

use dry_model::{AssayType, DryError};

/// A source of named numeric configuration values, independent of the file
/// format they were parsed from.
pub trait ParameterLookup {
    fn get_f64(&self, key: &str) -> Option<f64>;
}

/// Resolve a single assay-prefixed numeric threshold.
pub fn resolve_f64(
    assay: AssayType,
    key_suffix: &str,
    override_value: Option<f64>,
    source: &dyn ParameterLookup,
    stage: &'static str,
) -> Result<f64, DryError> {
    if let Some(value) = override_value {
        return Ok(value);
    }
    let key = format!("{}_{key_suffix}", assay.config_prefix());
    source
        .get_f64(&key)
        .ok_or_else(|| DryError::config_missing(stage, format!("missing configuration key {key:?}")))
}

/// The three thresholds [`crate::stages::initial_filter`] and
/// [`crate::stages::outlier_filter`] consult, resolved once per run.
#[derive(Debug, Clone, Copy)]
pub struct AssayThresholds {
    pub sample_frac_cutoff: f64,
    pub probe_frac_cutoff: f64,
    pub probe_sd_cutoff: f64,
    pub dist_sd_cutoff: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdOverrides {
    pub sample_frac_cutoff: Option<f64>,
    pub probe_frac_cutoff: Option<f64>,
    pub probe_sd_cutoff: Option<f64>,
    pub dist_sd_cutoff: Option<f64>,
}

impl AssayThresholds {
    pub fn resolve(
        assay: AssayType,
        overrides: ThresholdOverrides,
        source: &dyn ParameterLookup,
    ) -> Result<Self, DryError> {
        Ok(Self {
            sample_frac_cutoff: resolve_f64(
                assay,
                "sample_frac_cutoff",
                overrides.sample_frac_cutoff,
                source,
                "assay_config::sample_frac_cutoff",
            )?,
            probe_frac_cutoff: resolve_f64(
                assay,
                "probe_frac_cutoff",
                overrides.probe_frac_cutoff,
                source,
                "assay_config::probe_frac_cutoff",
            )?,
            probe_sd_cutoff: resolve_f64(
                assay,
                "probe_sd_cutoff",
                overrides.probe_sd_cutoff,
                source,
                "assay_config::probe_sd_cutoff",
            )?,
            dist_sd_cutoff: resolve_f64(
                assay,
                "dist_sd_cutoff",
                overrides.dist_sd_cutoff,
                source,
                "assay_config::dist_sd_cutoff",
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct MapSource(BTreeMap<&'static str, f64>);

    impl ParameterLookup for MapSource {
        fn get_f64(&self, key: &str) -> Option<f64> {
            self.0.get(key).copied()
        }
    }

    #[test]
    fn override_wins_over_config() {
        let source = MapSource(BTreeMap::from([("p100_probe_frac_cutoff", 0.4)]));
        let value = resolve_f64(
            AssayType::P100,
            "probe_frac_cutoff",
            Some(0.5),
            &source,
            "test",
        )
        .unwrap();
        assert_eq!(value, 0.5);
    }

    #[test]
    fn falls_back_to_assay_prefixed_key() {
        let source = MapSource(BTreeMap::from([
            ("gcp_sample_frac_cutoff", 0.1),
            ("p100_sample_frac_cutoff", 0.3),
        ]));
        let value = resolve_f64(AssayType::P100, "sample_frac_cutoff", None, &source, "test").unwrap();
        assert_eq!(value, 0.3);
    }

    #[test]
    fn missing_key_is_config_missing_error() {
        let source = MapSource(BTreeMap::new());
        let err = resolve_f64(AssayType::Gcp, "probe_sd_cutoff", None, &source, "test").unwrap_err();
        assert!(matches!(err, DryError::ConfigMissing { .. }));
    }

    #[test]
    fn resolves_all_four_thresholds_matching_fixture() {
        // Mirrors a `check_assay_specific_thresh`-style scenario: both
        // assay prefixes configured at once, only the resolved assay's
        // keys should be picked up.
        let source = MapSource(BTreeMap::from([
            ("gcp_sample_frac_cutoff", 0.1),
            ("gcp_probe_frac_cutoff", 0.2),
            ("p100_sample_frac_cutoff", 0.3),
            ("p100_probe_frac_cutoff", 0.4),
            ("gcp_probe_sd_cutoff", 0.5),
            ("p100_probe_sd_cutoff", 0.6),
            ("p100_dist_sd_cutoff", 3.0),
        ]));
        let thresholds = AssayThresholds::resolve(
            AssayType::P100,
            ThresholdOverrides {
                probe_frac_cutoff: Some(0.5),
                ..Default::default()
            },
            &source,
        )
        .unwrap();
        assert_eq!(thresholds.sample_frac_cutoff, 0.3);
        assert_eq!(thresholds.probe_frac_cutoff, 0.5);
        assert_eq!(thresholds.probe_sd_cutoff, 0.6);
        assert_eq!(thresholds.dist_sd_cutoff, 3.0);
    }
}
