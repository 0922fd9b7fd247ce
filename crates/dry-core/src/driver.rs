//! PipelineDriver — orders the seven stages, threads the provenance code
//! through them, and dispatches on assay type.

use dry_model::matrix::MetadataTable;
use dry_model::{AssayType, AuditTable, DryError, MatrixTriple, OffsetVector, ProvenanceCode, SampleId};

use crate::assay_config::{AssayThresholds, ParameterLookup, ThresholdOverrides};
use crate::stages::{audit_writer, histone_normalize, initial_filter, log_transform, median_normalizer, offset_optimizer, outlier_filter};

/// Metadata field names and provenance-tag names the driver needs, all
/// caller-supplied so `dry-core` never depends on a concrete configuration
/// file format (see [`crate::assay_config::ParameterLookup`] for the same
/// decoupling on the numeric side).
pub struct DriverFields<'a> {
    pub prov_code_field: &'a str,
    pub prov_code_delimiter: char,
    pub assay_type_field: &'a str,
    pub p100_assays: &'a [String],
    pub gcp_assays: &'a [String],
    pub force_assay: Option<&'a str>,
    pub gcp_normalization_peptide_id: Option<&'a str>,
    pub manual_rejection_field: &'a str,
    pub row_subset_field: Option<&'a str>,
    pub col_subset_field: Option<&'a str>,
    pub det_plate_field: &'a str,
    pub det_well_field: &'a str,
    pub optimization_offset_field: &'a str,
}

/// Provenance tag names, each individually configurable via the
/// configuration contract (`log_tag`, `histone_tag`, ...).
pub struct DriverTags<'a> {
    pub log_tag: &'a str,
    pub histone_tag: &'a str,
    pub sample_filter_tag: &'a str,
    pub manual_reject_tag: &'a str,
    pub probe_filter_tag: &'a str,
    pub offset_tag: &'a str,
    pub outlier_tag: &'a str,
    pub global_median_tag: &'a str,
    pub subset_median_tag: &'a str,
}

pub struct DriverOptions<'a> {
    pub fields: DriverFields<'a>,
    pub tags: DriverTags<'a>,
    pub threshold_overrides: ThresholdOverrides,
    pub offset_bounds: (f64, f64),
    pub no_optimize: bool,
    pub ignore_subset_norm: bool,
}

pub struct DriverOutput {
    pub triple: MatrixTriple,
    pub provenance: ProvenanceCode,
    pub audit: AuditTable,
    pub offsets: Option<OffsetVector>,
}

/// Runs the full pipeline, steps 1-10, over an ingested
/// `MatrixTriple` and a numeric-threshold source.
pub fn run(
    triple: MatrixTriple,
    options: &DriverOptions<'_>,
    parameters: &dyn ParameterLookup,
) -> Result<DriverOutput, DryError> {
    triple.check_alignment("driver::entry")?;
    triple.check_nonempty("driver::entry")?;
    let fields = &options.fields;
    let tags = &options.tags;

    // Step 1: derive AssayType from column metadata or the override.
    let raw_codes: Vec<&str> = triple
        .cols
        .ids()
        .iter()
        .map(|id| triple.cols.get(id, fields.prov_code_field).unwrap_or(""))
        .collect();
    let provenance = dry_model::extract_uniform_provenance(&raw_codes, fields.prov_code_delimiter)?;

    let first_col = triple.cols.id_at(0);
    let assay_value = triple
        .cols
        .get(first_col, fields.assay_type_field)
        .unwrap_or_default();
    let assay = AssayType::resolve(
        assay_value,
        fields.force_assay,
        fields.p100_assays,
        fields.gcp_assays,
    )?;

    // Step 2: snapshot the original column id list for the audit writer.
    let original_columns: Vec<SampleId> = triple.cols.ids().to_vec();
    let original_column_metadata: MetadataTable<SampleId> = triple.cols.clone();

    // Step 3: LogTransform, idempotent via the provenance tag.
    let (triple, provenance) = log_transform::log_transform_if_needed(triple, &provenance, tags.log_tag);

    // Step 4: HistoneNormalize (GCP only).
    let (triple, provenance) = histone_normalize::histone_normalize_if_needed(
        triple,
        assay,
        fields.gcp_normalization_peptide_id,
        &provenance,
        tags.histone_tag,
    )?;

    // Step 5: resolve thresholds.
    let thresholds = AssayThresholds::resolve(assay, options.threshold_overrides, parameters)?;

    // Step 6: InitialFilter.
    let filtered = initial_filter::initial_filter(
        triple,
        assay,
        thresholds.sample_frac_cutoff,
        thresholds.probe_frac_cutoff,
        thresholds.probe_sd_cutoff,
        fields.manual_rejection_field,
        &provenance,
        tags.sample_filter_tag,
        tags.manual_reject_tag,
        tags.probe_filter_tag,
    )?;
    let triple = filtered.triple;
    let provenance = filtered.provenance;
    let post_sample_nan_remaining = filtered.post_sample_nan_remaining;

    // Step 7: OffsetOptimizer (P100 only, unless disabled).
    let optimized = offset_optimizer::optimize_offsets_if_needed(
        triple,
        assay,
        options.no_optimize,
        options.offset_bounds,
        &provenance,
        tags.offset_tag,
    );
    let triple = optimized.triple;
    let provenance = optimized.provenance;
    let offsets = optimized.offsets;
    let distances = optimized.distances;

    // Step 8: OutlierFilter (P100 only). Records post_sample_dist_remaining.
    let (triple, provenance, offsets, post_sample_dist_remaining) = if assay == AssayType::P100 {
        if let Some(distances) = &distances {
            let outcome = outlier_filter::filter_samples_by_distance_if_needed(
                triple,
                assay,
                offsets,
                distances,
                thresholds.dist_sd_cutoff,
                &provenance,
                tags.outlier_tag,
            );
            (outcome.triple, outcome.provenance, outcome.offsets, outcome.remaining)
        } else {
            (triple, provenance, offsets, None)
        }
    } else {
        (triple, provenance, offsets, None)
    };

    // Step 9: MedianNormalizer.
    let (triple, provenance) = median_normalizer::median_normalize(
        triple,
        options.ignore_subset_norm,
        fields.row_subset_field,
        fields.col_subset_field,
        &provenance,
        tags.subset_median_tag,
        tags.global_median_tag,
    );

    // Output contract: write the joined provenance code back into
    // every column and, if offsets exist, a new `optimization_offset` field.
    let mut triple = triple;
    triple.cols.set_all(fields.prov_code_field, provenance.join(fields.prov_code_delimiter));
    if let Some(offsets) = &offsets {
        for (position, id) in triple.cols.ids().to_vec().iter().enumerate() {
            triple
                .cols
                .set(id, fields.optimization_offset_field, offsets.as_slice()[position].to_string());
        }
    }
    triple.check_alignment("driver::exit")?;

    // Step 10: AuditWriter.
    let audit = audit_writer::write_audit(audit_writer::AuditInputs {
        original_columns: &original_columns,
        plate_field: fields.det_plate_field,
        well_field: fields.det_well_field,
        post_sample_nan_remaining: &post_sample_nan_remaining,
        post_sample_dist_remaining: post_sample_dist_remaining.as_deref(),
        offsets: offsets.as_ref(),
        original_column_metadata: &original_column_metadata,
    })?;

    Ok(DriverOutput {
        triple,
        provenance,
        audit,
        offsets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dry_model::matrix::Matrix;
    use dry_model::ProbeId;
    use std::collections::BTreeMap;

    struct MapSource(BTreeMap<&'static str, f64>);

    impl ParameterLookup for MapSource {
        fn get_f64(&self, key: &str) -> Option<f64> {
            self.0.get(key).copied()
        }
    }

    fn field(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn gcp_run_applies_log_and_histone_then_writes_audit() {
        let data = Matrix::from_rows(vec![
            vec![4.0, 8.0, 16.0],
            vec![2.0, 2.0, 2.0],
            vec![8.0, 4.0, 2.0],
        ]);
        let mut rows = MetadataTable::new();
        rows.push(ProbeId::new("histone").unwrap(), BTreeMap::new());
        rows.push(ProbeId::new("p1").unwrap(), BTreeMap::new());
        rows.push(ProbeId::new("p2").unwrap(), BTreeMap::new());

        let mut cols = MetadataTable::new();
        for id in ["s1", "s2", "s3"] {
            cols.push(
                SampleId::new(id).unwrap(),
                field(&[
                    ("provenance_code", "PRM"),
                    ("assay_type", "GCP"),
                    ("det_plate", "PLATE1"),
                    ("det_well", id),
                ]),
            );
        }
        let triple = MatrixTriple::new(data, rows, cols);

        let options = DriverOptions {
            fields: DriverFields {
                prov_code_field: "provenance_code",
                prov_code_delimiter: '+',
                assay_type_field: "assay_type",
                p100_assays: &["P100".to_string()],
                gcp_assays: &["GCP".to_string()],
                force_assay: None,
                gcp_normalization_peptide_id: Some("histone"),
                manual_rejection_field: "manual_reject",
                row_subset_field: None,
                col_subset_field: None,
                det_plate_field: "det_plate",
                det_well_field: "det_well",
                optimization_offset_field: "optimization_offset",
            },
            tags: DriverTags {
                log_tag: "L2X",
                histone_tag: "H3N",
                sample_filter_tag: "SF",
                manual_reject_tag: "MPR",
                probe_filter_tag: "PF",
                offset_tag: "LLB",
                outlier_tag: "OSF",
                global_median_tag: "RMN",
                subset_median_tag: "GMN",
            },
            threshold_overrides: ThresholdOverrides {
                sample_frac_cutoff: Some(0.1),
                probe_frac_cutoff: Some(0.1),
                probe_sd_cutoff: Some(100.0),
                dist_sd_cutoff: Some(3.0),
            },
            offset_bounds: (-3.0, 3.0),
            no_optimize: false,
            ignore_subset_norm: true,
        };

        let source = MapSource(BTreeMap::new());
        let output = run(triple, &options, &source).unwrap();

        assert!(output.provenance.contains("L2X"));
        assert!(output.provenance.contains("H3N"));
        assert!(output.provenance.contains("RMN"));
        assert_eq!(output.triple.rows.len(), 2);
        assert_eq!(output.audit.records.len(), 3);
        assert!(output.offsets.is_none());
        let joined = output.provenance.join('+');
        for id in output.triple.cols.ids() {
            assert_eq!(output.triple.cols.get(id, "provenance_code"), Some(joined.as_str()));
        }
    }
}
