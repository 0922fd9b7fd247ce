//! AuditWriter — one record per original column, regardless of which
//! filters it survived.

use std::collections::HashSet;

use dry_model::audit::{AuditRecord, AuditTable};
use dry_model::{DryError, OffsetVector, SampleId};

/// Inputs snapshotted at fixed points in the driver: the full original
/// column-id list (step 2), the sample-NaN survivors (step 6), and, for
/// P100 only, the outlier-filter survivors plus their aligned offsets
/// (step 8).
pub struct AuditInputs<'a> {
    pub original_columns: &'a [SampleId],
    pub plate_field: &'a str,
    pub well_field: &'a str,
    pub post_sample_nan_remaining: &'a [SampleId],
    pub post_sample_dist_remaining: Option<&'a [SampleId]>,
    pub offsets: Option<&'a OffsetVector>,
    /// Column metadata as it stood before the pipeline ran, used to look up
    /// `plate_field`/`well_field` for every original id.
    pub original_column_metadata: &'a dry_model::matrix::MetadataTable<SampleId>,
}

/// Builds the audit table with one row per id in `original_columns`, in
/// that order.
///
/// `offset` is populated only for ids present in `post_sample_dist_remaining`
/// (see DESIGN.md); for GCP runs, or P100 runs with no outlier filtering
/// applied, `post_sample_dist_remaining` is `None` and every offset is
/// missing.
pub fn write_audit(inputs: AuditInputs<'_>) -> Result<AuditTable, DryError> {
    let nan_remaining: HashSet<&SampleId> = inputs.post_sample_nan_remaining.iter().collect();
    let dist_remaining: Option<HashSet<&SampleId>> =
        inputs.post_sample_dist_remaining.map(|ids| ids.iter().collect());

    let records = inputs
        .original_columns
        .iter()
        .map(|id| {
            let plate_name = inputs
                .original_column_metadata
                .get(id, inputs.plate_field)
                .unwrap_or_default()
                .to_string();
            let well_name = inputs
                .original_column_metadata
                .get(id, inputs.well_field)
                .unwrap_or_default()
                .to_string();
            let survived_outlier = dist_remaining.as_ref().is_some_and(|set| set.contains(id));
            let survived_coverage = nan_remaining.contains(id);

            let offset = if survived_outlier {
                dist_remaining
                    .as_ref()
                    .zip(inputs.offsets)
                    .and_then(|(remaining, offsets)| {
                        remaining
                            .iter()
                            .position(|&rid| rid == id)
                            .map(|pos| offsets.as_slice()[pos])
                    })
            } else {
                None
            };

            AuditRecord {
                plate_name,
                well_name,
                offset,
                survived_outlier,
                survived_coverage,
            }
        })
        .collect();

    Ok(AuditTable::new(records))
}
