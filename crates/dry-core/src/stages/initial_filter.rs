//! InitialFilter — three sub-filters applied in order: sample-NaN,
//! manual probe rejection (P100 only), probe-NaN-and-SD.

use dry_model::{AssayType, DryError, MatrixTriple, ProvenanceCode, SampleId};

use crate::stats::{nonmissing_fraction, sample_sd_ignoring_missing};

/// The percentage suffix the sample/probe NaN filters append to their tag
/// (`SF` + `sample_frac_cutoff * 10` rounded, e.g. `0.3` -> `"SF3"`).
fn fraction_tag(prefix: &str, cutoff: f64) -> String {
    format!("{prefix}{}", (cutoff * 10.0).round() as i64)
}

pub struct InitialFilterOutcome {
    pub triple: MatrixTriple,
    pub provenance: ProvenanceCode,
    /// Column ids surviving the sample-NaN sub-filter, for [`crate::stages::audit_writer`].
    pub post_sample_nan_remaining: Vec<SampleId>,
}

/// Runs the three sub-filters in order and returns the survivor triple plus
/// the updated provenance code and the sample-NaN survivor list.
pub fn initial_filter(
    triple: MatrixTriple,
    assay: AssayType,
    sample_frac_cutoff: f64,
    probe_frac_cutoff: f64,
    probe_sd_cutoff: f64,
    manual_rejection_field: &str,
    provenance: &ProvenanceCode,
    sample_filter_tag: &str,
    manual_reject_tag: &str,
    probe_filter_tag: &str,
) -> Result<InitialFilterOutcome, DryError> {
    let (triple, provenance) = filter_samples_by_nan(triple, sample_frac_cutoff, provenance, sample_filter_tag)?;
    triple.check_alignment("initial_filter::sample_nan")?;
    triple.check_nonempty("initial_filter::sample_nan")?;
    let post_sample_nan_remaining = triple.cols.ids().to_vec();

    let (triple, provenance) = if assay == AssayType::P100 {
        manual_probe_rejection(triple, manual_rejection_field, &provenance, manual_reject_tag)?
    } else {
        (triple, provenance)
    };
    triple.check_nonempty("initial_filter::manual_rejection")?;

    let (triple, provenance) =
        filter_probes_by_nan_and_sd(triple, probe_frac_cutoff, probe_sd_cutoff, &provenance, probe_filter_tag)?;
    triple.check_alignment("initial_filter::probe_nan_sd")?;
    triple.check_nonempty("initial_filter::probe_nan_sd")?;

    Ok(InitialFilterOutcome {
        triple,
        provenance,
        post_sample_nan_remaining,
    })
}

/// Drops any column whose non-missing fraction is strictly less than the
/// cutoff.
fn filter_samples_by_nan(
    triple: MatrixTriple,
    cutoff: f64,
    provenance: &ProvenanceCode,
    tag: &str,
) -> Result<(MatrixTriple, ProvenanceCode), DryError> {
    let n_cols = triple.data.n_cols();
    let keep: Vec<usize> = (0..n_cols)
        .filter(|&c| nonmissing_fraction(&triple.data.col_values(c)) >= cutoff)
        .collect();
    let out = triple.select_cols(&keep);
    Ok((out, provenance.with_appended(fraction_tag(tag, cutoff))))
}

/// Drops rows whose `manual_rejection_field` value is case-insensitively
/// `"FALSE"`/`"F"`/`"0"`. Runs only if at least one row is so marked;
/// otherwise the filter is skipped (see DESIGN.md) and no tag is
/// appended.
fn manual_probe_rejection(
    triple: MatrixTriple,
    field: &str,
    provenance: &ProvenanceCode,
    tag: &str,
) -> Result<(MatrixTriple, ProvenanceCode), DryError> {
    let n_rows = triple.data.n_rows();
    let mut any_rejected = false;
    let keep: Vec<usize> = (0..n_rows)
        .filter(|&r| {
            let id = triple.rows.id_at(r);
            let keep_row = triple
                .rows
                .get(id, field)
                .map(is_truthy)
                .unwrap_or(true);
            if !keep_row {
                any_rejected = true;
            }
            keep_row
        })
        .collect();

    if !any_rejected {
        tracing::warn!(field, "no probes marked for manual rejection, skipping MPR");
        return Ok((triple, provenance.clone()));
    }

    let out = triple.select_rows(&keep);
    Ok((out, provenance.with_appended(tag)))
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.to_ascii_uppercase().as_str(), "FALSE" | "F" | "0")
}

/// Drops rows whose non-missing fraction is below the cutoff OR whose
/// sample standard deviation (ddof = 1, ignoring missing values) exceeds
/// `sd_cutoff`.
fn filter_probes_by_nan_and_sd(
    triple: MatrixTriple,
    frac_cutoff: f64,
    sd_cutoff: f64,
    provenance: &ProvenanceCode,
    tag: &str,
) -> Result<(MatrixTriple, ProvenanceCode), DryError> {
    let n_rows = triple.data.n_rows();
    let keep: Vec<usize> = (0..n_rows)
        .filter(|&r| {
            let row = triple.data.row(r);
            nonmissing_fraction(row) >= frac_cutoff && sample_sd_ignoring_missing(row, 1) <= sd_cutoff
        })
        .collect();
    let out = triple.select_rows(&keep);
    Ok((out, provenance.with_appended(fraction_tag(tag, frac_cutoff))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dry_model::matrix::{Matrix, MetadataTable};
    use dry_model::ProbeId;
    use std::collections::BTreeMap;

    fn triple_with_row_field(
        data: Vec<Vec<f64>>,
        row_ids: &[&str],
        row_field_values: &[&str],
        col_ids: &[&str],
    ) -> MatrixTriple {
        let mut rows = MetadataTable::new();
        for (id, value) in row_ids.iter().zip(row_field_values) {
            let mut fields = BTreeMap::new();
            fields.insert("rej".to_string(), (*value).to_string());
            rows.push(ProbeId::new(*id).unwrap(), fields);
        }
        let mut cols = MetadataTable::new();
        for id in col_ids {
            cols.push(SampleId::new(*id).unwrap(), BTreeMap::new());
        }
        MatrixTriple::new(Matrix::from_rows(data), rows, cols)
    }

    #[test]
    fn matches_concrete_scenario_three_sample_nan() {
        // column 0 is 2/3 missing; cutoff 0.6 drops it, the rest survive.
        let triple = triple_with_row_field(
            vec![
                vec![0.5, 0.2, 0.1, 0.25],
                vec![f64::NAN, 0.45, 0.2, -0.1],
                vec![f64::NAN, 0.02, f64::NAN, 0.3],
            ],
            &["a", "b", "c"],
            &["TRUE", "TRUE", "TRUE"],
            &["c0", "c1", "c2", "c3"],
        );
        let prov = ProvenanceCode::new();
        let (out, out_prov) = filter_samples_by_nan(triple, 0.6, &prov, "SF").unwrap();
        assert_eq!(out.data.n_cols(), 3);
        assert_eq!(
            out.cols.ids(),
            &[
                SampleId::new("c1").unwrap(),
                SampleId::new("c2").unwrap(),
                SampleId::new("c3").unwrap()
            ]
        );
        assert_eq!(out_prov.tags(), ["SF6"]);
    }

    #[test]
    fn matches_original_initial_filtering_fixture() {
        let triple = triple_with_row_field(
            vec![
                vec![1.0, 2.0, 3.0],
                vec![f64::NAN, 5.0, f64::NAN],
                vec![7.0, 8.0, 9.0],
                vec![10.0, 11.0, 12.0],
            ],
            &["a", "b", "c", "d"],
            &["TRUE", "TRUE", "TRUE", "FALSE"],
            &["e", "f", "g"],
        );
        let prov = ProvenanceCode::parse("A+B", '+');
        let outcome = initial_filter(
            triple,
            AssayType::P100,
            0.3,
            0.5,
            3.0,
            "rej",
            &prov,
            "SF",
            "MPR",
            "PF",
        )
        .unwrap();

        assert_eq!(outcome.triple.data.n_rows(), 2);
        assert_eq!(outcome.triple.data.n_cols(), 3);
        assert_eq!(outcome.triple.data.get(0, 0), 1.0);
        assert_eq!(outcome.triple.data.get(1, 0), 7.0);
        assert_eq!(
            outcome.triple.rows.ids(),
            &[ProbeId::new("a").unwrap(), ProbeId::new("c").unwrap()]
        );
        assert_eq!(
            outcome.post_sample_nan_remaining,
            vec![
                SampleId::new("e").unwrap(),
                SampleId::new("f").unwrap(),
                SampleId::new("g").unwrap()
            ]
        );
        assert_eq!(outcome.provenance.tags(), ["A", "B", "SF3", "MPR", "PF5"]);
    }

    #[test]
    fn manual_rejection_skipped_when_all_rows_marked_true() {
        let triple = triple_with_row_field(
            vec![
                vec![1.0, 2.0, 3.0],
                vec![f64::NAN, 5.0, f64::NAN],
                vec![7.0, 8.0, 9.0],
                vec![10.0, 11.0, 12.0],
            ],
            &["a", "b", "c", "d"],
            &["TRUE", "TRUE", "TRUE", "TRUE"],
            &["e", "f", "g"],
        );
        let prov = ProvenanceCode::parse("A+B", '+');
        let outcome = initial_filter(
            triple,
            AssayType::P100,
            0.3,
            0.5,
            3.0,
            "rej",
            &prov,
            "SF",
            "MPR",
            "PF",
        )
        .unwrap();

        assert_eq!(outcome.triple.data.n_rows(), 3);
        assert_eq!(outcome.provenance.tags(), ["A", "B", "SF3", "PF5"]);
    }

    #[test]
    fn probe_filter_drops_sparse_and_high_sd_rows() {
        let triple = triple_with_row_field(
            vec![
                vec![10.0, 0.2, 0.1, 0.25],
                vec![f64::NAN, 0.45, 0.2, -0.1],
                vec![f64::NAN, 0.02, f64::NAN, 0.3],
            ],
            &["a", "b", "c"],
            &["TRUE", "TRUE", "TRUE"],
            &["c0", "c1", "c2", "c3"],
        );
        let prov = ProvenanceCode::new();
        let (out, _) = filter_probes_by_nan_and_sd(triple, 0.6, 3.0, &prov, "PF").unwrap();
        assert_eq!(out.data.n_rows(), 1);
        assert_eq!(out.rows.ids(), &[ProbeId::new("b").unwrap()]);
    }

    #[test]
    fn probe_with_a_single_observation_is_dropped_not_kept_on_zero_sd() {
        // A row with only one non-missing value has an undefined ddof=1
        // sample SD; it must not survive by comparing against a bogus 0.0.
        let triple = triple_with_row_field(
            vec![vec![5.0, f64::NAN]],
            &["a"],
            &["TRUE"],
            &["c0", "c1"],
        );
        let prov = ProvenanceCode::new();
        let (out, _) = filter_probes_by_nan_and_sd(triple, 0.4, 3.0, &prov, "PF").unwrap();
        assert_eq!(out.data.n_rows(), 0);
    }
}
