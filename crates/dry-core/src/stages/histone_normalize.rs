//! HistoneNormalize (GCP only) — subtract the reference histone/peptide
//! row from every other row, then drop that row.

use dry_model::matrix::Matrix;
use dry_model::{AssayType, DryError, MatrixTriple, ProbeId, ProvenanceCode};

/// No-op unless `assay == Gcp` and `norm_peptide_id` names a present row.
/// An empty/missing peptide id is a no-op with no tag appended, per section
/// 4.3 ("If the peptide id is missing or empty, the stage is a no-op").
pub fn histone_normalize_if_needed(
    triple: MatrixTriple,
    assay: AssayType,
    norm_peptide_id: Option<&str>,
    provenance: &ProvenanceCode,
    tag: &str,
) -> Result<(MatrixTriple, ProvenanceCode), DryError> {
    if assay != AssayType::Gcp {
        return Ok((triple, provenance.clone()));
    }
    let Some(peptide_id) = norm_peptide_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("gcp assay but no normalization peptide configured, skipping H3N");
        return Ok((triple, provenance.clone()));
    };
    let probe_id = ProbeId::new(peptide_id)?;
    let normalized = histone_normalize(&triple, &probe_id)?;
    Ok((normalized, provenance.with_appended(tag)))
}

/// Subtracts row `h` from every other row (elementwise per column) and
/// removes row `h` from the output.
pub fn histone_normalize(triple: &MatrixTriple, h: &ProbeId) -> Result<MatrixTriple, DryError> {
    let h_pos = triple.rows.position_of(h).ok_or_else(|| {
        DryError::misaligned_metadata(
            "histone_normalize",
            format!("normalization peptide {h:?} not found among row ids"),
        )
    })?;
    let n_rows = triple.data.n_rows();
    let n_cols = triple.data.n_cols();
    let h_row: Vec<f64> = triple.data.row(h_pos).to_vec();

    let keep: Vec<usize> = (0..n_rows).filter(|&r| r != h_pos).collect();
    let mut out = Matrix::filled(keep.len(), n_cols, f64::NAN);
    for (new_r, &old_r) in keep.iter().enumerate() {
        let row = triple.data.row(old_r);
        for c in 0..n_cols {
            out.set(new_r, c, row[c] - h_row[c]);
        }
    }

    let rows = triple.rows.select(&keep);
    Ok(MatrixTriple::new(out, rows, triple.cols.clone()))
}
