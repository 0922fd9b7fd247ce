//! LogTransform — conditional base-2 log with `x <= 0` mapped to missing.

use dry_model::{Matrix, MatrixTriple, ProvenanceCode};

/// Applies `log2` elementwise, unless `tag` is already present in
/// `provenance` (idempotence: re-running the pipeline on already-logged
/// data must be a no-op on the data).
pub fn log_transform_if_needed(
    triple: MatrixTriple,
    provenance: &ProvenanceCode,
    tag: &str,
) -> (MatrixTriple, ProvenanceCode) {
    if provenance.contains(tag) {
        tracing::debug!(tag, "log transform already applied, skipping");
        return (triple, provenance.clone());
    }
    let data = log_transform(&triple.data);
    let next = MatrixTriple::new(data, triple.rows, triple.cols);
    (next, provenance.with_appended(tag))
}

/// `log2(x)` elementwise; non-positive and missing inputs become missing.
pub fn log_transform(data: &Matrix) -> Matrix {
    data.map(|x| if x <= 0.0 { f64::NAN } else { x.log2() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dry_model::matrix::MetadataTable;

    fn triple_from(rows: Vec<Vec<f64>>) -> MatrixTriple {
        let data = Matrix::from_rows(rows);
        let n_rows = data.n_rows();
        let n_cols = data.n_cols();
        let mut row_meta = MetadataTable::new();
        for r in 0..n_rows {
            row_meta.push(
                dry_model::ProbeId::new(format!("p{r}")).unwrap(),
                Default::default(),
            );
        }
        let mut col_meta = MetadataTable::new();
        for c in 0..n_cols {
            col_meta.push(
                dry_model::SampleId::new(format!("s{c}")).unwrap(),
                Default::default(),
            );
        }
        MatrixTriple::new(data, row_meta, col_meta)
    }

    #[test]
    fn matches_concrete_scenario_one() {
        let triple = triple_from(vec![
            vec![10.0, -3.0, 1.2],
            vec![0.45, 0.2, 0.0],
            vec![4.5, f64::NAN, 0.3],
        ]);
        let (out, prov) = log_transform_if_needed(triple, &ProvenanceCode::new(), "L2X");
        assert!(prov.contains("L2X"));
        let expected = [
            [3.322, f64::NAN, 0.263],
            [-1.152, -2.322, f64::NAN],
            [2.170, f64::NAN, -1.737],
        ];
        for r in 0..3 {
            for c in 0..3 {
                let got = out.data.get(r, c);
                let want = expected[r][c];
                if want.is_nan() {
                    assert!(got.is_nan(), "({r},{c}) expected NaN, got {got}");
                } else {
                    assert!(
                        (got - want).abs() < 1e-3,
                        "({r},{c}) expected {want}, got {got}"
                    );
                }
            }
        }
    }

    #[test]
    fn idempotent_when_tag_already_present() {
        let triple = triple_from(vec![vec![10.0, -3.0]]);
        let prov = ProvenanceCode::parse("GR1+L2X", '+');
        let (out, out_prov) = log_transform_if_needed(triple, &prov, "L2X");
        assert_eq!(out.data.get(0, 0), 10.0);
        assert_eq!(out.data.get(0, 1), -3.0);
        assert_eq!(out_prov, prov);
    }
}
