//! OffsetOptimizer (P100 only) — per-sample bounded scalar minimization
//! of the squared distance to fixed row-medians.
//!
//! The objective `f(o) = sum_r (D[r,c] + o - m_r)^2` is convex quadratic in
//! `o`, so the unconstrained minimum has the closed form
//! `o_c = mean_over_valid_r(m_r - D[r,c])` (see DESIGN.md's "Optimizer
//! choice" note). This implementation always uses the
//! analytic form rather than a black-box bounded minimizer, which is why
//! [`dry_model::DryError::OptimizerFailure`] is never actually raised here —
//! the numerical failure mode it exists for cannot occur.

use dry_model::matrix::Matrix;
use dry_model::{AssayType, DistanceVector, MatrixTriple, OffsetVector, ProvenanceCode};

use crate::stats::median_ignoring_missing;

pub struct OffsetOptimizerOutcome {
    pub triple: MatrixTriple,
    pub provenance: ProvenanceCode,
    /// `Some` only when the optimizer actually ran and shifted the data.
    pub offsets: Option<OffsetVector>,
    /// Distances to the row-medians; present whenever a P100 optimization
    /// step ran, even in `no_optimize` mode (computed with a zero offset).
    pub distances: Option<DistanceVector>,
}

/// Dispatches on assay type and the `no_optimize` flag.
pub fn optimize_offsets_if_needed(
    triple: MatrixTriple,
    assay: AssayType,
    no_optimize: bool,
    bounds: (f64, f64),
    provenance: &ProvenanceCode,
    tag: &str,
) -> OffsetOptimizerOutcome {
    if assay != AssayType::P100 {
        tracing::debug!(?assay, "offset optimization applies only to p100, skipping LLB");
        return OffsetOptimizerOutcome {
            triple,
            provenance: provenance.clone(),
            offsets: None,
            distances: None,
        };
    }

    let medians = row_medians(&triple.data);

    if no_optimize {
        let distances = distances_for_offsets(&triple.data, &medians, None);
        return OffsetOptimizerOutcome {
            triple,
            provenance: provenance.clone(),
            offsets: None,
            distances: Some(distances),
        };
    }

    let (offsets, distances) = calculate_distances_and_optimize(&triple.data, &medians, bounds);
    let data = apply_offsets(&triple.data, &offsets);
    let next = MatrixTriple::new(data, triple.rows, triple.cols);
    OffsetOptimizerOutcome {
        triple: next,
        provenance: provenance.with_appended(tag),
        offsets: Some(offsets),
        distances: Some(distances),
    }
}

fn row_medians(data: &Matrix) -> Vec<f64> {
    (0..data.n_rows())
        .map(|r| median_ignoring_missing(data.row(r)))
        .collect()
}

/// The analytic closed-form offset for a single column, clipped to
/// `[lo, hi]`.
fn optimal_offset_for_column(data: &Matrix, medians: &[f64], c: usize, bounds: (f64, f64)) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for r in 0..data.n_rows() {
        let value = data.get(r, c);
        let median = medians[r];
        if value.is_nan() || median.is_nan() {
            continue;
        }
        sum += median - value;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    let raw = sum / count as f64;
    raw.clamp(bounds.0, bounds.1)
}

fn distance_for_column(data: &Matrix, medians: &[f64], c: usize, offset: f64) -> f64 {
    let mut total = 0.0;
    for r in 0..data.n_rows() {
        let value = data.get(r, c);
        let median = medians[r];
        if value.is_nan() || median.is_nan() {
            continue;
        }
        total += (value + offset - median).powi(2);
    }
    total
}

fn distances_for_offsets(data: &Matrix, medians: &[f64], offsets: Option<&OffsetVector>) -> DistanceVector {
    let values: Vec<f64> = (0..data.n_cols())
        .map(|c| {
            let offset = offsets.map_or(0.0, |o| o.as_slice()[c]);
            distance_for_column(data, medians, c, offset)
        })
        .collect();
    DistanceVector::new(values)
}

/// Computes the per-column optimal offsets and their resulting distances
/// against fixed row-medians, without mutating `data`.
pub fn calculate_distances_and_optimize(
    data: &Matrix,
    medians: &[f64],
    bounds: (f64, f64),
) -> (OffsetVector, DistanceVector) {
    let offsets: Vec<f64> = (0..data.n_cols())
        .map(|c| optimal_offset_for_column(data, medians, c, bounds))
        .collect();
    let distances: Vec<f64> = (0..data.n_cols())
        .map(|c| distance_for_column(data, medians, c, offsets[c]))
        .collect();
    (OffsetVector::new(offsets), DistanceVector::new(distances))
}

fn apply_offsets(data: &Matrix, offsets: &OffsetVector) -> Matrix {
    let mut out = data.clone();
    for c in 0..data.n_cols() {
        let offset = offsets.as_slice()[c];
        let mut col = data.col_values(c);
        for value in &mut col {
            *value += offset;
        }
        out.set_col(c, &col);
    }
    out
}
