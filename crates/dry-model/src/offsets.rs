//! Transient per-sample vectors produced by `OffsetOptimizer` and consumed
//! by `OutlierFilter` and the audit writer.

/// Per-sample additive offsets, in the same column order as the
/// `MatrixTriple` that produced them.
#[derive(Debug, Clone, Default)]
pub struct OffsetVector(Vec<f64>);

impl OffsetVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn select(&self, keep: &[usize]) -> Self {
        Self(keep.iter().map(|&i| self.0[i]).collect())
    }
}

/// Per-sample distances to the row-medians, parallel to [`OffsetVector`].
#[derive(Debug, Clone, Default)]
pub struct DistanceVector(Vec<f64>);

impl DistanceVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn select(&self, keep: &[usize]) -> Self {
        Self(keep.iter().map(|&i| self.0[i]).collect())
    }

    pub fn mean(&self) -> f64 {
        if self.0.is_empty() {
            return f64::NAN;
        }
        self.0.iter().sum::<f64>() / self.0.len() as f64
    }

    /// Sample standard deviation with `ddof = 1`.
    pub fn sample_sd(&self) -> f64 {
        let n = self.0.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.0.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }
}
