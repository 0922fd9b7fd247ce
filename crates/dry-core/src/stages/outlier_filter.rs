//! OutlierFilter (P100 only) — drops samples whose post-offset distance
//! exceeds `mean(d) + k * sample_sd(d)`.

use dry_model::{AssayType, DistanceVector, MatrixTriple, OffsetVector, ProvenanceCode, SampleId};

pub struct OutlierFilterOutcome {
    pub triple: MatrixTriple,
    pub provenance: ProvenanceCode,
    pub offsets: Option<OffsetVector>,
    /// Column ids surviving the filter, in their (possibly GCP no-op)
    /// post-filter order — `None` only for a GCP no-op.
    pub remaining: Option<Vec<SampleId>>,
}

/// No-op for GCP, returning the inputs unchanged and `remaining = None`
/// (GCP runs leave the matrix untouched and report no distances).
pub fn filter_samples_by_distance_if_needed(
    triple: MatrixTriple,
    assay: AssayType,
    offsets: Option<OffsetVector>,
    distances: &DistanceVector,
    dist_sd_cutoff: f64,
    provenance: &ProvenanceCode,
    tag: &str,
) -> OutlierFilterOutcome {
    if assay != AssayType::P100 {
        tracing::debug!(?assay, "outlier filtering applies only to p100, skipping OSF");
        return OutlierFilterOutcome {
            triple,
            provenance: provenance.clone(),
            offsets,
            remaining: None,
        };
    }

    let mean = distances.mean();
    let sd = distances.sample_sd();
    let threshold = mean + dist_sd_cutoff * sd;

    let n_cols = triple.data.n_cols();
    let keep: Vec<usize> = (0..n_cols)
        .filter(|&c| distances.as_slice()[c] <= threshold)
        .collect();

    let out_triple = triple.select_cols(&keep);
    let out_offsets = offsets.map(|o| o.select(&keep));
    let remaining: Vec<SampleId> = out_triple.cols.ids().to_vec();
    let tag_with_k = format!("{tag}{}", dist_sd_cutoff as i64);

    OutlierFilterOutcome {
        triple: out_triple,
        provenance: provenance.with_appended(tag_with_k),
        offsets: out_offsets,
        remaining: Some(remaining),
    }
}
