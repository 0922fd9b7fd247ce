//! Error types for the dry pipeline.
//!
//! Every stage fails fatally and carries enough context — a stage name and
//! the offending identifier — to diagnose without source access.

use thiserror::Error;

/// Error type for dry pipeline operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DryError {
    /// The provenance-code field is missing, empty, or not identical across columns.
    #[error("invalid provenance code at stage {stage}: {detail}")]
    InvalidProvenance {
        stage: &'static str,
        detail: String,
    },

    /// An assay-type value matched neither the P100 nor GCP configuration list.
    #[error("unknown assay type at stage {stage}: {detail}")]
    UnknownAssay {
        stage: &'static str,
        detail: String,
    },

    /// Row count of R or C disagrees with D's shape after a stage.
    #[error("misaligned metadata at stage {stage}: {detail}")]
    MisalignedMetadata {
        stage: &'static str,
        detail: String,
    },

    /// A matrix has zero rows or zero columns after a filter.
    #[error("empty matrix at stage {stage}: {detail}")]
    EmptyMatrix {
        stage: &'static str,
        detail: String,
    },

    /// A required configuration key is absent or non-numeric when needed.
    #[error("missing configuration at stage {stage}: {detail}")]
    ConfigMissing {
        stage: &'static str,
        detail: String,
    },

    /// The bounded minimizer failed to converge for a column.
    #[error("optimizer failure at stage {stage}: {detail}")]
    OptimizerFailure {
        stage: &'static str,
        detail: String,
    },

    /// I/O error surfaced from the ingest/egress boundary.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DryError {
    pub fn invalid_provenance(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidProvenance {
            stage,
            detail: detail.into(),
        }
    }

    pub fn unknown_assay(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::UnknownAssay {
            stage,
            detail: detail.into(),
        }
    }

    pub fn misaligned_metadata(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::MisalignedMetadata {
            stage,
            detail: detail.into(),
        }
    }

    pub fn empty_matrix(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::EmptyMatrix {
            stage,
            detail: detail.into(),
        }
    }

    pub fn config_missing(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::ConfigMissing {
            stage,
            detail: detail.into(),
        }
    }

    pub fn optimizer_failure(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::OptimizerFailure {
            stage,
            detail: detail.into(),
        }
    }
}

/// Result type alias using [`DryError`].
pub type Result<T> = std::result::Result<T, DryError>;
