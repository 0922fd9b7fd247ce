#![deny(unsafe_code)]

pub mod assay;
pub mod audit;
pub mod error;
pub mod ids;
pub mod matrix;
pub mod offsets;
pub mod provenance;

pub use assay::AssayType;
pub use audit::{AuditRecord, AuditTable};
pub use error::{DryError, Result};
pub use ids::{ProbeId, SampleId};
pub use matrix::{Matrix, MatrixTriple, MetadataTable};
pub use offsets::{DistanceVector, OffsetVector};
pub use provenance::{extract_uniform_provenance, ProvenanceCode};
