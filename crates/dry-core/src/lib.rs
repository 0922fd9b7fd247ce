#![deny(unsafe_code)]

//! THE CORE: the staged transformation pipeline, the per-sample offset
//! optimizer, the row/column filtering algorithms, and subset-aware median
//! normalization. Decoupled from any concrete file format or configuration
//! syntax — see [`assay_config::ParameterLookup`] and [`driver::DriverFields`].

pub mod assay_config;
pub mod driver;
pub mod stages;
mod stats;

pub use driver::{run, DriverFields, DriverOptions, DriverOutput, DriverTags};
