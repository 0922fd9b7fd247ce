//! CLI argument definitions for the dry pipeline driver.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dry",
    version,
    about = "Clean and normalize a proteomics plate matrix",
    long_about = "Applies log transform, histone normalization (GCP), sparse-sample\n\
                  and sparse/high-variance-probe filtering, per-sample offset\n\
                  optimization and outlier rejection (P100), and median\n\
                  normalization to a plate-matrix file, writing a processed\n\
                  matrix and a per-sample audit record."
)]
pub struct Cli {
    /// Path to the input plate-matrix file (`#1.3`-style tab-delimited text).
    #[arg(value_name = "MATRIX_FILE")]
    pub input: PathBuf,

    /// Path to the TOML configuration file ([io], [metadata], [parameters]).
    #[arg(long = "config", value_name = "PATH")]
    pub config: PathBuf,

    /// Output path for the processed matrix (default: `<input>.dry.processed.gct`).
    #[arg(long = "output-gct", value_name = "PATH")]
    pub output_gct: Option<PathBuf>,

    /// Output path for the per-sample audit table (default: `<input>.dry.processed.pw`).
    #[arg(long = "output-pw", value_name = "PATH")]
    pub output_pw: Option<PathBuf>,

    /// Force the assay type instead of deriving it from column metadata.
    #[arg(long = "force-assay", value_name = "ASSAY")]
    pub force_assay: Option<String>,

    /// Skip offset optimization; only compute distances with zero offset.
    #[arg(long = "no-optimize")]
    pub no_optimize: bool,

    /// Force global row-median centering even when subset metadata is present.
    #[arg(long = "ignore-subset-norm")]
    pub ignore_subset_norm: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
