#![deny(unsafe_code)]

mod cli;
mod logging;

use std::path::{Path, PathBuf};

use clap::Parser;

use cli::{Cli, LogFormatArg, LogLevelArg};
use dry_core::assay_config::ThresholdOverrides;
use dry_core::driver::{DriverFields, DriverOptions, DriverTags};
use dry_ingest::config::{load_settings, parse_offset_bounds};
use dry_ingest::gct::{parse_matrix, write_matrix};
use logging::{LogConfig, LogFormat};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = match cli.color.color {
        clap::ColorChoice::Always => true,
        clap::ColorChoice::Never => false,
        clap::ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
    };
    let mut log_config = LogConfig::from_level_filter(cli.verbosity.tracing_level_filter())
        .with_format(log_format)
        .with_ansi(with_ansi)
        .with_log_file(cli.log_file.clone());
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level_filter(match level {
            LogLevelArg::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevelArg::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevelArg::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevelArg::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevelArg::Trace => tracing::level_filters::LevelFilter::TRACE,
        });
    }
    logging::init_logging(&log_config)?;

    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli.config)?;

    let input_text = std::fs::read_to_string(&cli.input)?;
    let triple = parse_matrix(&input_text, &settings.io.nan_values)?;

    let prov_code_delimiter = settings.metadata.prov_code_delimiter_char()?;
    let offset_bounds = parse_offset_bounds(settings.parameters.require_str("offset_bounds", "cli::offset_bounds")?)?;
    let ignore_subset_norm = cli.ignore_subset_norm || settings.parameters.get_bool("ignore_subset_norm").unwrap_or(false);

    let tag = |key: &str, default: &'static str| -> String {
        settings.parameters.get_str(key).map(str::to_string).unwrap_or_else(|| default.to_string())
    };
    let log_tag = tag("log_tag", "L2X");
    let histone_tag = tag("histone_tag", "H3N");
    let sample_filter_tag = tag("sample_filter_tag", "SF");
    let manual_reject_tag = tag("manual_reject_tag", "MPR");
    let probe_filter_tag = tag("probe_filter_tag", "PF");
    let offset_tag = tag("offset_tag", "LLB");
    let outlier_tag = tag("outlier_tag", "OSF");
    let global_median_tag = tag("global_median_tag", "GMN");
    let row_median_tag = tag("row_median_tag", "RMN");

    let options = DriverOptions {
        fields: DriverFields {
            prov_code_field: &settings.metadata.prov_code_field,
            prov_code_delimiter,
            assay_type_field: &settings.metadata.assay_type_field,
            p100_assays: &settings.metadata.p100_assays,
            gcp_assays: &settings.metadata.gcp_assays,
            force_assay: cli.force_assay.as_deref(),
            gcp_normalization_peptide_id: settings.metadata.gcp_normalization_peptide_id.as_deref(),
            manual_rejection_field: &settings.metadata.manual_rejection_field,
            row_subset_field: settings.metadata.row_subset_field.as_deref(),
            col_subset_field: settings.metadata.col_subset_field.as_deref(),
            det_plate_field: &settings.metadata.det_plate_field,
            det_well_field: &settings.metadata.det_well_field,
            optimization_offset_field: "optimization_offset",
        },
        tags: DriverTags {
            log_tag: &log_tag,
            histone_tag: &histone_tag,
            sample_filter_tag: &sample_filter_tag,
            manual_reject_tag: &manual_reject_tag,
            probe_filter_tag: &probe_filter_tag,
            offset_tag: &offset_tag,
            outlier_tag: &outlier_tag,
            global_median_tag: &global_median_tag,
            subset_median_tag: &row_median_tag,
        },
        threshold_overrides: ThresholdOverrides::default(),
        offset_bounds,
        no_optimize: cli.no_optimize,
        ignore_subset_norm,
    };

    let output = dry_core::run(triple, &options, &settings.parameters)?;
    tracing::info!(
        rows = output.triple.rows.len(),
        cols = output.triple.data.n_cols(),
        provenance = output.provenance.join(prov_code_delimiter),
        "pipeline finished"
    );

    let (output_gct, output_pw) = configure_out_names(&cli.input, cli.output_gct.clone(), cli.output_pw.clone());

    let mut row_meta_fields = output.triple.rows.field_names();
    row_meta_fields.sort();
    let mut col_meta_fields = output.triple.cols.field_names();
    col_meta_fields.sort();

    let gct_file = std::fs::File::create(&output_gct)?;
    write_matrix(gct_file, &output.triple, &row_meta_fields, &col_meta_fields)?;
    tracing::info!(path = %output_gct.display(), "wrote processed matrix");

    let pw_file = std::fs::File::create(&output_pw)?;
    output.audit.write_tsv(pw_file)?;
    tracing::info!(path = %output_pw.display(), "wrote audit table");

    Ok(())
}

/// Derives default output paths from the input file's basename when the
/// caller did not override them.
fn configure_out_names(input: &Path, output_gct: Option<PathBuf>, output_pw: Option<PathBuf>) -> (PathBuf, PathBuf) {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let gct = output_gct.unwrap_or_else(|| parent.join(format!("{stem}.dry.processed.gct")));
    let pw = output_pw.unwrap_or_else(|| parent.join(format!("{stem}.dry.processed.pw")));
    (gct, pw)
}
