//! Reads and writes the tab-delimited plate-matrix file format: a short
//! header declaring matrix shape, column-metadata rows stacked above the
//! data block, row-metadata columns to the left of the data block — the
//! same overall structure as a GCT file, parsed by hand rather than forced
//! through a general-purpose CSV reader (the header is not rectangular CSV).

use std::collections::BTreeMap;
use std::io::Write;

use dry_model::matrix::{Matrix, MetadataTable};
use dry_model::{DryError, MatrixTriple, ProbeId, SampleId};

const VERSION_LINE: &str = "#1.3";

pub fn parse_matrix(text: &str, nan_values: &[String]) -> Result<MatrixTriple, DryError> {
    let mut lines = text.lines();

    let version = lines
        .next()
        .ok_or_else(|| DryError::misaligned_metadata("gct::parse", "empty input"))?;
    if !version.starts_with('#') {
        return Err(DryError::misaligned_metadata(
            "gct::parse",
            format!("expected a version line starting with '#', got {version:?}"),
        ));
    }

    let dims_line = lines
        .next()
        .ok_or_else(|| DryError::misaligned_metadata("gct::parse", "missing dimension line"))?;
    let dims: Vec<usize> = dims_line
        .split('\t')
        .map(|s| {
            s.trim().parse().map_err(|_| {
                DryError::misaligned_metadata("gct::parse", format!("bad dimension {s:?}"))
            })
        })
        .collect::<Result<_, _>>()?;
    let [n_rows, n_cols, n_row_meta, n_col_meta] = dims[..] else {
        return Err(DryError::misaligned_metadata(
            "gct::parse",
            "dimension line must have 4 fields",
        ));
    };

    let header_line = lines
        .next()
        .ok_or_else(|| DryError::misaligned_metadata("gct::parse", "missing header line"))?;
    let header: Vec<&str> = header_line.split('\t').collect();
    if header.len() != 1 + n_row_meta + n_cols {
        return Err(DryError::misaligned_metadata(
            "gct::parse",
            "header line field count does not match declared dimensions",
        ));
    }
    let row_meta_fields: Vec<&str> = header[1..1 + n_row_meta].to_vec();
    let sample_ids: Vec<SampleId> = header[1 + n_row_meta..]
        .iter()
        .map(|s| SampleId::new(*s))
        .collect::<Result<_, _>>()?;

    let mut cols = MetadataTable::new();
    for id in &sample_ids {
        cols.push(id.clone(), BTreeMap::new());
    }

    for _ in 0..n_col_meta {
        let line = lines
            .next()
            .ok_or_else(|| DryError::misaligned_metadata("gct::parse", "missing column metadata row"))?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 1 + n_row_meta + n_cols {
            return Err(DryError::misaligned_metadata(
                "gct::parse",
                "column metadata row field count mismatch",
            ));
        }
        let field_name = fields[0];
        let values = &fields[1 + n_row_meta..];
        for (id, value) in sample_ids.iter().zip(values) {
            cols.set(id, field_name, (*value).to_string());
        }
    }

    let mut rows = MetadataTable::new();
    let mut data_rows: Vec<Vec<f64>> = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let line = lines
            .next()
            .ok_or_else(|| DryError::misaligned_metadata("gct::parse", "missing data row"))?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 1 + n_row_meta + n_cols {
            return Err(DryError::misaligned_metadata(
                "gct::parse",
                "data row field count mismatch",
            ));
        }
        let row_id = ProbeId::new(fields[0])?;
        let mut row_fields = BTreeMap::new();
        for (name, value) in row_meta_fields.iter().zip(&fields[1..1 + n_row_meta]) {
            row_fields.insert((*name).to_string(), (*value).to_string());
        }
        rows.push(row_id, row_fields);

        let values: Vec<f64> = fields[1 + n_row_meta..]
            .iter()
            .map(|raw| parse_value(raw, nan_values))
            .collect();
        data_rows.push(values);
    }

    let data = Matrix::from_rows(data_rows);
    let triple = MatrixTriple::new(data, rows, cols);
    triple.check_alignment("gct::parse")?;
    Ok(triple)
}

fn parse_value(raw: &str, nan_values: &[String]) -> f64 {
    if nan_values.iter().any(|n| n == raw) {
        f64::NAN
    } else {
        raw.parse().unwrap_or(f64::NAN)
    }
}

/// Writes the mirror image of [`parse_matrix`]. Field order for row- and
/// column-metadata is not recoverable from `MetadataTable` itself (it is a
/// keyed store, not a positional one), so callers pass the field lists they
/// want written, in the order they want them written.
pub fn write_matrix<W: Write>(
    mut writer: W,
    triple: &MatrixTriple,
    row_meta_fields: &[String],
    col_meta_fields: &[String],
) -> Result<(), DryError> {
    let n_rows = triple.data.n_rows();
    let n_cols = triple.data.n_cols();

    writeln!(writer, "{VERSION_LINE}")?;
    writeln!(
        writer,
        "{n_rows}\t{n_cols}\t{}\t{}",
        row_meta_fields.len(),
        col_meta_fields.len()
    )?;

    let sample_ids: Vec<&str> = triple.cols.ids().iter().map(SampleId::as_str).collect();
    write!(writer, "id")?;
    for field in row_meta_fields {
        write!(writer, "\t{field}")?;
    }
    for id in &sample_ids {
        write!(writer, "\t{id}")?;
    }
    writeln!(writer)?;

    for field in col_meta_fields {
        write!(writer, "{field}")?;
        for _ in row_meta_fields {
            write!(writer, "\t")?;
        }
        for id in triple.cols.ids() {
            let value = triple.cols.get(id, field).unwrap_or("");
            write!(writer, "\t{value}")?;
        }
        writeln!(writer)?;
    }

    for r in 0..n_rows {
        let row_id = triple.rows.id_at(r);
        write!(writer, "{row_id}")?;
        for field in row_meta_fields {
            let value = triple.rows.get(row_id, field).unwrap_or("");
            write!(writer, "\t{value}")?;
        }
        for c in 0..n_cols {
            write!(writer, "\t{}", format_value(triple.data.get(r, c)))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        v.to_string()
    }
}
