//! The per-sample audit record: one row per original input column,
//! regardless of whether that column survived filtering.

use std::io::Write;

use crate::error::DryError;

const HEADER: [&str; 5] = [
    "plate_name",
    "well_name",
    "optimization_offset",
    "remains_after_outlier_removal",
    "remains_after_poor_coverage_filtration",
];

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub plate_name: String,
    pub well_name: String,
    pub offset: Option<f64>,
    pub survived_outlier: bool,
    pub survived_coverage: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AuditTable {
    pub records: Vec<AuditRecord>,
}

impl AuditTable {
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self { records }
    }

    /// Serialize as tab-separated text with the fixed header required by
    /// every consumer of the audit output.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), DryError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        csv_writer.write_record(HEADER)?;
        for record in &self.records {
            let offset = record.offset.map(|v| v.to_string()).unwrap_or_default();
            csv_writer.write_record([
                record.plate_name.as_str(),
                record.well_name.as_str(),
                offset.as_str(),
                if record.survived_outlier { "true" } else { "false" },
                if record.survived_coverage { "true" } else { "false" },
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl From<csv::Error> for DryError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => DryError::Io(io_err),
            other => DryError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_fixed_header_and_rows() {
        let table = AuditTable::new(vec![AuditRecord {
            plate_name: "PLATE1".to_string(),
            well_name: "A01".to_string(),
            offset: Some(1.5),
            survived_outlier: true,
            survived_coverage: true,
        }]);
        let mut buf = Vec::new();
        table.write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HEADER.join("\t"));
        assert_eq!(lines.next().unwrap(), "PLATE1\tA01\t1.5\ttrue\ttrue");
    }

    #[test]
    fn missing_offset_renders_blank() {
        let table = AuditTable::new(vec![AuditRecord {
            plate_name: "PLATE1".to_string(),
            well_name: "A02".to_string(),
            offset: None,
            survived_outlier: false,
            survived_coverage: false,
        }]);
        let mut buf = Vec::new();
        table.write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "PLATE1\tA02\t\tfalse\tfalse"
        );
    }
}
