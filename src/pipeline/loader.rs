use csv::{ByteRecord, ReaderBuilder};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::constants::SOURCE_COLUMNS;
use crate::error::{NormalizeError, Result};
use crate::table::Table;

const BOM: char = '\u{feff}';

/// Load the flat order export and check it carries exactly the expected columns.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_source(path: &Path, delimiter: u8) -> Result<Table> {
    let table = read_delimited(path, delimiter, "source")?;
    check_source_schema(&table).map_err(|message| NormalizeError::load(path_str(path), message))?;
    info!(rows = table.len(), columns = table.columns.len(), "📥 Loaded source table");
    ::metrics::counter!(crate::metrics::ROWS_LOADED).increment(table.len() as u64);
    Ok(table)
}

/// Load any delimited table with a header row. The table is named after the file stem.
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    read_delimited(path, delimiter, &name)
}

/// Compare a header against the source contract, naming what is missing or unexpected.
pub fn check_source_schema(table: &Table) -> std::result::Result<(), String> {
    let present: HashSet<&str> = table.columns.iter().map(String::as_str).collect();
    let expected: HashSet<&str> = SOURCE_COLUMNS.iter().copied().collect();

    let missing: Vec<&str> = SOURCE_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    let unexpected: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !expected.contains(c))
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing columns [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected columns [{}]", unexpected.join(", ")));
    }
    Err(format!(
        "expected {} source columns, found {}: {}",
        SOURCE_COLUMNS.len(),
        table.columns.len(),
        parts.join("; ")
    ))
}

fn read_delimited(path: &Path, delimiter: u8, name: &str) -> Result<Table> {
    let file = File::open(path)
        .map_err(|e| NormalizeError::load(path_str(path), format!("cannot open file: {e}")))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<String> = reader
        .byte_headers()
        .map_err(|e| NormalizeError::load(path_str(path), format!("cannot read header: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let cell = decode(field);
            if i == 0 {
                cell.trim_start_matches(BOM).to_string()
            } else {
                cell
            }
        })
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(NormalizeError::load(path_str(path), "file has no header row"));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(NormalizeError::load(
            path_str(path),
            format!("duplicate column '{dup}' in header"),
        ));
    }

    let mut table = Table::new(name, columns);
    let mut record = ByteRecord::new();
    loop {
        let more = reader
            .read_byte_record(&mut record)
            .map_err(|e| NormalizeError::load(path_str(path), format!("unreadable record: {e}")))?;
        if !more {
            break;
        }
        if record.len() != table.columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(NormalizeError::load(
                path_str(path),
                format!(
                    "line {} has {} fields, header has {}",
                    line,
                    record.len(),
                    table.columns.len()
                ),
            ));
        }
        table.rows.push(record.iter().map(decode).collect());
    }

    debug!(table = %table.name, rows = table.len(), "Read delimited file");
    Ok(table)
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_file_is_load_error() {
        let err = load_table(Path::new("/definitely/not/here.csv"), b',').unwrap_err();
        assert!(matches!(err, NormalizeError::Load { .. }));
    }

    #[test]
    fn strips_bom_and_reads_rows() {
        let file = write_file("\u{feff}id,name\n1,a\n2,b\n");
        let table = load_table(file.path(), b',').unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn ragged_row_names_the_line() {
        let file = write_file("id,name\n1,a\n2\n");
        let err = load_table(file.path(), b',').unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"id,city\n1,Caguas\n2,San Germ\xe1n\n").unwrap();
        file.flush().unwrap();
        let table = load_table(file.path(), b',').unwrap();
        assert!(table.rows[1][1].starts_with("San Germ"));
    }

    #[test]
    fn source_schema_reports_missing_and_unexpected() {
        let file = write_file("Type,Bogus\nDEBIT,x\n");
        let err = load_source(file.path(), b',').unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing columns"));
        assert!(message.contains("unexpected columns [Bogus]"));
    }

    #[test]
    fn semicolon_delimiter() {
        let file = write_file("a;b\n1;2\n");
        let table = load_table(file.path(), b';').unwrap();
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }
}
