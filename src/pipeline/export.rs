use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::constants::table_file_name;
use crate::error::Result;
use crate::table::Table;

/// Exported tables are always comma separated, whatever the input used.
pub const OUTPUT_DELIMITER: u8 = b',';

/// One table as it landed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTable {
    pub table: String,
    pub file: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub sha256: String,
}

/// Serialize a table to CSV bytes: header row then data rows, no index column.
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
}

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// A table serialized in memory, ready to be staged.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    pub entry: ExportedTable,
    pub bytes: Vec<u8>,
}

/// Serialize every table and record its file name, shape and checksum.
pub fn encode_tables(tables: &[&Table]) -> Result<Vec<EncodedTable>> {
    tables
        .iter()
        .map(|table| {
            let bytes = encode_table(table)?;
            Ok(EncodedTable {
                entry: ExportedTable {
                    table: table.name.clone(),
                    file: table_file_name(&table.name),
                    columns: table.columns.clone(),
                    rows: table.len(),
                    sha256: sha256_hex(&bytes),
                },
                bytes,
            })
        })
        .collect()
}

fn tmp_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(format!("{file}.tmp"))
}

/// Write a batch of files into `output_dir`, all or none.
///
/// Every file goes to `<file>.tmp` first. Targets are checked before anything
/// is renamed, and only then are the temporaries moved over `<file>`. On any
/// failure the temporaries and the files already moved by this batch are
/// removed.
#[instrument(skip(files), fields(files = files.len()))]
pub fn commit_files(files: &[(&str, &[u8])], output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for (file, bytes) in files {
        if let Err(e) = fs::write(tmp_path(output_dir, file), bytes) {
            warn!(file, error = %e, "Export failed, discarding temporary files");
            discard(output_dir, files, 0);
            return Err(e.into());
        }
    }

    if let Some((file, _)) = files.iter().find(|(f, _)| output_dir.join(f).is_dir()) {
        warn!(file, "Export target is a directory, discarding temporary files");
        discard(output_dir, files, 0);
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} is a directory", output_dir.join(file).display()),
        )
        .into());
    }

    for (done, (file, _)) in files.iter().enumerate() {
        let target = output_dir.join(file);
        if let Err(e) = fs::rename(tmp_path(output_dir, file), &target) {
            warn!(file, error = %e, "Rename failed, removing this run's files");
            discard(output_dir, files, done);
            return Err(e.into());
        }
        debug!(file = %target.display(), "Renamed into place");
    }
    Ok(())
}

/// Write every table into `output_dir`, all or none.
pub fn export_tables(tables: &[&Table], output_dir: &Path) -> Result<Vec<ExportedTable>> {
    let encoded = encode_tables(tables)?;
    let files: Vec<(&str, &[u8])> = encoded
        .iter()
        .map(|t| (t.entry.file.as_str(), t.bytes.as_slice()))
        .collect();
    commit_files(&files, output_dir)?;
    info!(
        dir = %output_dir.display(),
        files = encoded.len(),
        "💾 Exported normalized tables"
    );
    Ok(encoded.into_iter().map(|t| t.entry).collect())
}

/// Remove every temporary of the batch and the first `committed` targets.
fn discard(output_dir: &Path, files: &[(&str, &[u8])], committed: usize) {
    for (i, (file, _)) in files.iter().enumerate() {
        let mut doomed = vec![tmp_path(output_dir, file)];
        if i < committed {
            doomed.push(output_dir.join(file));
        }
        for path in doomed {
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(file = %path.display(), error = %e, "Could not remove file");
                }
            }
        }
    }
}
