use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::constants::MANIFEST_FILE;
use crate::error::{NormalizeError, Result};
use crate::pipeline::dates::DateReport;
use crate::pipeline::dedup::DedupStats;
use crate::pipeline::export::{sha256_hex, ExportedTable};
use crate::pipeline::repair::RepairReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub path: String,
    pub sha256: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairCounts {
    pub countries_fixed: usize,
    pub states_fixed: usize,
    pub cities_fixed: usize,
    pub unresolved: usize,
}

impl From<&RepairReport> for RepairCounts {
    fn from(report: &RepairReport) -> Self {
        Self {
            countries_fixed: report.countries_fixed,
            states_fixed: report.states_fixed,
            cities_fixed: report.cities_fixed,
            unresolved: report.unresolved.len(),
        }
    }
}

/// Written as `manifest.json` next to the exported tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub input: InputSummary,
    pub tables: Vec<ExportedTable>,
    pub deduplication: Vec<DedupStats>,
    pub repairs: RepairCounts,
    pub dates: DateReport,
}

impl RunManifest {
    pub fn new(
        seed: u64,
        input: InputSummary,
        tables: Vec<ExportedTable>,
        deduplication: Vec<DedupStats>,
        repairs: &RepairReport,
        dates: DateReport,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            seed,
            input,
            tables,
            deduplication,
            repairs: repairs.into(),
            dates,
        }
    }

    /// Pretty JSON, staged alongside the tables so it lands in the same batch.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn read(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path)
            .map_err(|e| NormalizeError::load(path.display().to_string(), e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Tables whose file on disk no longer matches the recorded checksum.
    pub fn stale_tables(&self, output_dir: &Path) -> Result<Vec<String>> {
        let mut stale = Vec::new();
        for entry in &self.tables {
            let bytes = fs::read(output_dir.join(&entry.file))?;
            if sha256_hex(&bytes) != entry.sha256 {
                stale.push(entry.table.clone());
            }
        }
        Ok(stale)
    }
}

/// Checksum the raw input file.
pub fn hash_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manifest(tables: Vec<ExportedTable>) -> RunManifest {
        RunManifest::new(
            7,
            InputSummary {
                path: "orders.csv".into(),
                sha256: "00".into(),
                rows: 3,
            },
            tables,
            vec![],
            &RepairReport::default(),
            DateReport::default(),
        )
    }

    #[test]
    fn write_then_read_keeps_fields() {
        let dir = tempdir().unwrap();
        let written = manifest(vec![]);
        fs::write(dir.path().join(MANIFEST_FILE), written.to_json().unwrap()).unwrap();
        let read = RunManifest::read(dir.path()).unwrap();
        assert_eq!(read.run_id, written.run_id);
        assert_eq!(read.seed, 7);
        assert_eq!(read.input.rows, 3);
    }

    #[test]
    fn detects_files_changed_after_export() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), b"id\n1\n").unwrap();
        let entry = ExportedTable {
            table: "a".into(),
            file: "a.csv".into(),
            columns: vec!["id".into()],
            rows: 1,
            sha256: sha256_hex(b"id\n1\n"),
        };
        let m = manifest(vec![entry]);
        assert!(m.stale_tables(dir.path()).unwrap().is_empty());

        fs::write(dir.path().join("a.csv"), b"id\n2\n").unwrap();
        assert_eq!(m.stale_tables(dir.path()).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn missing_manifest_is_load_error() {
        let dir = tempdir().unwrap();
        let err = RunManifest::read(dir.path()).unwrap_err();
        assert!(matches!(err, NormalizeError::Load { .. }));
    }
}
