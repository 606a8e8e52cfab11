//! The normalization pipeline.
//!
//! Stages run in a fixed order, each consuming only what earlier stages
//! produced: load, prune, decompose, dedup, key assignment, field repair,
//! date synthesis, integrity check, export. Structural failures abort the run
//! before anything is written; data-quality problems are repaired or logged.

pub mod dates;
pub mod decompose;
pub mod dedup;
pub mod export;
pub mod integrity;
pub mod keys;
pub mod loader;
pub mod manifest;
pub mod prune;
pub mod repair;
pub mod schema;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{DateConfig, NormalizerConfig};
use crate::constants::*;
use crate::error::{NormalizeError, Result};
use crate::metrics::time_stage;
use crate::table::Table;

use dates::DateReport;
use dedup::DedupStats;
use export::ExportedTable;
use manifest::{InputSummary, RunManifest};
use repair::RepairReport;
pub use schema::NormalizedSchema;

/// The in-memory result of every stage up to, and including, the integrity check.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub schema: NormalizedSchema,
    pub deduplication: Vec<DedupStats>,
    pub repairs: RepairReport,
    pub dates: DateReport,
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub input_rows: usize,
    pub output_dir: PathBuf,
    pub tables: Vec<ExportedTable>,
    pub deduplication: Vec<DedupStats>,
    pub repairs: RepairReport,
    pub dates: DateReport,
    pub duration_secs: f64,
}

/// Seed for date synthesis. Kept apart from the repair seed so that changing
/// one stage's draws never shifts the other's.
pub fn date_seed(seed: u64) -> u64 {
    seed.wrapping_add(1)
}

/// Load, normalize and export in one go. Either all eight tables and the
/// manifest are written, or nothing is.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output_dir.display()))]
pub fn run(config: &NormalizerConfig) -> Result<RunReport> {
    let started = std::time::Instant::now();
    config.validate()?;
    info!(seed = config.seed, "🚀 Starting normalization run");

    let source = {
        let _t = time_stage("load");
        loader::load_source(&config.input, config.delimiter_byte()?)?
    };
    let input_rows = source.len();

    let normalized = normalize(&source, config)?;
    let input = InputSummary {
        path: config.input.display().to_string(),
        sha256: manifest::hash_file(&config.input)?,
        rows: input_rows,
    };

    let manifest = {
        let _t = time_stage("export");
        let encoded = export::encode_tables(&normalized.schema.tables())?;
        let manifest = RunManifest::new(
            config.seed,
            input,
            encoded.iter().map(|t| t.entry.clone()).collect(),
            normalized.deduplication,
            &normalized.repairs,
            normalized.dates,
        );
        let manifest_json = manifest.to_json()?;
        let mut files: Vec<(&str, &[u8])> = encoded
            .iter()
            .map(|t| (t.entry.file.as_str(), t.bytes.as_slice()))
            .collect();
        files.push((MANIFEST_FILE, manifest_json.as_slice()));
        export::commit_files(&files, &config.output_dir)?;
        info!(
            dir = %config.output_dir.display(),
            files = files.len(),
            "💾 Exported normalized tables and manifest"
        );
        manifest
    };

    let report = RunReport {
        run_id: manifest.run_id,
        input_rows,
        output_dir: config.output_dir.clone(),
        tables: manifest.tables,
        deduplication: manifest.deduplication,
        repairs: normalized.repairs,
        dates: manifest.dates,
        duration_secs: started.elapsed().as_secs_f64(),
    };
    info!(
        run_id = %report.run_id,
        tables = report.tables.len(),
        duration_secs = report.duration_secs,
        "✅ Normalization run finished"
    );
    Ok(report)
}

/// Every in-memory stage from pruning through the integrity check.
#[instrument(skip_all, fields(rows = source.len()))]
pub fn normalize(source: &Table, config: &NormalizerConfig) -> Result<Normalized> {
    let pruned = {
        let _t = time_stage("prune");
        prune::prune_columns(source, &DERIVED_COLUMNS)?
    };

    let mut entities = {
        let _t = time_stage("decompose");
        decompose::decompose(&pruned, &decompose::default_manifest())?
    };

    let mut deduplication = Vec::new();
    {
        let _t = time_stage("dedup");
        for table in entities.iter_mut() {
            if let Some(key) = dedup::natural_key(&table.name) {
                let (collapsed, stats) = dedup::deduplicate(table, key)?;
                *table = collapsed;
                deduplication.push(stats);
            }
        }
    }

    let customer = take_table(&mut entities, TABLE_CUSTOMER)?;
    let product = take_table(&mut entities, TABLE_PRODUCT)?;
    let category = take_table(&mut entities, TABLE_CATEGORY)?;
    let orders = take_table(&mut entities, TABLE_ORDERS)?;
    let order_item = take_table(&mut entities, TABLE_ORDER_ITEM)?;

    let (customer, customer_segment, orders, shipping_mode, payment_type) = {
        let _t = time_stage("keys");
        let (customer, customer_segment) = keys::assign_keys(&customer, &keys::CUSTOMER_SEGMENT)?;
        let (orders, shipping_mode) = keys::assign_keys(&orders, &keys::SHIPPING_MODE)?;
        let (orders, payment_type) = keys::assign_keys(&orders, &keys::PAYMENT_TYPE)?;
        (customer, customer_segment, orders, shipping_mode, payment_type)
    };

    let (customer, orders, repairs) = {
        let _t = time_stage("repair");
        repair::repair_fields(&customer, &orders, &config.repair, config.seed)?
    };

    let (orders, dates) = {
        let _t = time_stage("dates");
        dates::synthesize_dates(&orders, &shipping_mode, &config.dates, date_seed(config.seed))?
    };

    let schema = NormalizedSchema {
        customer,
        customer_segment,
        product,
        category,
        orders,
        shipping_mode,
        payment_type,
        order_item,
    };

    {
        let _t = time_stage("integrity");
        integrity::check_integrity(&schema)?;
    }

    Ok(Normalized {
        schema,
        deduplication,
        repairs,
        dates,
    })
}

fn take_table(tables: &mut Vec<Table>, name: &str) -> Result<Table> {
    let pos = tables
        .iter()
        .position(|t| t.name == name)
        .ok_or_else(|| NormalizeError::Schema(format!("decomposition produced no '{name}' table")))?;
    Ok(tables.remove(pos))
}

/// What `inspect` finds in a source file without changing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub rows: usize,
    pub columns: usize,
    /// Why the header does not match the expected source layout, if it doesn't
    pub schema_problem: Option<String>,
    pub unusable_order_dates: usize,
    pub unusable_shipping_dates: usize,
    pub zip_like_states: usize,
    pub malformed_countries: usize,
}

/// Load a source file and count the anomalies a run would have to deal with.
#[instrument(skip(date_config))]
pub fn inspect(path: &Path, delimiter: u8, date_config: &DateConfig) -> Result<InspectReport> {
    let table = loader::load_table(path, delimiter)?;

    let count = |column: &str, pred: &dyn Fn(&str) -> bool| -> usize {
        table
            .column_values(column)
            .map(|values| values.filter(|v| pred(v)).count())
            .unwrap_or(0)
    };

    let report = InspectReport {
        rows: table.len(),
        columns: table.columns.len(),
        schema_problem: loader::check_source_schema(&table).err(),
        unusable_order_dates: count(COL_ORDER_DATE, &|v| {
            dates::is_placeholder_date(v, date_config)
        }),
        unusable_shipping_dates: count(COL_SHIPPING_DATE, &|v| {
            dates::is_placeholder_date(v, date_config)
        }),
        zip_like_states: count(COL_CUSTOMER_STATE, &repair::lookups::is_zip_like),
        malformed_countries: count(COL_CUSTOMER_COUNTRY, &repair::lookups::is_malformed_country)
            + count(COL_ORDER_COUNTRY, &repair::lookups::is_malformed_country),
    };
    info!(rows = report.rows, "🔎 Inspected source file");
    if let Some(problem) = &report.schema_problem {
        warn!(problem = %problem, "Source header does not match the expected layout");
    }
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// (table, rows) in export order
    pub tables: Vec<(String, usize)>,
    /// Whether checksums were compared against a manifest
    pub checksums_verified: bool,
}

/// Reload an export directory and re-run the integrity check on it.
#[instrument]
pub fn verify(output_dir: &Path) -> Result<VerifyReport> {
    let tables = EXPORT_ORDER
        .iter()
        .map(|name| loader::load_table(&output_dir.join(table_file_name(name)), export::OUTPUT_DELIMITER))
        .collect::<Result<Vec<Table>>>()?;
    let schema = NormalizedSchema::from_tables(tables)?;
    integrity::check_integrity(&schema)?;

    let checksums_verified = output_dir.join(MANIFEST_FILE).exists();
    if checksums_verified {
        let stale = RunManifest::read(output_dir)?.stale_tables(output_dir)?;
        if !stale.is_empty() {
            return Err(NormalizeError::Integrity(format!(
                "checksum mismatch for [{}]",
                stale.join(", ")
            )));
        }
    } else {
        warn!(dir = %output_dir.display(), "No manifest found, skipping checksum comparison");
    }

    let report = VerifyReport {
        tables: schema
            .tables()
            .iter()
            .map(|t| (t.name.clone(), t.len()))
            .collect(),
        checksums_verified,
    };
    info!(tables = report.tables.len(), "✅ Export directory verified");
    Ok(report)
}
