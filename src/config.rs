use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NormalizeError, Result};

/// Everything a pipeline run needs. Loaded from TOML, then overridden from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub delimiter: char,
    pub seed: u64,
    pub dates: DateConfig,
    pub repair: RepairConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// First valid calendar day (inclusive)
    pub start: NaiveDate,
    /// Last valid calendar day (inclusive)
    pub end: NaiveDate,
    /// Literal values treated as a missing timestamp
    pub placeholders: Vec<String>,
    /// Relative order volume for January..December
    pub month_weights: Vec<f64>,
    /// Upper bound on order-to-ship lead time, by shipping mode name
    pub max_lead_days: BTreeMap<String, u32>,
    pub default_max_lead_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub city_policy: CityPolicy,
}

/// How replacement cities are drawn for rows whose city holds a state code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityPolicy {
    /// Independent draw from the candidate list for every affected row
    #[default]
    PerRow,
    /// Candidate list shuffled once per state, then dealt round-robin
    Shuffled,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/supply_chain.csv"),
            output_dir: PathBuf::from("output"),
            delimiter: ',',
            seed: 42,
            dates: DateConfig::default(),
            repair: RepairConfig::default(),
        }
    }
}

impl Default for DateConfig {
    fn default() -> Self {
        let max_lead_days = [
            ("Same Day", 1),
            ("First Class", 2),
            ("Second Class", 4),
            ("Standard Class", 6),
        ]
        .into_iter()
        .map(|(mode, days)| (mode.to_string(), days))
        .collect();

        Self {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2018, 12, 31).unwrap_or_default(),
            placeholders: ["", "0", "0000-00-00", "00/00/0000", "00/00/0000 0:00", "1/1/1900 0:00"]
                .into_iter()
                .map(String::from)
                .collect(),
            // Gently rising toward the Q4 peak
            month_weights: vec![
                0.07, 0.07, 0.08, 0.08, 0.08, 0.08, 0.08, 0.08, 0.09, 0.09, 0.10, 0.10,
            ],
            max_lead_days,
            default_max_lead_days: 6,
        }
    }
}

impl DateConfig {
    pub fn max_lead_for(&self, mode: &str) -> u32 {
        self.max_lead_days
            .get(mode.trim())
            .copied()
            .unwrap_or(self.default_max_lead_days)
    }

    pub fn largest_lead(&self) -> u32 {
        self.max_lead_days
            .values()
            .copied()
            .chain(std::iter::once(self.default_max_lead_days))
            .max()
            .unwrap_or(self.default_max_lead_days)
    }

    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        self.placeholders.iter().any(|p| p.trim() == value)
    }
}

impl NormalizerConfig {
    /// Load a config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NormalizeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: NormalizerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(NormalizeError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;

        let dates = &self.dates;
        if dates.start > dates.end {
            return Err(NormalizeError::Config(format!(
                "date range start {} is after end {}",
                dates.start, dates.end
            )));
        }
        let span = (dates.end - dates.start).num_days();
        if span < i64::from(dates.largest_lead()) {
            return Err(NormalizeError::Config(format!(
                "date range of {} days cannot hold a lead time of {} days",
                span,
                dates.largest_lead()
            )));
        }

        if dates.month_weights.len() != 12 {
            return Err(NormalizeError::Config(format!(
                "month_weights needs 12 entries, got {}",
                dates.month_weights.len()
            )));
        }
        if dates
            .month_weights
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(NormalizeError::Config(
                "month_weights must be finite and non-negative".to_string(),
            ));
        }
        if dates.month_weights.iter().sum::<f64>() <= 0.0 {
            return Err(NormalizeError::Config(
                "month_weights must contain at least one positive weight".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NormalizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dates.max_lead_for("Same Day"), 1);
        assert_eq!(config.dates.max_lead_for("Drone"), 6);
        assert_eq!(config.dates.largest_lead(), 6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: NormalizerConfig = toml::from_str(
            r#"
            seed = 7
            delimiter = ";"

            [dates]
            start = "2016-01-01"
            end = "2016-12-31"

            [repair]
            city_policy = "shuffled"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert_eq!(config.dates.start, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(config.dates.month_weights.len(), 12);
        assert_eq!(config.repair.city_policy, CityPolicy::Shuffled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sample_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("normalizer.toml");
        let sample = NormalizerConfig::from_file(&path).unwrap();
        let defaults = NormalizerConfig::default();
        assert_eq!(sample.seed, defaults.seed);
        assert_eq!(sample.dates.start, defaults.dates.start);
        assert_eq!(sample.dates.end, defaults.dates.end);
        assert_eq!(sample.dates.max_lead_days, defaults.dates.max_lead_days);
        assert_eq!(sample.dates.placeholders, defaults.dates.placeholders);
        assert_eq!(sample.repair.city_policy, CityPolicy::PerRow);
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut config = NormalizerConfig::default();
        config.dates.start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert!(matches!(config.validate(), Err(NormalizeError::Config(_))));
    }

    #[test]
    fn range_shorter_than_lead_is_rejected() {
        let mut config = NormalizerConfig::default();
        config.dates.start = NaiveDate::from_ymd_opt(2018, 12, 28).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn weights_must_be_twelve_and_positive() {
        let mut config = NormalizerConfig::default();
        config.dates.month_weights = vec![1.0; 11];
        assert!(config.validate().is_err());

        config.dates.month_weights = vec![0.0; 12];
        assert!(config.validate().is_err());
    }

    #[test]
    fn placeholder_matching_trims() {
        let dates = DateConfig::default();
        assert!(dates.is_placeholder(" 0000-00-00 "));
        assert!(dates.is_placeholder(""));
        assert!(!dates.is_placeholder("1/31/2018 22:56"));
    }
}
