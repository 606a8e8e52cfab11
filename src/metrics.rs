//! Pipeline metrics.
//!
//! Counters and histograms go through the `metrics` facade. The normalizer
//! never installs a recorder itself, so these calls are no-ops unless an
//! embedding application attaches one.

use std::time::Instant;

pub const ROWS_LOADED: &str = "normalizer_rows_loaded_total";
pub const ROWS_DEDUPLICATED: &str = "normalizer_rows_deduplicated_total";
pub const REPAIRS: &str = "normalizer_repairs_total";
pub const UNRESOLVED_ANOMALIES: &str = "normalizer_unresolved_anomalies_total";
pub const DATES_SYNTHESIZED: &str = "normalizer_dates_synthesized_total";
pub const STAGE_DURATION: &str = "normalizer_stage_duration_seconds";

/// Records the duration of a pipeline stage when dropped.
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(STAGE_DURATION, "stage" => self.stage).record(duration);
    }
}

/// Start timing a stage; the duration is recorded when the guard goes out of scope.
pub fn time_stage(stage: &'static str) -> StageTimer {
    StageTimer::new(stage)
}

pub fn record_repair(field: &'static str) {
    ::metrics::counter!(REPAIRS, "field" => field).increment(1);
}

pub fn record_unresolved(field: &'static str) {
    ::metrics::counter!(UNRESOLVED_ANOMALIES, "field" => field).increment(1);
}
