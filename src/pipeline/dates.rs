use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::config::DateConfig;
use crate::constants::{ORDER_DATE, SHIPPING_DATE, SHIPPING_MODE_ID};
use crate::error::{NormalizeError, Result};
use crate::pipeline::keys::{key_lookup, SHIPPING_MODE};
use crate::table::Table;

/// Format every order and shipping date is written in.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Draws before giving up on the seasonal distribution for a narrow window.
const MAX_SEASONAL_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateReport {
    pub order_dates_synthesized: usize,
    pub shipping_dates_synthesized: usize,
    /// Valid pairs where shipping preceded ordering; the shipping date was regenerated
    pub shipping_dates_reordered: usize,
}

pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// A usable date: not a configured sentinel, parseable, and inside the valid range.
pub fn valid_date(value: &str, config: &DateConfig) -> Option<NaiveDateTime> {
    if config.is_placeholder(value) {
        return None;
    }
    parse_datetime(value).filter(|dt| (config.start..=config.end).contains(&dt.date()))
}

pub fn is_placeholder_date(value: &str, config: &DateConfig) -> bool {
    valid_date(value, config).is_none()
}

/// Seeded generator of seasonal dates inside the configured range.
pub struct DateSynthesizer<'a> {
    config: &'a DateConfig,
    rng: StdRng,
    months: WeightedIndex<f64>,
}

impl<'a> DateSynthesizer<'a> {
    pub fn new(config: &'a DateConfig, seed: u64) -> Result<Self> {
        let months = WeightedIndex::new(&config.month_weights)
            .map_err(|e| NormalizeError::Config(format!("invalid month_weights: {e}")))?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            months,
        })
    }

    /// A datetime on a day in `[lo, hi]`, month chosen by the seasonal weights.
    pub fn sample_between(&mut self, lo: NaiveDate, hi: NaiveDate) -> NaiveDateTime {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(self.rng.gen_range(0..1440) * 60, 0)
            .unwrap_or(NaiveTime::MIN);

        for _ in 0..MAX_SEASONAL_ATTEMPTS {
            let year = self.rng.gen_range(lo.year()..=hi.year());
            let month = self.months.sample(&mut self.rng) as u32 + 1;
            let day = self.rng.gen_range(1..=days_in_month(year, month));
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                if date >= lo && date <= hi {
                    return date.and_time(time);
                }
            }
        }

        // Window too narrow for the weights to land in it; fall back to uniform days
        let span = (hi - lo).num_days().max(0);
        let date = lo + Duration::days(self.rng.gen_range(0..=span));
        date.and_time(time)
    }

    pub fn lead_days(&mut self, mode: &str) -> i64 {
        i64::from(self.rng.gen_range(0..=self.config.max_lead_for(mode)))
    }

    /// Fill in or correct one (order, shipping) pair.
    ///
    /// Returns the pair to write plus which sides were generated.
    pub fn resolve_pair(
        &mut self,
        order: Option<NaiveDateTime>,
        shipping: Option<NaiveDateTime>,
        mode: &str,
    ) -> (NaiveDateTime, NaiveDateTime, PairChange) {
        let start = self.config.start;
        let end = self.config.end;

        match (order, shipping) {
            (Some(o), Some(s)) if o <= s => (o, s, PairChange::None),
            (Some(o), Some(_)) => {
                let s = self.ship_after(o, mode, end);
                (o, s, PairChange::ShippingReordered)
            }
            (Some(o), None) => {
                let s = self.ship_after(o, mode, end);
                (o, s, PairChange::Shipping)
            }
            (None, Some(s)) => {
                let room = (s.date() - start).num_days().max(0);
                let lead = self.lead_days(mode).min(room);
                (s - Duration::days(lead), s, PairChange::Order)
            }
            (None, None) => {
                let max_lead = i64::from(self.config.max_lead_for(mode));
                let latest = end - Duration::days(max_lead);
                let o = self.sample_between(start, latest.max(start));
                let s = self.ship_after(o, mode, end);
                (o, s, PairChange::Both)
            }
        }
    }

    fn ship_after(&mut self, order: NaiveDateTime, mode: &str, end: NaiveDate) -> NaiveDateTime {
        let room = (end - order.date()).num_days().max(0);
        let lead = self.lead_days(mode).min(room);
        order + Duration::days(lead)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairChange {
    None,
    Order,
    Shipping,
    Both,
    ShippingReordered,
}

/// Replace placeholder order/shipping dates in `orders`.
///
/// `shipping_modes` is the dimension produced by key assignment; it turns each
/// row's `shipping_mode_id` back into the mode name that bounds the lead time.
#[instrument(skip_all, fields(rows = orders.len()))]
pub fn synthesize_dates(
    orders: &Table,
    shipping_modes: &Table,
    config: &DateConfig,
    seed: u64,
) -> Result<(Table, DateReport)> {
    let order_idx = orders.require_column(ORDER_DATE)?;
    let ship_idx = orders.require_column(SHIPPING_DATE)?;
    let mode_idx = orders.require_column(SHIPPING_MODE_ID)?;
    let modes: HashMap<String, String> = key_lookup(shipping_modes, &SHIPPING_MODE)?;

    let mut synthesizer = DateSynthesizer::new(config, seed)?;
    let mut report = DateReport::default();
    let mut out = orders.clone();

    for (row_no, row) in out.rows.iter_mut().enumerate() {
        let mode = modes.get(row[mode_idx].as_str()).map(String::as_str).unwrap_or("");
        let order = valid_date(&row[order_idx], config);
        let shipping = valid_date(&row[ship_idx], config);

        let (o, s, change) = synthesizer.resolve_pair(order, shipping, mode);
        match change {
            PairChange::None => {}
            PairChange::Order => report.order_dates_synthesized += 1,
            PairChange::Shipping => report.shipping_dates_synthesized += 1,
            PairChange::Both => {
                report.order_dates_synthesized += 1;
                report.shipping_dates_synthesized += 1;
            }
            PairChange::ShippingReordered => report.shipping_dates_reordered += 1,
        }
        if change != PairChange::None {
            debug!(
                row = row_no,
                order_from = %row[order_idx],
                shipping_from = %row[ship_idx],
                order_to = %o,
                shipping_to = %s,
                "Synthesized dates"
            );
        }

        row[order_idx] = o.format(OUTPUT_FORMAT).to_string();
        row[ship_idx] = s.format(OUTPUT_FORMAT).to_string();
    }

    let generated = report.order_dates_synthesized
        + report.shipping_dates_synthesized
        + report.shipping_dates_reordered;
    ::metrics::counter!(crate::metrics::DATES_SYNTHESIZED).increment(generated as u64);
    info!(
        order_dates = report.order_dates_synthesized,
        shipping_dates = report.shipping_dates_synthesized,
        reordered = report.shipping_dates_reordered,
        "📅 Date synthesis finished"
    );
    Ok((out, report))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
