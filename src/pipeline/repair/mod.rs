//! Repairs malformed geographic fields in the customer and order tables.
//!
//! Every rule here is a data-quality fix, so nothing in this module fails on
//! bad values: a value is either repaired by a rule or passed through and
//! recorded as an [`Anomaly`].

pub mod lookups;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

use crate::config::{CityPolicy, RepairConfig};
use crate::constants::{CITY, COUNTRY, STATE, ZIPCODE};
use crate::error::Result;
use crate::metrics::{record_repair, record_unresolved};
use crate::table::Table;
use lookups::*;

/// A value no rule could repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub table: String,
    /// Zero-based row index in the table being repaired
    pub row: usize,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub countries_fixed: usize,
    pub states_fixed: usize,
    pub cities_fixed: usize,
    pub unresolved: Vec<Anomaly>,
}

/// Outcome of looking for the true state behind a ZIP code found in a state field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateResolution {
    Resolved(&'static str),
    /// Neither the city nor the zipcode column says anything about the state
    NoContext,
    Ambiguous(Vec<&'static str>),
    /// The context sources point at different states
    Conflict,
}

/// Work out the state for a row whose state field holds `misplaced_zip`.
///
/// Context comes from the row: a city field holding a state code, a known city
/// name, or a ZIP in the zipcode column. The misplaced value's own ZIP prefix
/// cross-checks that context but never resolves a row on its own.
pub fn resolve_state(misplaced_zip: &str, city: &str, zipcode: &str) -> StateResolution {
    let city_states: BTreeSet<&'static str> = match as_state_code(city) {
        Some(code) => BTreeSet::from([code]),
        None => states_for_city(city),
    };
    let zipcode_states: BTreeSet<&'static str> = state_for_zip(zipcode).into_iter().collect();

    let mut context: Option<BTreeSet<&'static str>> = None;
    for source in [city_states, zipcode_states] {
        if source.is_empty() {
            continue;
        }
        context = Some(match context {
            Some(acc) => acc.intersection(&source).copied().collect(),
            None => source,
        });
    }

    let Some(mut candidates) = context else {
        return StateResolution::NoContext;
    };
    if let Some(prefix_state) = state_for_zip(misplaced_zip) {
        candidates.retain(|s| *s == prefix_state);
    }

    match candidates.len() {
        0 => StateResolution::Conflict,
        1 => candidates
            .pop_first()
            .map(StateResolution::Resolved)
            .unwrap_or(StateResolution::Conflict),
        _ => StateResolution::Ambiguous(candidates.into_iter().collect()),
    }
}

/// Applies the repair rules with a seeded random source for city replacement.
pub struct FieldRepairer {
    policy: CityPolicy,
    rng: StdRng,
    /// Per-state shuffled candidate list and the next position to deal from
    decks: HashMap<&'static str, (Vec<&'static str>, usize)>,
    report: RepairReport,
}

impl FieldRepairer {
    pub fn new(config: &RepairConfig, seed: u64) -> Self {
        Self {
            policy: config.city_policy,
            rng: StdRng::seed_from_u64(seed),
            decks: HashMap::new(),
            report: RepairReport::default(),
        }
    }

    /// Country, then state, then city, for every customer row.
    #[instrument(skip_all, fields(table = %table.name))]
    pub fn repair_customers(&mut self, table: &Table) -> Result<Table> {
        let city_idx = table.require_column(CITY)?;
        let state_idx = table.require_column(STATE)?;
        let country_idx = table.require_column(COUNTRY)?;
        let zip_idx = table.require_column(ZIPCODE)?;

        let mut out = table.clone();
        let before = self.report.clone();

        for (row_no, row) in out.rows.iter_mut().enumerate() {
            self.fix_country(row_no, &mut row[country_idx]);

            if is_zip_like(&row[state_idx]) {
                match resolve_state(&row[state_idx], &row[city_idx], &row[zip_idx]) {
                    StateResolution::Resolved(state) => {
                        debug!(row = row_no, from = %row[state_idx], to = state, "Repaired state");
                        row[state_idx] = state.to_string();
                        self.report.states_fixed += 1;
                        record_repair("state");
                    }
                    other => {
                        let reason = match other {
                            StateResolution::NoContext => "no city or zipcode context".to_string(),
                            StateResolution::Ambiguous(states) => {
                                format!("context matches several states: {}", states.join(", "))
                            }
                            _ => "city and zipcode disagree on the state".to_string(),
                        };
                        self.unresolved(&table.name, row_no, STATE, &row[state_idx], reason);
                    }
                }
            }

            if let Some(code) = as_state_code(&row[city_idx]) {
                if !is_us_country(&row[country_idx]) {
                    self.unresolved(
                        &table.name,
                        row_no,
                        CITY,
                        &row[city_idx],
                        format!("city holds a state code outside the US ({})", row[country_idx]),
                    );
                } else if row[state_idx].trim() != code {
                    self.unresolved(
                        &table.name,
                        row_no,
                        CITY,
                        &row[city_idx],
                        format!("city holds state code but state is '{}'", row[state_idx]),
                    );
                } else if let Some(city) = self.draw_city(code) {
                    debug!(row = row_no, state = code, city, "Replaced misplaced state code in city");
                    row[city_idx] = city.to_string();
                    self.report.cities_fixed += 1;
                    record_repair("city");
                } else {
                    self.unresolved(
                        &table.name,
                        row_no,
                        CITY,
                        &row[city_idx],
                        format!("no candidate cities for {code}"),
                    );
                }
            }
        }

        self.log_summary(&table.name, &before);
        Ok(out)
    }

    /// Orders only carry the country rule.
    #[instrument(skip_all, fields(table = %table.name))]
    pub fn repair_order_countries(&mut self, table: &Table) -> Result<Table> {
        let country_idx = table.require_column(COUNTRY)?;
        let mut out = table.clone();
        let before = self.report.clone();
        for (row_no, row) in out.rows.iter_mut().enumerate() {
            self.fix_country(row_no, &mut row[country_idx]);
        }
        self.log_summary(&table.name, &before);
        Ok(out)
    }

    pub fn into_report(self) -> RepairReport {
        self.report
    }

    fn fix_country(&mut self, row_no: usize, country: &mut String) {
        if let Some(canonical) = canonical_country(country) {
            debug!(row = row_no, from = %country, to = canonical, "Repaired country");
            *country = canonical.to_string();
            self.report.countries_fixed += 1;
            record_repair("country");
        }
    }

    fn draw_city(&mut self, state: &'static str) -> Option<&'static str> {
        let candidates = city_candidates(state)?;
        match self.policy {
            CityPolicy::PerRow => candidates.choose(&mut self.rng).copied(),
            CityPolicy::Shuffled => {
                let rng = &mut self.rng;
                let (deck, next) = self.decks.entry(state).or_insert_with(|| {
                    let mut deck = candidates.to_vec();
                    deck.shuffle(rng);
                    (deck, 0)
                });
                if deck.is_empty() {
                    return None;
                }
                let city = deck.get(*next % deck.len()).copied();
                *next += 1;
                city
            }
        }
    }

    fn unresolved(&mut self, table: &str, row: usize, field: &'static str, value: &str, reason: String) {
        debug!(row, field, value, reason = %reason, "Left anomaly unrepaired");
        record_unresolved(field);
        self.report.unresolved.push(Anomaly {
            table: table.to_string(),
            row,
            field,
            value: value.to_string(),
            reason,
        });
    }

    fn log_summary(&self, table: &str, before: &RepairReport) {
        let unresolved = self.report.unresolved.len() - before.unresolved.len();
        info!(
            table,
            countries = self.report.countries_fixed - before.countries_fixed,
            states = self.report.states_fixed - before.states_fixed,
            cities = self.report.cities_fixed - before.cities_fixed,
            "🔧 Field repair finished"
        );
        if unresolved > 0 {
            warn!(table, unresolved, "⚠️ Some anomalies could not be repaired and were passed through");
        }
    }
}

/// Repair both location-bearing tables with one seeded random source.
pub fn repair_fields(
    customers: &Table,
    orders: &Table,
    config: &RepairConfig,
    seed: u64,
) -> Result<(Table, Table, RepairReport)> {
    let mut repairer = FieldRepairer::new(config, seed);
    let customers = repairer.repair_customers(customers)?;
    let orders = repairer.repair_order_countries(orders)?;
    Ok((customers, orders, repairer.into_report()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CUSTOMER_ID, TABLE_CUSTOMER};

    fn customers(rows: &[[&str; 5]]) -> Table {
        Table::with_rows(
            TABLE_CUSTOMER,
            vec![
                CUSTOMER_ID.into(),
                CITY.into(),
                STATE.into(),
                ZIPCODE.into(),
                COUNTRY.into(),
            ],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn repair(table: &Table, policy: CityPolicy, seed: u64) -> (Table, RepairReport) {
        let mut repairer = FieldRepairer::new(&RepairConfig { city_policy: policy }, seed);
        let out = repairer.repair_customers(table).unwrap();
        (out, repairer.into_report())
    }

    #[test]
    fn malformed_country_becomes_united_states() {
        let table = customers(&[["1", "Caguas", "PR", "725", "EE. UU."]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][4], "United States");
        assert_eq!(report.countries_fixed, 1);
    }

    #[test]
    fn unknown_country_passes_through() {
        let table = customers(&[["1", "Caguas", "PR", "725", "Atlantis"]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][4], "Atlantis");
        assert_eq!(report, RepairReport::default());
    }

    #[test]
    fn zip_in_state_with_california_city_becomes_ca() {
        let table = customers(&[["1", "Elk Grove", "95758", "", "EE. UU."]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][2], "CA");
        assert_eq!(out.rows[0][1], "Elk Grove");
        assert_eq!(report.states_fixed, 1);
        assert!(report.unresolved.is_empty());
    }

    #[test]
    fn misplaced_state_code_city_is_replaced_from_candidates() {
        let table = customers(&[
            ["1", "CA", "95758", "95758", "EE. UU."],
            ["2", "CA", "91732", "91732", "EE. UU."],
        ]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 7);
        let candidates = city_candidates("CA").unwrap();
        for row in &out.rows {
            assert_eq!(row[2], "CA");
            assert!(candidates.contains(&row[1].as_str()), "{}", row[1]);
        }
        assert_eq!(report.states_fixed, 2);
        assert_eq!(report.cities_fixed, 2);
    }

    #[test]
    fn state_code_city_outside_the_us_is_left() {
        let table = customers(&[["1", "CA", "CA", "", "Mexico"]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][1], "CA");
        assert_eq!(report.cities_fixed, 0);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].field, CITY);
        assert!(report.unresolved[0].reason.contains("outside the US"));
    }

    #[test]
    fn state_code_city_with_other_state_is_left() {
        let table = customers(&[["1", "CA", "NY", "", "EE. UU."]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][1], "CA");
        assert_eq!(report.unresolved.len(), 1);
        assert!(report.unresolved[0].reason.contains("state is 'NY'"));
    }

    #[test]
    fn state_code_city_without_candidates_is_left() {
        assert!(city_candidates("WA").is_none());
        let table = customers(&[["1", "WA", "WA", "", "EE. UU."]]);
        let (out, report) = repair(&table, CityPolicy::Shuffled, 1);
        assert_eq!(out.rows[0][1], "WA");
        assert_eq!(report.cities_fixed, 0);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].value, "WA");
        assert!(report.unresolved[0].reason.contains("no candidate cities for WA"));
    }

    #[test]
    fn state_without_context_is_reported_not_guessed() {
        let table = customers(&[["1", "Atlantis", "95758", "", "EE. UU."]]);
        let (out, report) = repair(&table, CityPolicy::PerRow, 1);
        assert_eq!(out.rows[0][2], "95758");
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].field, STATE);
    }

    #[test]
    fn ambiguous_and_conflicting_context() {
        assert_eq!(
            resolve_state("43004", "Columbus", ""),
            StateResolution::Resolved("OH")
        );
        assert!(matches!(
            resolve_state("00000", "Columbus", ""),
            StateResolution::Ambiguous(_)
        ));
        assert_eq!(
            resolve_state("95758", "Chicago", ""),
            StateResolution::Conflict
        );
        assert_eq!(resolve_state("95758", "", ""), StateResolution::NoContext);
    }

    #[test]
    fn same_seed_reproduces_output() {
        let rows: Vec<[&str; 5]> = (0..40).map(|_| ["1", "CA", "95758", "", "EE. UU."]).collect();
        let table = customers(&rows);
        for policy in [CityPolicy::PerRow, CityPolicy::Shuffled] {
            let (a, _) = repair(&table, policy, 99);
            let (b, _) = repair(&table, policy, 99);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn shuffled_policy_deals_every_candidate_before_repeating() {
        let candidates = city_candidates("CA").unwrap();
        let rows: Vec<[&str; 5]> = (0..candidates.len())
            .map(|_| ["1", "CA", "95758", "", "EE. UU."])
            .collect();
        let (out, _) = repair(&customers(&rows), CityPolicy::Shuffled, 3);
        let dealt: BTreeSet<&str> = out.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(dealt.len(), candidates.len());
    }

    #[test]
    fn order_countries_are_translated() {
        let orders = Table::with_rows(
            "orders",
            vec!["order_id".into(), COUNTRY.into()],
            vec![
                vec!["1".into(), "Francia".into()],
                vec!["2".into(), "Estados Unidos".into()],
            ],
        );
        let config = RepairConfig::default();
        let (_, out, report) = repair_fields(&customers(&[]), &orders, &config, 1).unwrap();
        assert_eq!(out.rows[0][1], "France");
        assert_eq!(out.rows[1][1], "United States");
        assert_eq!(report.countries_fixed, 2);
    }
}
