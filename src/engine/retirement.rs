// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::compound;
use crate::config::RetirementConfig;
use crate::error::CoreError;
use crate::models::{Instrument, RetirementRecord};

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(36525, 0, 0, false, 2);

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioBalance {
    pub name: String,
    pub annual_rate: Decimal,
    pub projected_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetirementRow {
    pub owner: String,
    pub current_balance: Decimal,
    pub annual_rate: Decimal,
    pub retirement_age: u32,
    pub retirement_date: NaiveDate,
    pub years_to_retirement: Decimal,
    pub projected_balance: Decimal,
    pub scenarios: Vec<ScenarioBalance>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetirementReport {
    pub rows: Vec<RetirementRow>,
    pub caveats: Vec<String>,
}

/// Fractional years between `today` and `until`, zero once the date has passed.
pub fn years_until(today: NaiveDate, until: NaiveDate) -> Decimal {
    let days = (until - today).num_days();
    if days <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days) / DAYS_PER_YEAR
}

/// Projects every AFORE balance to its owner's retirement date. Infonavit
/// balances are a one-time transfer into the funding target and are skipped.
pub fn project_retirement(
    records: &[RetirementRecord],
    cfg: &RetirementConfig,
    today: NaiveDate,
) -> RetirementReport {
    let mut report = RetirementReport::default();

    for rec in records.iter().filter(|r| r.instrument == Instrument::Afore) {
        let Some(birth) = cfg.birth_dates.get(&rec.owner) else {
            let err = CoreError::NotConfigured {
                what: format!("birth date for {}", rec.owner),
            };
            report.caveats.push(err.to_string());
            continue;
        };
        let age = rec.retirement_age.unwrap_or(cfg.default_retirement_age);
        let Some(retirement_date) = birth.checked_add_months(Months::new(age * 12)) else {
            report
                .caveats
                .push(format!("retirement date for {} is out of range", rec.owner));
            continue;
        };
        let years = years_until(today, retirement_date);
        let rate = rec.annual_return_rate.unwrap_or(cfg.default_annual_rate);
        debug!(owner = %rec.owner, years = %years, rate = %rate, "projecting retirement");

        report.rows.push(RetirementRow {
            owner: rec.owner.clone(),
            current_balance: rec.current_balance,
            annual_rate: rate,
            retirement_age: age,
            retirement_date,
            years_to_retirement: years,
            projected_balance: compound(rec.current_balance, rate, years),
            scenarios: cfg
                .scenarios
                .iter()
                .map(|s| ScenarioBalance {
                    name: s.name.clone(),
                    annual_rate: s.annual_rate,
                    projected_balance: compound(rec.current_balance, s.annual_rate, years),
                })
                .collect(),
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn afore(owner: &str, balance: i64) -> RetirementRecord {
        RetirementRecord {
            id: 1,
            instrument: Instrument::Afore,
            owner: owner.into(),
            current_balance: Decimal::from(balance),
            annual_return_rate: None,
            retirement_age: None,
            usable_for_target: false,
            last_updated: d(2025, 9, 1),
        }
    }

    fn cfg() -> RetirementConfig {
        let mut cfg = RetirementConfig::default();
        cfg.birth_dates.insert("ana".into(), d(1990, 3, 15));
        cfg
    }

    #[test]
    fn fractional_years_use_day_count() {
        let y = years_until(d(2025, 1, 1), d(2025, 7, 2));
        assert!(y > Decimal::new(49, 2) && y < Decimal::new(50, 2), "got {}", y);
        assert_eq!(years_until(d(2025, 1, 1), d(2024, 1, 1)), Decimal::ZERO);
    }

    #[test]
    fn defaults_apply_when_record_is_blank() {
        let report = project_retirement(&[afore("ana", 500_000)], &cfg(), d(2025, 10, 19));
        let row = &report.rows[0];
        assert_eq!(row.retirement_age, 65);
        assert_eq!(row.retirement_date, d(2055, 3, 15));
        assert_eq!(row.annual_rate, Decimal::new(85, 3));
        assert!(row.projected_balance > row.current_balance);
    }

    #[test]
    fn scenarios_are_strictly_ordered_by_rate() {
        let report = project_retirement(&[afore("ana", 250_000)], &cfg(), d(2025, 10, 19));
        let s = &report.rows[0].scenarios;
        assert_eq!(s.len(), 3);
        assert!(s[0].projected_balance < s[1].projected_balance);
        assert!(s[1].projected_balance < s[2].projected_balance);
    }

    #[test]
    fn infonavit_and_unknown_owners_are_left_out() {
        let mut infonavit = afore("ana", 300_000);
        infonavit.instrument = Instrument::Infonavit;
        let report = project_retirement(
            &[infonavit, afore("luis", 100_000)],
            &cfg(),
            d(2025, 10, 19),
        );
        assert!(report.rows.is_empty());
        assert_eq!(report.caveats.len(), 1);
        assert!(report.caveats[0].contains("luis"));
    }
}
