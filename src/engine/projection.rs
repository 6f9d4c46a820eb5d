// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-by-month funding projection toward the active target.
//!
//! Four balances evolve independently: cumulative cash paid, the invested
//! fixed-income balance, projected crypto and the property's market value.
//! The series starts at the current month (index 0, starting balances only)
//! and stops at the month before delivery. Contributions never land in the
//! current month; they are assumed to be in the starting balances already.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::monthly_rate;
use crate::config::{ProjectionConfig, RateScenario};
use crate::error::CoreError;
use crate::models::{Debt, FundingTarget, Instrument, RetirementRecord};
use crate::utils::{add_months, month_start, months_between, same_month};

pub const BASE_SCENARIO: &str = "base";

/// Live scalar inputs fetched by the caller. `None` means the source was
/// unavailable; the projection then starts that series at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveBalances {
    pub fixed_income: Option<Decimal>,
    pub crypto: Option<Decimal>,
}

impl LiveBalances {
    pub fn from_results(
        fixed_income: Result<Decimal, CoreError>,
        crypto: Result<Decimal, CoreError>,
    ) -> Self {
        let keep = |label: &str, r: Result<Decimal, CoreError>| match r {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(source = label, error = %e, "live balance unavailable, using zero");
                None
            }
        };
        Self {
            fixed_income: keep("fixed-income", fixed_income),
            crypto: keep("crypto", crypto),
        }
    }
}

pub struct ProjectionInput<'a> {
    pub target: &'a FundingTarget,
    pub debts: &'a [Debt],
    pub balances: LiveBalances,
    pub fixed_transfer: Decimal,
    pub today: NaiveDate,
}

/// Fixed transfer applied at delivery: the target's explicit amount, else the
/// Infonavit balances flagged as usable for the target.
pub fn fixed_transfer_for(target: &FundingTarget, records: &[RetirementRecord]) -> Decimal {
    target.fixed_transfer_amount.unwrap_or_else(|| {
        records
            .iter()
            .filter(|r| r.instrument == Instrument::Infonavit && r.usable_for_target)
            .map(|r| r.current_balance)
            .sum()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionState {
    pub paid: Decimal,
    pub investment: Decimal,
    pub crypto: Decimal,
    pub property: Decimal,
}

#[derive(Debug, Clone, Copy)]
struct MonthlyRates {
    investment: Decimal,
    crypto: Decimal,
    property: Decimal,
}

/// Dated cash events, resolved once per projection and shared by every scenario.
#[derive(Debug, Clone)]
struct Schedule {
    start: NaiveDate,
    months: u32,
    monthly_payment: Option<(Decimal, Option<NaiveDate>)>,
    lump_sum: Option<(Decimal, NaiveDate)>,
    sale_injection: Option<(Decimal, NaiveDate)>,
}

impl ProjectionState {
    fn advance(self, month: NaiveDate, schedule: &Schedule, rates: MonthlyRates) -> Self {
        let mut paid = self.paid;
        if let Some((amount, end)) = schedule.monthly_payment {
            if end.is_none_or(|e| month <= e) {
                paid += amount;
            }
        }
        if let Some((amount, date)) = schedule.lump_sum {
            if same_month(date, month) {
                paid += amount;
            }
        }

        let mut investment = self.investment * (Decimal::ONE + rates.investment);
        if let Some((net, date)) = schedule.sale_injection {
            if same_month(date, month) {
                investment += net;
            }
        }

        Self {
            paid,
            investment,
            crypto: self.crypto * (Decimal::ONE + rates.crypto),
            property: self.property * (Decimal::ONE + rates.property),
        }
    }
}

fn simulate(
    initial: ProjectionState,
    schedule: &Schedule,
    rates: MonthlyRates,
) -> Vec<(NaiveDate, ProjectionState)> {
    let mut out = Vec::with_capacity(schedule.months as usize);
    out.push((schedule.start, initial));
    (1..schedule.months).fold(initial, |prev, i| {
        let month = add_months(schedule.start, i);
        let next = prev.advance(month, schedule, rates);
        out.push((month, next));
        next
    });
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthPoint {
    pub month: NaiveDate,
    pub paid: Decimal,
    pub investment: Decimal,
    pub crypto: Decimal,
    pub property: Decimal,
    pub fixed_transfer: Decimal,
    pub total: Decimal,
    pub gap: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioTotal {
    pub name: String,
    pub annual_rate: Decimal,
    pub total: Decimal,
    pub gap: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Done,
    Pending,
    Target,
}

#[derive(Debug, Clone, Serialize)]
pub struct Milestone {
    pub date: NaiveDate,
    pub label: String,
    pub amount: Option<Decimal>,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub target_name: String,
    pub target_amount: Decimal,
    pub delivery_date: NaiveDate,
    pub series: Vec<MonthPoint>,
    pub scenarios: Vec<ScenarioTotal>,
    pub milestones: Vec<Milestone>,
    /// Terminal property value minus the target amount. Not part of the gap.
    pub equity: Decimal,
    pub caveats: Vec<String>,
}

impl ProjectionReport {
    pub fn terminal(&self) -> Option<&MonthPoint> {
        self.series.last()
    }
}

pub fn project(input: &ProjectionInput<'_>, cfg: &ProjectionConfig) -> ProjectionReport {
    let target = input.target;
    let mut caveats = Vec::new();

    let fixed_income = input.balances.fixed_income.unwrap_or_else(|| {
        caveats.push("fixed-income balance unavailable; investment series starts at zero".to_string());
        Decimal::ZERO
    });
    let crypto = input.balances.crypto.unwrap_or_else(|| {
        caveats.push("crypto valuation unavailable; crypto series starts at zero".to_string());
        Decimal::ZERO
    });

    let by_id: HashMap<i64, &Debt> = input.debts.iter().map(|d| (d.id, d)).collect();
    let mut payoff: Vec<&Debt> = Vec::new();
    for id in &target.debt_payoff_ids {
        match by_id.get(id) {
            Some(d) => payoff.push(d),
            None => caveats.push(format!("debt {} not found; excluded from payoff total", id)),
        }
    }
    let payoff_total: Decimal = payoff.iter().map(|d| d.balance).sum();

    let start = month_start(input.today);
    let months = months_between(input.today, target.delivery_date).max(1) as u32;
    let sale_injection = match (target.sale_proceeds_amount, target.sale_proceeds_date) {
        (Some(amount), Some(date)) => Some(((amount - payoff_total).max(Decimal::ZERO), date)),
        _ => None,
    };
    let schedule = Schedule {
        start,
        months,
        monthly_payment: target
            .monthly_payment
            .map(|amount| (amount, target.monthly_payment_end)),
        lump_sum: target.lump_sum_amount.zip(target.lump_sum_date),
        sale_injection,
    };

    let initial = ProjectionState {
        paid: target.amount_paid,
        investment: fixed_income,
        crypto,
        property: target.property_current_value,
    };
    let rates_at = |annual: Decimal| MonthlyRates {
        investment: monthly_rate(annual),
        crypto: monthly_rate(cfg.crypto_annual_growth),
        property: monthly_rate(target.property_appreciation_rate),
    };

    let base = simulate(initial, &schedule, rates_at(target.investment_annual_return));
    let fixed = input.fixed_transfer;
    let point = |month: NaiveDate, s: &ProjectionState| {
        let total = s.paid + s.investment + s.crypto + fixed;
        MonthPoint {
            month,
            paid: s.paid,
            investment: s.investment,
            crypto: s.crypto,
            property: s.property,
            fixed_transfer: fixed,
            total,
            gap: target.target_amount - total,
        }
    };
    let series: Vec<MonthPoint> = base.iter().map(|(m, s)| point(*m, s)).collect();

    let mut runs = vec![RateScenario::new(BASE_SCENARIO, target.investment_annual_return)];
    runs.extend(cfg.investment_scenarios.iter().cloned());
    runs.sort_by(|a, b| a.annual_rate.cmp(&b.annual_rate));
    let scenarios = runs
        .into_iter()
        .map(|sc| {
            let run = simulate(initial, &schedule, rates_at(sc.annual_rate));
            let last = run.last().map(|(m, s)| point(*m, s));
            let total = last.as_ref().map(|p| p.total).unwrap_or(Decimal::ZERO);
            debug!(scenario = %sc.name, rate = %sc.annual_rate, total = %total, "scenario projected");
            ScenarioTotal {
                name: sc.name,
                annual_rate: sc.annual_rate,
                total,
                gap: target.target_amount - total,
            }
        })
        .collect();

    let milestones = milestones(input, &schedule, &payoff, &base, cfg.commission_threshold);
    let equity = series
        .last()
        .map(|p| p.property)
        .unwrap_or(target.property_current_value)
        - target.target_amount;

    ProjectionReport {
        target_name: target.name.clone(),
        target_amount: target.target_amount,
        delivery_date: target.delivery_date,
        series,
        scenarios,
        milestones,
        equity,
        caveats,
    }
}

fn milestones(
    input: &ProjectionInput<'_>,
    schedule: &Schedule,
    payoff: &[&Debt],
    base: &[(NaiveDate, ProjectionState)],
    commission_threshold: Option<Decimal>,
) -> Vec<Milestone> {
    let target = input.target;
    let today = input.today;
    let status = |date: NaiveDate| {
        if date <= today {
            MilestoneStatus::Done
        } else {
            MilestoneStatus::Pending
        }
    };
    let mut out = Vec::new();

    if let Some(sale_date) = target.sale_proceeds_date {
        for d in payoff {
            out.push(Milestone {
                date: sale_date,
                label: format!("Pay off {}", d.name),
                amount: Some(d.balance),
                status: status(sale_date),
            });
        }
    }
    if let Some((amount, date)) = schedule.lump_sum {
        out.push(Milestone {
            date,
            label: "Lump sum".to_string(),
            amount: Some(amount),
            status: status(date),
        });
    }
    if let Some((net, date)) = schedule.sale_injection {
        out.push(Milestone {
            date,
            label: "Sale proceeds land".to_string(),
            amount: Some(net),
            status: status(date),
        });
    }
    if let Some((amount, end)) = schedule.monthly_payment {
        let last = end
            .or_else(|| base.last().map(|(m, _)| *m))
            .unwrap_or(target.delivery_date)
            .min(target.delivery_date);
        out.push(Milestone {
            date: last,
            label: "Last monthly payment".to_string(),
            amount: Some(amount),
            status: status(last),
        });
    }
    if let Some(threshold) = commission_threshold {
        let crossed = base
            .windows(2)
            .find(|w| w[0].1.investment < threshold && w[1].1.investment >= threshold);
        if let Some(w) = crossed {
            out.push(Milestone {
                date: w[1].0,
                label: "Commission rate drop".to_string(),
                amount: Some(w[1].1.investment),
                status: status(w[1].0),
            });
        }
    }
    if !input.fixed_transfer.is_zero() {
        out.push(Milestone {
            date: target.delivery_date,
            label: "Fixed transfer applied".to_string(),
            amount: Some(input.fixed_transfer),
            status: status(target.delivery_date),
        });
    }
    out.push(Milestone {
        date: target.delivery_date,
        label: "Delivery".to_string(),
        amount: Some(target.target_amount),
        status: match status(target.delivery_date) {
            MilestoneStatus::Done => MilestoneStatus::Done,
            _ => MilestoneStatus::Target,
        },
    });

    out.sort_by_key(|m| m.date);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn target() -> FundingTarget {
        FundingTarget {
            id: 1,
            name: "Apartment".into(),
            target_amount: Decimal::from(1_000_000),
            delivery_date: d(2026, 4, 15),
            monthly_payment: None,
            monthly_payment_end: None,
            lump_sum_amount: None,
            lump_sum_date: None,
            sale_proceeds_amount: None,
            sale_proceeds_date: None,
            debt_payoff_ids: vec![],
            investment_annual_return: Decimal::ZERO,
            property_appreciation_rate: Decimal::ZERO,
            property_current_value: Decimal::ZERO,
            amount_paid: Decimal::from(100_000),
            fixed_transfer_amount: None,
            is_active: true,
        }
    }

    fn run(t: &FundingTarget, debts: &[Debt], today: NaiveDate) -> ProjectionReport {
        let input = ProjectionInput {
            target: t,
            debts,
            balances: LiveBalances {
                fixed_income: Some(Decimal::from(50_000)),
                crypto: Some(Decimal::ZERO),
            },
            fixed_transfer: Decimal::ZERO,
            today,
        };
        let cfg = ProjectionConfig {
            crypto_annual_growth: Decimal::ZERO,
            investment_scenarios: vec![],
            commission_threshold: None,
        };
        project(&input, &cfg)
    }

    #[test]
    fn lump_sum_in_current_month_is_not_counted() {
        let mut t = target();
        t.lump_sum_amount = Some(Decimal::from(20_000));
        t.lump_sum_date = Some(d(2025, 10, 25));
        let report = run(&t, &[], d(2025, 10, 19));
        assert!(report.series.iter().all(|p| p.paid == Decimal::from(100_000)));
    }

    #[test]
    fn lump_sum_lands_in_its_month() {
        let mut t = target();
        t.lump_sum_amount = Some(Decimal::from(20_000));
        t.lump_sum_date = Some(d(2025, 12, 5));
        let report = run(&t, &[], d(2025, 10, 19));
        assert_eq!(report.series[1].paid, Decimal::from(100_000));
        assert_eq!(report.series[2].paid, Decimal::from(120_000));
        assert_eq!(report.terminal().unwrap().paid, Decimal::from(120_000));
    }

    #[test]
    fn payments_stop_after_end_date() {
        let mut t = target();
        t.monthly_payment = Some(Decimal::from(1_000));
        t.monthly_payment_end = Some(d(2025, 12, 31));
        let report = run(&t, &[], d(2025, 10, 19));
        // November and December only
        assert_eq!(report.terminal().unwrap().paid, Decimal::from(102_000));
        let last = report
            .milestones
            .iter()
            .find(|m| m.label == "Last monthly payment")
            .unwrap();
        assert_eq!(last.date, d(2025, 12, 31));
    }

    #[test]
    fn sale_injection_is_net_of_debts_and_floored() {
        let mut t = target();
        t.sale_proceeds_amount = Some(Decimal::from(30_000));
        t.sale_proceeds_date = Some(d(2026, 1, 10));
        t.debt_payoff_ids = vec![7, 8];
        let debts = vec![
            Debt { id: 7, name: "Car".into(), balance: Decimal::from(25_000) },
            Debt { id: 8, name: "Card".into(), balance: Decimal::from(15_000) },
        ];
        let report = run(&t, &debts, d(2025, 10, 19));
        // proceeds below payoff total: injection is zero, not negative
        assert_eq!(report.terminal().unwrap().investment, Decimal::from(50_000));
        let payoffs: Vec<_> = report
            .milestones
            .iter()
            .filter(|m| m.label.starts_with("Pay off"))
            .collect();
        assert_eq!(payoffs.len(), 2);
        assert!(payoffs.iter().all(|m| m.date == d(2026, 1, 10)));
    }

    #[test]
    fn unknown_payoff_debt_becomes_a_caveat() {
        let mut t = target();
        t.debt_payoff_ids = vec![42];
        let report = run(&t, &[], d(2025, 10, 19));
        assert!(report.caveats.iter().any(|c| c.contains("42")));
    }

    #[test]
    fn milestones_are_sorted_and_tagged() {
        let mut t = target();
        t.lump_sum_amount = Some(Decimal::from(5_000));
        t.lump_sum_date = Some(d(2025, 9, 1));
        t.monthly_payment = Some(Decimal::from(1_000));
        let report = run(&t, &[], d(2025, 10, 19));
        let dates: Vec<_> = report.milestones.iter().map(|m| m.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(report.milestones[0].status, MilestoneStatus::Done);
        let delivery = report.milestones.last().unwrap();
        assert_eq!(delivery.label, "Delivery");
        assert_eq!(delivery.status, MilestoneStatus::Target);
    }

    #[test]
    fn commission_milestone_marks_first_crossing() {
        let mut t = target();
        t.sale_proceeds_amount = Some(Decimal::from(200_000));
        t.sale_proceeds_date = Some(d(2026, 2, 1));
        let input = ProjectionInput {
            target: &t,
            debts: &[],
            balances: LiveBalances {
                fixed_income: Some(Decimal::from(50_000)),
                crypto: None,
            },
            fixed_transfer: Decimal::ZERO,
            today: d(2025, 10, 19),
        };
        let cfg = ProjectionConfig {
            crypto_annual_growth: Decimal::ZERO,
            investment_scenarios: vec![],
            commission_threshold: Some(Decimal::from(100_000)),
        };
        let report = project(&input, &cfg);
        let drop = report
            .milestones
            .iter()
            .find(|m| m.label == "Commission rate drop")
            .unwrap();
        assert_eq!(drop.date, d(2026, 2, 1));
        assert!(report.caveats.iter().any(|c| c.contains("crypto")));
    }

    #[test]
    fn fixed_transfer_defaults_to_usable_infonavit() {
        let rec = |instrument, usable, bal: i64| RetirementRecord {
            id: 0,
            instrument,
            owner: "ana".into(),
            current_balance: Decimal::from(bal),
            annual_return_rate: None,
            retirement_age: None,
            usable_for_target: usable,
            last_updated: d(2025, 1, 1),
        };
        let records = vec![
            rec(Instrument::Infonavit, true, 300_000),
            rec(Instrument::Infonavit, false, 90_000),
            rec(Instrument::Afore, true, 1_000_000),
        ];
        let mut t = target();
        assert_eq!(fixed_transfer_for(&t, &records), Decimal::from(300_000));
        t.fixed_transfer_amount = Some(Decimal::from(350_000));
        assert_eq!(fixed_transfer_for(&t, &records), Decimal::from(350_000));
    }
}
