// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Billing-cycle allocation.
//!
//! Non-monthly categories (bimonthly power, quarterly water, annual
//! insurance) are charged against calendar-anchored windows: bimonthly
//! windows are Jan–Feb, Mar–Apr, ... regardless of when a bill lands.
//! Monthly categories are charged by transaction date, except that a bill
//! with a coverage period is spread over the days it actually pays for.

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use super::enrichment::{EnrichedBudget, EnrichedTransaction, enrich_budgets, enrich_transactions};
use super::percent_of;
use crate::error::Result;
use crate::models::{BillingCycle, TxType};
use crate::repo::{self, TxFilter};
use crate::utils::{add_months, month_end, month_start};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub billing_cycle: BillingCycle,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Spend charged to the whole window (equals the month's spend for monthly cycles).
    pub window_total: Decimal,
    pub monthly_equivalent_spend: Decimal,
    /// Nominal budget for the whole cycle.
    pub budget_amount: Decimal,
    /// `window_total / budget_amount × 100`, or 0 for a zero budget.
    pub percent_used: Decimal,
}

/// Calendar window of `cycle` containing `month`.
pub fn cycle_window(cycle: BillingCycle, month: NaiveDate) -> (NaiveDate, NaiveDate) {
    let len = cycle.months();
    let first_month = ((month.month() - 1) / len) * len + 1;
    let start = NaiveDate::from_ymd_opt(month.year(), first_month, 1).unwrap_or(month_start(month));
    let end = month_end(add_months(start, len - 1));
    (start, end)
}

fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Share of `tx` charged to `[from, to]`, prorated by coverage days when the
/// bill carries a coverage period.
fn charged_share(tx: &EnrichedTransaction, from: NaiveDate, to: NaiveDate) -> Decimal {
    match tx.tx.coverage() {
        Some((cov_start, cov_end)) => {
            let lo = cov_start.max(from);
            let hi = cov_end.min(to);
            if lo > hi {
                return Decimal::ZERO;
            }
            let overlap = Decimal::from(inclusive_days(lo, hi));
            let total = Decimal::from(inclusive_days(cov_start, cov_end));
            tx.tx.amount_home * overlap / total
        }
        None if tx.tx.date >= from && tx.tx.date <= to => tx.tx.amount_home,
        None => Decimal::ZERO,
    }
}

/// Charges the expense transactions of one category to the reference month.
pub fn allocate(
    txns: &[EnrichedTransaction],
    budget_amount: Decimal,
    cycle: BillingCycle,
    month: NaiveDate,
) -> Allocation {
    let expenses = txns.iter().filter(|t| t.tx.r#type == TxType::Expense);

    match cycle {
        BillingCycle::Monthly => {
            let start = month_start(month);
            let end = month_end(start);
            let spent: Decimal = expenses.map(|t| charged_share(t, start, end)).sum();
            Allocation {
                billing_cycle: cycle,
                window_start: start,
                window_end: end,
                window_total: spent,
                monthly_equivalent_spend: spent,
                budget_amount,
                percent_used: percent_of(spent, budget_amount),
            }
        }
        _ => {
            let (start, end) = cycle_window(cycle, month);
            let total: Decimal = expenses
                .filter(|t| t.tx.date >= start && t.tx.date <= end)
                .map(|t| t.tx.amount_home)
                .sum();
            Allocation {
                billing_cycle: cycle,
                window_start: start,
                window_end: end,
                window_total: total,
                monthly_equivalent_spend: total / Decimal::from(cycle.months()),
                budget_amount,
                percent_used: percent_of(total, budget_amount),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub category_id: i64,
    pub category_name: String,
    #[serde(flatten)]
    pub allocation: Allocation,
}

impl BudgetStatus {
    pub fn remaining(&self) -> Decimal {
        self.allocation.budget_amount - self.allocation.window_total
    }
}

/// One status row per budget, each allocated with its own category's cycle.
pub fn budget_statuses(
    budgets: &[EnrichedBudget],
    txns: &[EnrichedTransaction],
    month: NaiveDate,
) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|b| {
            let own: Vec<EnrichedTransaction> = txns
                .iter()
                .filter(|t| t.tx.category_id == Some(b.category_id))
                .cloned()
                .collect();
            BudgetStatus {
                category_id: b.category_id,
                category_name: b.category_name.clone(),
                allocation: allocate(&own, b.amount, b.billing_cycle, month),
            }
        })
        .collect()
}

/// Loads the month's budgets and the year's transactions, then allocates.
/// Every calendar-anchored window lies inside its year, so one year of rows
/// (plus any bill whose coverage reaches into it) is enough.
pub fn load_budget_statuses(conn: &Connection, month: NaiveDate) -> Result<Vec<BudgetStatus>> {
    let month = month_start(month);
    let categories = repo::load_categories(conn)?;
    let budgets = enrich_budgets(&repo::load_budgets(conn, Some(month))?, &categories)?;
    let filter = TxFilter {
        from: NaiveDate::from_ymd_opt(month.year(), 1, 1),
        to: NaiveDate::from_ymd_opt(month.year(), 12, 31),
        ..TxFilter::default()
    };
    let txns = enrich_transactions(&repo::load_transactions(conn, &filter)?, &categories);
    Ok(budget_statuses(&budgets, &txns, month))
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub month: NaiveDate,
    pub monthly_equivalent_spend: Decimal,
}

/// Normalised monthly spend for the `months` months ending at `end_month`,
/// oldest first.
pub fn monthly_trend(
    txns: &[EnrichedTransaction],
    cycle: BillingCycle,
    end_month: NaiveDate,
    months: u32,
) -> Vec<TrendPoint> {
    let end = month_start(end_month);
    (0..months)
        .rev()
        .filter_map(|back| end.checked_sub_months(chrono::Months::new(back)))
        .map(|m| TrendPoint {
            month: m,
            monthly_equivalent_spend: allocate(txns, Decimal::ZERO, cycle, m)
                .monthly_equivalent_spend,
        })
        .collect()
}
