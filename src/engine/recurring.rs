// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Daily sweep over recurring definitions.
//!
//! Three independent classes are processed: subscriptions (date keyed),
//! income sources (gated by day-of-month windows) and MSI installment plans
//! (month keyed, counted). Each item's check, insert and schedule update run
//! in one SQLite transaction, and the whole sweep holds a single-writer lease
//! so overlapping invocations cannot both pass the existence check.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, FrequencyConfig};
use crate::error::{CoreError, Result};
use crate::models::{Frequency, IncomeSource, InstallmentPlan, RecurringItem, TxType};
use crate::repo::{self, NewTransaction};
use crate::utils::{add_months, month_end, month_start};

pub const TAG_RECURRING: &str = "auto-recurring";
pub const TAG_INCOME: &str = "auto-income";
pub const TAG_MSI: &str = "auto-msi";

/// Next due date after `date` for `freq`. Month steps clamp to the target
/// month's last day.
pub fn advance(date: NaiveDate, freq: Frequency) -> NaiveDate {
    match freq {
        Frequency::Weekly => date + Duration::days(7),
        Frequency::Biweekly => date + Duration::days(14),
        Frequency::Monthly => add_months(date, 1),
        Frequency::Quarterly => add_months(date, 3),
        Frequency::Yearly => add_months(date, 12),
    }
}

/// Normalises a per-period amount to a monthly figure using the configured
/// day-length divisors.
pub fn monthly_equivalent(amount: Decimal, freq: Frequency, cfg: &FrequencyConfig) -> Decimal {
    amount * cfg.month_days / Decimal::from(cfg.days(freq))
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub item: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOutcome {
    NothingToDo,
    Completed,
    Partial,
    Failed,
    Busy,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    pub subscriptions: usize,
    pub income: usize,
    pub installments: usize,
    pub skipped: usize,
    pub errors: Vec<ItemError>,
    #[serde(skip)]
    busy: bool,
}

impl SweepSummary {
    pub fn busy() -> Self {
        Self {
            busy: true,
            ..Self::default()
        }
    }

    pub fn posted(&self) -> usize {
        self.subscriptions + self.income + self.installments
    }

    pub fn outcome(&self) -> SweepOutcome {
        if self.busy {
            return SweepOutcome::Busy;
        }
        match (self.errors.is_empty(), self.posted()) {
            (true, 0) => SweepOutcome::NothingToDo,
            (true, _) => SweepOutcome::Completed,
            (false, 0) => SweepOutcome::Failed,
            (false, _) => SweepOutcome::Partial,
        }
    }
}

enum Step {
    Posted,
    Skipped,
    NotDue,
}

/// Takes the sweep lease unless another holder has an unexpired one.
pub fn acquire_lease(
    conn: &mut Connection,
    holder: &str,
    now: DateTime<Utc>,
    ttl_seconds: i64,
) -> Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current: Option<(String, String)> = tx
        .query_row(
            "SELECT holder, expires_at FROM sweep_lease WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    if let Some((other, expires)) = current {
        let expires_at = DateTime::parse_from_rfc3339(&expires)
            .map_err(|_| CoreError::parse("lease expiry", expires.clone()))?
            .with_timezone(&Utc);
        if other != holder && expires_at > now {
            debug!(holder = %other, expires = %expires_at, "sweep lease held");
            return Ok(false);
        }
    }
    let expires_at = now + Duration::seconds(ttl_seconds);
    tx.execute(
        "INSERT INTO sweep_lease(id, holder, expires_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET holder=excluded.holder, expires_at=excluded.expires_at",
        params![holder, expires_at.to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(true)
}

pub fn release_lease(conn: &Connection, holder: &str) -> Result<()> {
    conn.execute("DELETE FROM sweep_lease WHERE id=1 AND holder=?1", params![holder])?;
    Ok(())
}

pub struct RecurringProcessor<'a> {
    cfg: &'a Config,
    holder: String,
}

impl<'a> RecurringProcessor<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self {
            cfg,
            holder: format!("sweep-{}", std::process::id()),
        }
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    /// Runs all three sub-sweeps for `today`. Returns a `Busy` summary without
    /// touching any item when another sweep holds the lease.
    pub fn run(&self, conn: &mut Connection, today: NaiveDate) -> Result<SweepSummary> {
        if !acquire_lease(conn, &self.holder, Utc::now(), self.cfg.sweep.lease_seconds)? {
            info!("another sweep is running");
            return Ok(SweepSummary::busy());
        }
        let result = self.sweep(conn, today);
        release_lease(conn, &self.holder)?;
        let summary = result?;
        info!(
            outcome = ?summary.outcome(),
            subscriptions = summary.subscriptions,
            income = summary.income,
            installments = summary.installments,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "sweep finished"
        );
        Ok(summary)
    }

    fn sweep(&self, conn: &mut Connection, today: NaiveDate) -> Result<SweepSummary> {
        let mut summary = SweepSummary::default();

        for item in repo::load_recurring_items(conn, true)? {
            let step = in_item_tx(conn, |tx| self.post_subscription(tx, &item, today));
            record(&mut summary, &item.name, step, |s| s.subscriptions += 1);
        }
        for src in repo::load_income_sources(conn, true)? {
            let step = in_item_tx(conn, |tx| self.post_income(tx, &src, today));
            record(&mut summary, &src.name, step, |s| s.income += 1);
        }
        for plan in repo::load_installment_plans(conn, true)? {
            let step = in_item_tx(conn, |tx| self.post_installment(tx, &plan, today));
            record(&mut summary, &plan.name, step, |s| s.installments += 1);
        }

        Ok(summary)
    }

    fn post_subscription(
        &self,
        tx: &Connection,
        item: &RecurringItem,
        today: NaiveDate,
    ) -> Result<Step> {
        let due = item.next_due_date;
        if due > today {
            return Ok(Step::NotDue);
        }
        if !item.currency.eq_ignore_ascii_case(&self.cfg.home_currency) {
            return Err(CoreError::invalid(
                "currency",
                format!("{} has no home-currency amount to post", item.currency),
            ));
        }
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE recurring_id=?1 AND date=?2)",
            params![item.id, due],
            |r| r.get(0),
        )?;
        let step = if exists {
            Step::Skipped
        } else {
            repo::insert_transaction(
                tx,
                &NewTransaction {
                    r#type: TxType::Expense,
                    amount: item.amount,
                    currency: item.currency.clone(),
                    amount_home: item.amount,
                    category_id: item.category_id,
                    merchant: item.merchant.clone().unwrap_or_else(|| item.name.clone()),
                    description: Some(item.name.clone()),
                    date: due,
                    owner: None,
                    recurring_id: Some(item.id),
                    tags: vec![TAG_RECURRING.to_string()],
                    coverage_start: None,
                    coverage_end: None,
                    idempotency_key: Some(format!("sub:{}:{}", item.id, due)),
                },
            )?;
            Step::Posted
        };
        let next = advance(due, item.frequency);
        tx.execute(
            "UPDATE recurring_items SET next_due_date=?1 WHERE id=?2",
            params![next, item.id],
        )?;
        debug!(item = %item.name, due = %due, next = %next, "subscription advanced");
        Ok(step)
    }

    fn post_income(&self, tx: &Connection, src: &IncomeSource, today: NaiveDate) -> Result<Step> {
        let windows = self.cfg.income.windows_for(src.frequency);
        let Some((idx, window)) = windows
            .iter()
            .enumerate()
            .find(|(_, w)| w.contains(today.day()))
        else {
            return Ok(Step::NotDue);
        };

        let first = month_start(today);
        let last = month_end(today);
        let (from, to, key) = if windows.len() == 1 {
            (first, last, format!("inc:{}:{}", src.id, first.format("%Y-%m")))
        } else {
            let day = |d: u32| first.with_day(d).unwrap_or(last);
            (
                day(window.0),
                day(window.1),
                format!("inc:{}:{}:w{}", src.id, first.format("%Y-%m"), idx + 1),
            )
        };

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM transactions
                 WHERE type='income' AND merchant=?1 AND date BETWEEN ?2 AND ?3)",
            params![src.name, from, to],
            |r| r.get(0),
        )?;
        if exists {
            return Ok(Step::Skipped);
        }
        repo::insert_transaction(
            tx,
            &NewTransaction {
                r#type: TxType::Income,
                amount: src.amount,
                currency: self.cfg.home_currency.clone(),
                amount_home: src.amount,
                category_id: src.category_id,
                merchant: src.name.clone(),
                description: Some(src.r#type.clone()),
                date: today,
                owner: None,
                recurring_id: None,
                tags: vec![TAG_INCOME.to_string()],
                coverage_start: None,
                coverage_end: None,
                idempotency_key: Some(key),
            },
        )?;
        Ok(Step::Posted)
    }

    fn post_installment(
        &self,
        tx: &Connection,
        plan: &InstallmentPlan,
        today: NaiveDate,
    ) -> Result<Step> {
        let (made, count): (u32, u32) = tx.query_row(
            "SELECT payments_made, installment_count FROM installment_plans WHERE id=?1",
            params![plan.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        if made >= count {
            tx.execute(
                "UPDATE installment_plans SET is_active=0 WHERE id=?1",
                params![plan.id],
            )?;
            debug!(plan = %plan.name, "installment plan complete, deactivated");
            return Ok(Step::Skipped);
        }

        let merchant = plan.ledger_merchant();
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE merchant=?1 AND date BETWEEN ?2 AND ?3)",
            params![merchant, month_start(today), month_end(today)],
            |r| r.get(0),
        )?;
        if exists {
            return Ok(Step::Skipped);
        }

        repo::insert_transaction(
            tx,
            &NewTransaction {
                r#type: TxType::Expense,
                amount: plan.installment_amount,
                currency: self.cfg.home_currency.clone(),
                amount_home: plan.installment_amount,
                category_id: plan.category_id,
                merchant,
                description: Some(format!("Installment {}/{}", made + 1, count)),
                date: today,
                owner: None,
                recurring_id: None,
                tags: vec![TAG_MSI.to_string()],
                coverage_start: None,
                coverage_end: None,
                idempotency_key: Some(format!("msi:{}:{}", plan.id, today.format("%Y-%m"))),
            },
        )?;
        let updated = tx.execute(
            "UPDATE installment_plans
                SET payments_made = payments_made + 1,
                    is_active = CASE WHEN payments_made + 1 >= installment_count THEN 0 ELSE 1 END
              WHERE id=?1 AND payments_made < installment_count",
            params![plan.id],
        )?;
        if updated != 1 {
            return Err(CoreError::invalid(
                "payments_made",
                format!("plan '{}' is already at its installment count", plan.name),
            ));
        }
        Ok(Step::Posted)
    }
}

fn in_item_tx<F>(conn: &mut Connection, f: F) -> Result<Step>
where
    F: FnOnce(&Connection) -> Result<Step>,
{
    let tx = conn.transaction()?;
    let step = f(&tx)?;
    tx.commit()?;
    Ok(step)
}

fn record(
    summary: &mut SweepSummary,
    name: &str,
    step: Result<Step>,
    on_post: impl FnOnce(&mut SweepSummary),
) {
    match step {
        Ok(Step::Posted) => {
            info!(item = name, "posted");
            on_post(summary);
        }
        Ok(Step::Skipped) => {
            debug!(item = name, "already posted for this period");
            summary.skipped += 1;
        }
        Ok(Step::NotDue) => {}
        Err(e) => {
            warn!(item = name, error = %e, "item failed, rolled back");
            summary.errors.push(ItemError {
                item: name.to_string(),
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn advance_steps_by_frequency() {
        assert_eq!(advance(d(2025, 3, 1), Frequency::Weekly), d(2025, 3, 8));
        assert_eq!(advance(d(2025, 3, 1), Frequency::Biweekly), d(2025, 3, 15));
        assert_eq!(advance(d(2025, 1, 31), Frequency::Monthly), d(2025, 2, 28));
        assert_eq!(advance(d(2025, 11, 30), Frequency::Quarterly), d(2026, 2, 28));
        assert_eq!(advance(d(2024, 2, 29), Frequency::Yearly), d(2025, 2, 28));
    }

    #[test]
    fn monthly_equivalent_uses_divisors() {
        let cfg = FrequencyConfig::default();
        let weekly = monthly_equivalent(Decimal::from(70), Frequency::Weekly, &cfg);
        assert_eq!(weekly, Decimal::new(304375, 3));
        let monthly = monthly_equivalent(Decimal::from(300), Frequency::Monthly, &cfg);
        assert_eq!(monthly, Decimal::new(304375, 3));
    }

    #[test]
    fn outcome_distinguishes_partial_from_failure() {
        let mut s = SweepSummary::default();
        assert_eq!(s.outcome(), SweepOutcome::NothingToDo);
        s.skipped = 2;
        assert_eq!(s.outcome(), SweepOutcome::NothingToDo);
        s.errors.push(ItemError { item: "x".into(), message: "boom".into() });
        assert_eq!(s.outcome(), SweepOutcome::Failed);
        s.income = 1;
        assert_eq!(s.outcome(), SweepOutcome::Partial);
        s.errors.clear();
        assert_eq!(s.outcome(), SweepOutcome::Completed);
        assert_eq!(SweepSummary::busy().outcome(), SweepOutcome::Busy);
    }
}
