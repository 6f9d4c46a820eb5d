// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row loaders and writers over the table store.
//!
//! Everything here maps flat rows to the typed records in [`crate::models`];
//! the engines never touch SQL directly.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::error::{CoreError, Result};
use crate::models::{
    BillingCycle, Budget, Category, CategoryType, CryptoHolding, Debt, Frequency, FundingTarget,
    IncomeSource, Insight, InsightCacheEntry, InstallmentPlan, Instrument, RecurringItem,
    RetirementRecord, Transaction, TxType,
};

fn col_parse<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = r.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn col_parse_opt<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = r.get(idx)?;
    match raw {
        Some(s) if !s.trim().is_empty() => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        _ => Ok(None),
    }
}

fn col_json<T: serde::de::DeserializeOwned>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------- categories ----------

pub fn load_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, icon, color, type, billing_cycle FROM categories ORDER BY name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            icon: r.get(2)?,
            color: r.get(3)?,
            r#type: col_parse::<CategoryType>(r, 4)?,
            billing_cycle: col_parse::<BillingCycle>(r, 5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_category(
    conn: &Connection,
    name: &str,
    r#type: CategoryType,
    cycle: BillingCycle,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(CoreError::invalid("name", "category name must not be empty"));
    }
    conn.execute(
        "INSERT INTO categories(name, icon, color, type, billing_cycle) VALUES (?1,?2,?3,?4,?5)",
        params![name.trim(), icon, color, r#type.as_str(), cycle.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------- transactions ----------

/// A transaction that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub r#type: TxType,
    pub amount: Decimal,
    pub currency: String,
    pub amount_home: Decimal,
    pub category_id: Option<i64>,
    pub merchant: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub owner: Option<String>,
    pub recurring_id: Option<i64>,
    pub tags: Vec<String>,
    pub coverage_start: Option<NaiveDate>,
    pub coverage_end: Option<NaiveDate>,
    pub idempotency_key: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.amount < Decimal::ZERO {
            return Err(CoreError::invalid(
                "amount",
                "must be non-negative; use the transaction type for direction",
            ));
        }
        if self.merchant.trim().is_empty() {
            return Err(CoreError::invalid("merchant", "must not be empty"));
        }
        match (self.coverage_start, self.coverage_end) {
            (Some(s), Some(e)) if s > e => Err(CoreError::invalid(
                "coverage_end",
                format!("coverage ends ({}) before it starts ({})", e, s),
            )),
            (Some(_), None) | (None, Some(_)) => Err(CoreError::invalid(
                "coverage_start",
                "coverage period needs both a start and an end",
            )),
            _ => Ok(()),
        }
    }
}

pub fn insert_transaction(conn: &Connection, tx: &NewTransaction) -> Result<i64> {
    tx.validate()?;
    let tags = serde_json::to_string(&tx.tags)?;
    conn.execute(
        "INSERT INTO transactions(type, amount, currency, amount_home, category_id, merchant,
             description, date, owner, recurring_id, tags, coverage_start, coverage_end, idempotency_key)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
        params![
            tx.r#type.as_str(),
            tx.amount.to_string(),
            tx.currency,
            tx.amount_home.to_string(),
            tx.category_id,
            tx.merchant,
            tx.description,
            tx.date,
            tx.owner,
            tx.recurring_id,
            tags,
            tx.coverage_start,
            tx.coverage_end,
            tx.idempotency_key,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

const TX_COLUMNS: &str = "id, type, amount, currency, amount_home, category_id, merchant, description, \
     date, owner, recurring_id, tags, coverage_start, coverage_end";

fn map_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        r#type: col_parse::<TxType>(r, 1)?,
        amount: col_parse::<Decimal>(r, 2)?,
        currency: r.get(3)?,
        amount_home: col_parse::<Decimal>(r, 4)?,
        category_id: r.get(5)?,
        merchant: r.get(6)?,
        description: r.get(7)?,
        date: r.get(8)?,
        owner: r.get(9)?,
        recurring_id: r.get(10)?,
        tags: col_json(r, 11)?,
        coverage_start: r.get(12)?,
        coverage_end: r.get(13)?,
    })
}

/// Date bounds are inclusive and match either the transaction date or an
/// overlapping coverage period.
pub fn load_transactions(conn: &Connection, filter: &TxFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", TX_COLUMNS);
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(cat) = filter.category_id {
        sql.push_str(" AND category_id=?");
        args.push(Box::new(cat));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND (date>=? OR IFNULL(coverage_end, date)>=?)");
        args.push(Box::new(from));
        args.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND (date<=? OR IFNULL(coverage_start, date)<=?)");
        args.push(Box::new(to));
        args.push(Box::new(to));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        args.push(Box::new(limit as i64));
    }
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
        map_transaction,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ---------- budgets ----------

fn map_budget(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        category_id: r.get(1)?,
        month: r.get(2)?,
        amount: col_parse::<Decimal>(r, 3)?,
    })
}

pub fn load_budgets(conn: &Connection, month: Option<NaiveDate>) -> Result<Vec<Budget>> {
    let rows = match month {
        Some(m) => {
            let mut stmt = conn.prepare(
                "SELECT id, category_id, month, amount FROM budgets WHERE month=?1 ORDER BY id",
            )?;
            stmt.query_map(params![m], map_budget)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, category_id, month, amount FROM budgets ORDER BY month DESC, id",
            )?;
            stmt.query_map([], map_budget)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(rows)
}

/// Updates the first budget row for the category/month, or inserts one.
pub fn set_budget(
    conn: &Connection,
    category_id: i64,
    month: NaiveDate,
    amount: Decimal,
) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(CoreError::invalid("amount", "budget must be non-negative"));
    }
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM budgets WHERE category_id=?1 AND month=?2 ORDER BY id LIMIT 1",
            params![category_id, month],
            |r| r.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE budgets SET amount=?1 WHERE id=?2",
                params![amount.to_string(), id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO budgets(category_id, month, amount) VALUES (?1,?2,?3)",
                params![category_id, month, amount.to_string()],
            )?;
        }
    }
    Ok(())
}

// ---------- recurring definitions ----------

pub fn load_recurring_items(conn: &Connection, active_only: bool) -> Result<Vec<RecurringItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, currency, category_id, frequency, next_due_date, merchant, is_active
         FROM recurring_items WHERE (?1 = 0 OR is_active = 1) ORDER BY next_due_date, id",
    )?;
    let rows = stmt.query_map(params![active_only as i64], |r| {
        Ok(RecurringItem {
            id: r.get(0)?,
            name: r.get(1)?,
            amount: col_parse::<Decimal>(r, 2)?,
            currency: r.get(3)?,
            category_id: r.get(4)?,
            frequency: col_parse::<Frequency>(r, 5)?,
            next_due_date: r.get(6)?,
            merchant: r.get(7)?,
            is_active: r.get(8)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Subscriptions post straight into the home-currency ledger, so only
/// home-currency definitions are accepted.
pub fn insert_recurring_item(
    conn: &Connection,
    home_currency: &str,
    item: &RecurringItem,
) -> Result<i64> {
    if item.amount <= Decimal::ZERO {
        return Err(CoreError::invalid("amount", "must be positive"));
    }
    if !item.currency.eq_ignore_ascii_case(home_currency) {
        return Err(CoreError::invalid(
            "currency",
            format!("must be the home currency {}, got {}", home_currency, item.currency),
        ));
    }
    conn.execute(
        "INSERT INTO recurring_items(name, amount, currency, category_id, frequency, next_due_date, merchant, is_active)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            item.name,
            item.amount.to_string(),
            item.currency,
            item.category_id,
            item.frequency.as_str(),
            item.next_due_date,
            item.merchant,
            item.is_active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_recurring_active(conn: &Connection, name: &str, active: bool) -> Result<()> {
    let n = conn.execute(
        "UPDATE recurring_items SET is_active=?1 WHERE name=?2",
        params![active, name],
    )?;
    if n == 0 {
        return Err(CoreError::not_found(format!("recurring item '{}'", name)));
    }
    Ok(())
}

pub fn load_income_sources(conn: &Connection, active_only: bool) -> Result<Vec<IncomeSource>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, amount, frequency, category_id, is_active
         FROM income_sources WHERE (?1 = 0 OR is_active = 1) ORDER BY name",
    )?;
    let rows = stmt.query_map(params![active_only as i64], |r| {
        Ok(IncomeSource {
            id: r.get(0)?,
            name: r.get(1)?,
            r#type: r.get(2)?,
            amount: col_parse::<Decimal>(r, 3)?,
            frequency: col_parse::<Frequency>(r, 4)?,
            category_id: r.get(5)?,
            is_active: r.get(6)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_income_source(conn: &Connection, src: &IncomeSource) -> Result<i64> {
    if src.amount <= Decimal::ZERO {
        return Err(CoreError::invalid("amount", "must be positive"));
    }
    conn.execute(
        "INSERT INTO income_sources(name, type, amount, frequency, category_id, is_active)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            src.name,
            src.r#type,
            src.amount.to_string(),
            src.frequency.as_str(),
            src.category_id,
            src.is_active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_installment_plans(
    conn: &Connection,
    active_only: bool,
) -> Result<Vec<InstallmentPlan>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, merchant, installment_amount, installment_count, payments_made, category_id, is_active
         FROM installment_plans WHERE (?1 = 0 OR is_active = 1) ORDER BY name",
    )?;
    let rows = stmt.query_map(params![active_only as i64], |r| {
        Ok(InstallmentPlan {
            id: r.get(0)?,
            name: r.get(1)?,
            merchant: r.get(2)?,
            installment_amount: col_parse::<Decimal>(r, 3)?,
            installment_count: r.get(4)?,
            payments_made: r.get(5)?,
            category_id: r.get(6)?,
            is_active: r.get(7)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_installment_plan(conn: &Connection, plan: &InstallmentPlan) -> Result<i64> {
    if plan.installment_amount <= Decimal::ZERO {
        return Err(CoreError::invalid("installment_amount", "must be positive"));
    }
    if plan.installment_count == 0 {
        return Err(CoreError::invalid("installment_count", "must be at least 1"));
    }
    if plan.payments_made > plan.installment_count {
        return Err(CoreError::invalid(
            "payments_made",
            format!(
                "{} exceeds installment count {}",
                plan.payments_made, plan.installment_count
            ),
        ));
    }
    conn.execute(
        "INSERT INTO installment_plans(name, merchant, installment_amount, installment_count, payments_made, category_id, is_active)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            plan.name,
            plan.merchant,
            plan.installment_amount.to_string(),
            plan.installment_count,
            plan.payments_made,
            plan.category_id,
            plan.is_active,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------- funding target + debts ----------

pub fn load_debts(conn: &Connection) -> Result<Vec<Debt>> {
    let mut stmt = conn.prepare("SELECT id, name, balance FROM debts ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(Debt {
            id: r.get(0)?,
            name: r.get(1)?,
            balance: col_parse::<Decimal>(r, 2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_debt(conn: &Connection, name: &str, balance: Decimal) -> Result<i64> {
    if balance < Decimal::ZERO {
        return Err(CoreError::invalid("balance", "must be non-negative"));
    }
    conn.execute(
        "INSERT INTO debts(name, balance) VALUES (?1,?2)",
        params![name, balance.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

const TARGET_COLUMNS: &str = "id, name, target_amount, delivery_date, monthly_payment, monthly_payment_end, \
     lump_sum_amount, lump_sum_date, sale_proceeds_amount, sale_proceeds_date, debt_payoff_ids, \
     investment_annual_return, property_appreciation_rate, property_current_value, amount_paid, \
     fixed_transfer_amount, is_active";

fn map_target(r: &Row<'_>) -> rusqlite::Result<FundingTarget> {
    Ok(FundingTarget {
        id: r.get(0)?,
        name: r.get(1)?,
        target_amount: col_parse::<Decimal>(r, 2)?,
        delivery_date: r.get(3)?,
        monthly_payment: col_parse_opt::<Decimal>(r, 4)?,
        monthly_payment_end: r.get(5)?,
        lump_sum_amount: col_parse_opt::<Decimal>(r, 6)?,
        lump_sum_date: r.get(7)?,
        sale_proceeds_amount: col_parse_opt::<Decimal>(r, 8)?,
        sale_proceeds_date: r.get(9)?,
        debt_payoff_ids: col_json(r, 10)?,
        investment_annual_return: col_parse::<Decimal>(r, 11)?,
        property_appreciation_rate: col_parse::<Decimal>(r, 12)?,
        property_current_value: col_parse::<Decimal>(r, 13)?,
        amount_paid: col_parse::<Decimal>(r, 14)?,
        fixed_transfer_amount: col_parse_opt::<Decimal>(r, 15)?,
        is_active: r.get(16)?,
    })
}

/// The one active funding target. Zero rows is `NotFound`, several is `Ambiguous`.
pub fn active_funding_target(conn: &Connection) -> Result<FundingTarget> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM funding_targets WHERE is_active=1 ORDER BY id",
        TARGET_COLUMNS
    ))?;
    let mut rows = stmt
        .query_map([], map_target)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match rows.len() {
        0 => Err(CoreError::not_found("active funding target")),
        1 => Ok(rows.remove(0)),
        count => Err(CoreError::Ambiguous {
            what: "active funding target".to_string(),
            count,
        }),
    }
}

/// Stores `target` as the only active row; previous targets are deactivated
/// in the same transaction.
pub fn replace_funding_target(conn: &mut Connection, target: &FundingTarget) -> Result<i64> {
    if target.target_amount <= Decimal::ZERO {
        return Err(CoreError::invalid("target_amount", "must be positive"));
    }
    if target.amount_paid < Decimal::ZERO {
        return Err(CoreError::invalid("amount_paid", "must be non-negative"));
    }
    check_rate("investment_annual_return", target.investment_annual_return)?;
    check_rate("property_appreciation_rate", target.property_appreciation_rate)?;
    let tx = conn.transaction()?;
    tx.execute("UPDATE funding_targets SET is_active=0 WHERE is_active=1", [])?;
    let opt = |d: Option<Decimal>| d.map(|v| v.to_string());
    tx.execute(
        "INSERT INTO funding_targets(name, target_amount, delivery_date, monthly_payment, monthly_payment_end,
             lump_sum_amount, lump_sum_date, sale_proceeds_amount, sale_proceeds_date, debt_payoff_ids,
             investment_annual_return, property_appreciation_rate, property_current_value, amount_paid,
             fixed_transfer_amount, is_active)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,1)",
        params![
            target.name,
            target.target_amount.to_string(),
            target.delivery_date,
            opt(target.monthly_payment),
            target.monthly_payment_end,
            opt(target.lump_sum_amount),
            target.lump_sum_date,
            opt(target.sale_proceeds_amount),
            target.sale_proceeds_date,
            serde_json::to_string(&target.debt_payoff_ids)?,
            target.investment_annual_return.to_string(),
            target.property_appreciation_rate.to_string(),
            target.property_current_value.to_string(),
            target.amount_paid.to_string(),
            opt(target.fixed_transfer_amount),
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

/// Annual rates compound as `(1 + r)`, which must stay positive.
pub fn check_rate(field: &str, rate: Decimal) -> Result<()> {
    if rate <= -Decimal::ONE {
        return Err(CoreError::invalid(field, format!("rate {} must be greater than -1", rate)));
    }
    Ok(())
}

// ---------- retirement ----------

pub fn load_retirement_records(conn: &Connection) -> Result<Vec<RetirementRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, instrument, owner, current_balance, annual_return_rate, retirement_age,
                usable_for_target, last_updated
         FROM retirement_records ORDER BY owner, instrument",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(RetirementRecord {
            id: r.get(0)?,
            instrument: col_parse::<Instrument>(r, 1)?,
            owner: r.get(2)?,
            current_balance: col_parse::<Decimal>(r, 3)?,
            annual_return_rate: col_parse_opt::<Decimal>(r, 4)?,
            retirement_age: r.get(5)?,
            usable_for_target: r.get(6)?,
            last_updated: r.get(7)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Balances are entered by hand; one row per (instrument, owner).
pub fn upsert_retirement_record(conn: &Connection, rec: &RetirementRecord) -> Result<()> {
    if rec.current_balance < Decimal::ZERO {
        return Err(CoreError::invalid("current_balance", "must be non-negative"));
    }
    if let Some(rate) = rec.annual_return_rate {
        check_rate("annual_return_rate", rate)?;
    }
    conn.execute(
        "INSERT INTO retirement_records(instrument, owner, current_balance, annual_return_rate,
             retirement_age, usable_for_target, last_updated)
         VALUES (?1,?2,?3,?4,?5,?6,?7)
         ON CONFLICT(instrument, owner) DO UPDATE SET
             current_balance=excluded.current_balance,
             annual_return_rate=excluded.annual_return_rate,
             retirement_age=excluded.retirement_age,
             usable_for_target=excluded.usable_for_target,
             last_updated=excluded.last_updated",
        params![
            rec.instrument.as_str(),
            rec.owner,
            rec.current_balance.to_string(),
            rec.annual_return_rate.map(|r| r.to_string()),
            rec.retirement_age,
            rec.usable_for_target,
            rec.last_updated,
        ],
    )?;
    Ok(())
}

// ---------- live balance sources ----------

pub fn insert_fixed_income_entry(
    conn: &Connection,
    date: NaiveDate,
    amount: Decimal,
    note: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO fixed_income_entries(date, amount, note) VALUES (?1,?2,?3)",
        params![date, amount.to_string(), note],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_fixed_income_amounts(conn: &Connection) -> Result<Vec<Decimal>> {
    let mut stmt = conn.prepare("SELECT amount FROM fixed_income_entries ORDER BY date, id")?;
    let rows = stmt.query_map([], |r| col_parse::<Decimal>(r, 0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn load_crypto_holdings(conn: &Connection) -> Result<Vec<CryptoHolding>> {
    let mut stmt = conn.prepare("SELECT id, symbol, quantity FROM crypto_holdings ORDER BY symbol")?;
    let rows = stmt.query_map([], |r| {
        Ok(CryptoHolding {
            id: r.get(0)?,
            symbol: r.get(1)?,
            quantity: col_parse::<Decimal>(r, 2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn upsert_crypto_holding(conn: &Connection, symbol: &str, quantity: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO crypto_holdings(symbol, quantity) VALUES (?1,?2)
         ON CONFLICT(symbol) DO UPDATE SET quantity=excluded.quantity",
        params![symbol, quantity.to_string()],
    )?;
    Ok(())
}

// ---------- insight cache ----------

pub fn insert_insight_entry(
    conn: &Connection,
    insights: &[Insight],
    snapshot: &serde_json::Value,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO insight_cache(insights, input_snapshot, created_at) VALUES (?1,?2,?3)",
        params![
            serde_json::to_string(insights)?,
            serde_json::to_string(snapshot)?,
            created_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recently created cache row, if any.
pub fn latest_insight_entry(conn: &Connection) -> Result<Option<InsightCacheEntry>> {
    let row = conn
        .query_row(
            "SELECT id, insights, input_snapshot, created_at FROM insight_cache
             ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((id, insights, snapshot, created)) = row else {
        return Ok(None);
    };
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map_err(|_| CoreError::parse("insight timestamp", created.clone()))?
        .with_timezone(&Utc);
    Ok(Some(InsightCacheEntry {
        id,
        insights: serde_json::from_str(&insights)?,
        input_snapshot: serde_json::from_str(&snapshot)?,
        created_at,
    }))
}
