// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Rule-based insights with an append-only cache.
//!
//! The newest cache row is the current one and stays valid for
//! `insights.cache_ttl_hours` after creation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::allocation::{BudgetStatus, load_budget_statuses};
use super::projection::{LiveBalances, ProjectionInput, fixed_transfer_for, project};
use super::recurring::monthly_equivalent;
use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::models::{Insight, InsightCacheEntry, Severity};
use crate::repo;

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSnapshot {
    pub category: String,
    pub percent_used: Decimal,
    pub window_total: Decimal,
    pub budget_amount: Decimal,
}

impl From<&BudgetStatus> for BudgetSnapshot {
    fn from(s: &BudgetStatus) -> Self {
        Self {
            category: s.category_name.clone(),
            percent_used: s.allocation.percent_used.round_dp(2),
            window_total: s.allocation.window_total.round_dp(2),
            budget_amount: s.allocation.budget_amount,
        }
    }
}

/// Everything the rules look at. Stored alongside the generated insights.
#[derive(Debug, Clone, Serialize)]
pub struct InsightInputs {
    pub month: NaiveDate,
    pub budgets: Vec<BudgetSnapshot>,
    pub committed_monthly: Decimal,
    pub income_monthly: Decimal,
    pub funding_gap: Option<Decimal>,
}

pub fn gather(
    conn: &Connection,
    cfg: &Config,
    balances: LiveBalances,
    today: NaiveDate,
) -> Result<InsightInputs> {
    let budgets = load_budget_statuses(conn, today)?
        .iter()
        .map(BudgetSnapshot::from)
        .collect();

    let freq = &cfg.frequency;
    let subscriptions: Decimal = repo::load_recurring_items(conn, true)?
        .iter()
        .map(|i| monthly_equivalent(i.amount, i.frequency, freq))
        .sum();
    let installments: Decimal = repo::load_installment_plans(conn, true)?
        .iter()
        .map(|p| p.installment_amount)
        .sum();
    let income_monthly: Decimal = repo::load_income_sources(conn, true)?
        .iter()
        .map(|s| monthly_equivalent(s.amount, s.frequency, freq))
        .sum();

    let funding_gap = match repo::active_funding_target(conn) {
        Ok(target) => {
            let debts = repo::load_debts(conn)?;
            let records = repo::load_retirement_records(conn)?;
            let report = project(
                &ProjectionInput {
                    target: &target,
                    debts: &debts,
                    balances,
                    fixed_transfer: fixed_transfer_for(&target, &records),
                    today,
                },
                &cfg.projection,
            );
            report.terminal().map(|p| p.gap.round_dp(2))
        }
        Err(CoreError::NotFound { .. }) => None,
        Err(e) => return Err(e),
    };

    Ok(InsightInputs {
        month: today,
        budgets,
        committed_monthly: (subscriptions + installments).round_dp(2),
        income_monthly: income_monthly.round_dp(2),
        funding_gap,
    })
}

fn rank(s: &Severity) -> u8 {
    match s {
        Severity::Critical => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    }
}

/// Deterministic rules over the gathered inputs, most severe first.
pub fn generate(inputs: &InsightInputs, cfg: &Config) -> Vec<Insight> {
    let mut out = Vec::new();
    let warn_at = cfg.insights.overspend_warning_pct;

    for b in &inputs.budgets {
        if b.budget_amount.is_zero() {
            continue;
        }
        if b.percent_used >= Decimal::ONE_HUNDRED {
            out.push(Insight {
                kind: "budget".into(),
                severity: Severity::Critical,
                title: format!("{} is over budget", b.category),
                detail: format!(
                    "{}% used ({} of {})",
                    b.percent_used, b.window_total, b.budget_amount
                ),
            });
        } else if b.percent_used >= warn_at {
            out.push(Insight {
                kind: "budget".into(),
                severity: Severity::Warning,
                title: format!("{} is close to its limit", b.category),
                detail: format!("{}% used", b.percent_used),
            });
        }
    }

    if inputs.committed_monthly > Decimal::ZERO {
        let insight = if inputs.income_monthly.is_zero() {
            Insight {
                kind: "commitments".into(),
                severity: Severity::Warning,
                title: "Recurring commitments without recorded income".into(),
                detail: format!("{} per month committed", inputs.committed_monthly),
            }
        } else {
            let share = (inputs.committed_monthly / inputs.income_monthly * Decimal::ONE_HUNDRED)
                .round_dp(1);
            Insight {
                kind: "commitments".into(),
                severity: if share > Decimal::from(50) {
                    Severity::Warning
                } else {
                    Severity::Info
                },
                title: format!("Recurring commitments take {}% of income", share),
                detail: format!(
                    "{} committed against {} monthly income",
                    inputs.committed_monthly, inputs.income_monthly
                ),
            }
        };
        out.push(insight);
    }

    if let Some(gap) = inputs.funding_gap {
        out.push(if gap > Decimal::ZERO {
            Insight {
                kind: "funding".into(),
                severity: Severity::Warning,
                title: "Funding target has a gap at delivery".into(),
                detail: format!("{} still uncovered in the base scenario", gap),
            }
        } else {
            Insight {
                kind: "funding".into(),
                severity: Severity::Info,
                title: "Funding target is covered".into(),
                detail: format!("{} surplus in the base scenario", -gap),
            }
        });
    }

    out.sort_by_key(|i| rank(&i.severity));
    out
}

pub fn is_fresh(entry: &InsightCacheEntry, now: DateTime<Utc>, ttl_hours: i64) -> bool {
    now - entry.created_at < Duration::hours(ttl_hours)
}

#[derive(Debug, Clone)]
pub struct InsightRun {
    pub entry: InsightCacheEntry,
    pub from_cache: bool,
}

/// Returns the current cache row while it is fresh, otherwise generates and
/// appends a new one. `balances` is only called on a miss.
pub fn current_or_refresh<F>(
    conn: &Connection,
    cfg: &Config,
    now: DateTime<Utc>,
    force: bool,
    balances: F,
) -> Result<InsightRun>
where
    F: FnOnce() -> LiveBalances,
{
    if !force {
        if let Some(entry) = repo::latest_insight_entry(conn)? {
            if is_fresh(&entry, now, cfg.insights.cache_ttl_hours) {
                debug!(id = entry.id, "insight cache hit");
                return Ok(InsightRun {
                    entry,
                    from_cache: true,
                });
            }
        }
    }
    debug!(force, "insight cache miss, regenerating");

    let inputs = gather(conn, cfg, balances(), now.date_naive())?;
    let insights = generate(&inputs, cfg);
    let snapshot = serde_json::to_value(&inputs)?;
    let id = repo::insert_insight_entry(conn, &insights, &snapshot, now)?;
    Ok(InsightRun {
        entry: InsightCacheEntry {
            id,
            insights,
            input_snapshot: snapshot,
            created_at: now,
        },
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> InsightInputs {
        InsightInputs {
            month: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            budgets: vec![
                BudgetSnapshot {
                    category: "Groceries".into(),
                    percent_used: Decimal::from(112),
                    window_total: Decimal::from(5600),
                    budget_amount: Decimal::from(5000),
                },
                BudgetSnapshot {
                    category: "Power".into(),
                    percent_used: Decimal::from(92),
                    window_total: Decimal::from(920),
                    budget_amount: Decimal::from(1000),
                },
                BudgetSnapshot {
                    category: "Fun".into(),
                    percent_used: Decimal::from(10),
                    window_total: Decimal::from(100),
                    budget_amount: Decimal::from(1000),
                },
            ],
            committed_monthly: Decimal::from(3000),
            income_monthly: Decimal::from(40000),
            funding_gap: Some(Decimal::from(773_170)),
        }
    }

    #[test]
    fn rules_flag_budgets_and_gap() {
        let out = generate(&inputs(), &Config::default());
        assert_eq!(out[0].severity, Severity::Critical);
        assert!(out[0].title.contains("Groceries"));
        assert!(out.iter().any(|i| i.title.contains("Power")));
        assert!(!out.iter().any(|i| i.title.contains("Fun")));
        assert!(out.iter().any(|i| i.kind == "funding" && i.severity == Severity::Warning));
        let commitments = out.iter().find(|i| i.kind == "commitments").unwrap();
        assert_eq!(commitments.severity, Severity::Info);
    }

    #[test]
    fn freshness_is_a_plain_timestamp_check() {
        let created = Utc::now();
        let entry = InsightCacheEntry {
            id: 1,
            insights: vec![],
            input_snapshot: serde_json::Value::Null,
            created_at: created,
        };
        assert!(is_fresh(&entry, created + Duration::hours(23), 24));
        assert!(!is_fresh(&entry, created + Duration::hours(24), 24));
    }
}
