// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{HashMap, hash_map::Entry};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::models::{BillingCycle, Budget, Category, CategoryType, Transaction};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub tx: Transaction,
    pub category_name: String,
    pub category_type: CategoryType,
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedBudget {
    pub budget_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub billing_cycle: BillingCycle,
    pub month: NaiveDate,
    pub amount: Decimal,
}

pub fn enrich_transactions(txns: &[Transaction], categories: &[Category]) -> Vec<EnrichedTransaction> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    txns.iter()
        .map(|tx| {
            let cat = tx.category_id.and_then(|id| by_id.get(&id).copied());
            match cat {
                Some(c) => EnrichedTransaction {
                    tx: tx.clone(),
                    category_name: c.name.clone(),
                    category_type: c.r#type,
                    billing_cycle: c.billing_cycle,
                },
                None => EnrichedTransaction {
                    tx: tx.clone(),
                    category_name: UNCATEGORIZED.to_string(),
                    category_type: CategoryType::Both,
                    billing_cycle: BillingCycle::Monthly,
                },
            }
        })
        .collect()
}

/// Joins budgets to their categories. Two budgets for the same category and
/// month are an error, as is a budget pointing at a missing category.
pub fn enrich_budgets(budgets: &[Budget], categories: &[Category]) -> Result<Vec<EnrichedBudget>> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    let mut seen: HashMap<(i64, NaiveDate), usize> = HashMap::new();
    for b in budgets {
        match seen.entry((b.category_id, b.month)) {
            Entry::Occupied(mut e) => *e.get_mut() += 1,
            Entry::Vacant(e) => {
                e.insert(1);
            }
        }
    }
    if let Some(((cat, month), count)) = seen.into_iter().find(|(_, n)| *n > 1) {
        let name = by_id
            .get(&cat)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| cat.to_string());
        return Err(CoreError::Ambiguous {
            what: format!("budget for {} in {}", name, month.format("%Y-%m")),
            count,
        });
    }

    budgets
        .iter()
        .map(|b| {
            let cat = by_id
                .get(&b.category_id)
                .ok_or_else(|| CoreError::not_found(format!("category {}", b.category_id)))?;
            Ok(EnrichedBudget {
                budget_id: b.id,
                category_id: b.category_id,
                category_name: cat.name.clone(),
                billing_cycle: cat.billing_cycle,
                month: b.month,
                amount: b.amount,
            })
        })
        .collect()
}
