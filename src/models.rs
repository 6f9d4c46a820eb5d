// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::parse($label, other)),
                }
            }
        }
    };
}

string_enum!(CategoryType, "category type", {
    Expense => "expense",
    Income => "income",
    Both => "both",
});

string_enum!(BillingCycle, "billing cycle", {
    Monthly => "monthly",
    Bimonthly => "bimonthly",
    Quarterly => "quarterly",
    Annual => "annual",
});

string_enum!(TxType, "transaction type", {
    Expense => "expense",
    Income => "income",
});

string_enum!(Frequency, "frequency", {
    Weekly => "weekly",
    Biweekly => "biweekly",
    Monthly => "monthly",
    Quarterly => "quarterly",
    Yearly => "yearly",
});

string_enum!(Instrument, "instrument type", {
    Afore => "afore",
    Infonavit => "infonavit",
});

impl BillingCycle {
    /// Calendar months covered by one billing window.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Bimonthly => 2,
            BillingCycle::Quarterly => 3,
            BillingCycle::Annual => 12,
        }
    }
}

impl Default for BillingCycle {
    fn default() -> Self {
        BillingCycle::Monthly
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub r#type: CategoryType,
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
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
}

impl Transaction {
    /// The coverage period, when one is recorded and it is not just the
    /// transaction date itself.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.coverage_start, self.coverage_end) {
            (Some(start), Some(end)) if start <= end => {
                if start == self.date && end == self.date {
                    None
                } else {
                    Some((start, end))
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category_id: i64,
    pub month: NaiveDate, // first of month
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringItem {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub category_id: Option<i64>,
    pub frequency: Frequency,
    pub next_due_date: NaiveDate,
    pub merchant: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub category_id: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub id: i64,
    pub name: String,
    pub merchant: Option<String>,
    pub installment_amount: Decimal,
    pub installment_count: u32,
    pub payments_made: u32,
    pub category_id: Option<i64>,
    pub is_active: bool,
}

impl InstallmentPlan {
    pub fn ledger_merchant(&self) -> String {
        format!("MSI: {}", self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingTarget {
    pub id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub delivery_date: NaiveDate,
    pub monthly_payment: Option<Decimal>,
    pub monthly_payment_end: Option<NaiveDate>,
    pub lump_sum_amount: Option<Decimal>,
    pub lump_sum_date: Option<NaiveDate>,
    pub sale_proceeds_amount: Option<Decimal>,
    pub sale_proceeds_date: Option<NaiveDate>,
    pub debt_payoff_ids: Vec<i64>,
    pub investment_annual_return: Decimal,
    pub property_appreciation_rate: Decimal,
    pub property_current_value: Decimal,
    pub amount_paid: Decimal,
    pub fixed_transfer_amount: Option<Decimal>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementRecord {
    pub id: i64,
    pub instrument: Instrument,
    pub owner: String,
    pub current_balance: Decimal,
    pub annual_return_rate: Option<Decimal>,
    pub retirement_age: Option<u32>,
    pub usable_for_target: bool,
    pub last_updated: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoHolding {
    pub id: i64,
    pub symbol: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightCacheEntry {
    pub id: i64,
    pub insights: Vec<Insight>,
    pub input_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: String,
    pub severity: Severity,
    pub title: String,
    pub detail: String,
}
