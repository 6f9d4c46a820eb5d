// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Definitions the sweep posts from: subscriptions, income sources and MSI plans.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::engine::recurring::monthly_equivalent;
use crate::models::{IncomeSource, InstallmentPlan, RecurringItem};
use crate::repo;
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, opt_str, parse_date, parse_decimal,
    pretty_table, req_str,
};

fn category_arg(conn: &Connection, sub: &clap::ArgMatches) -> Result<Option<i64>> {
    opt_str(sub, "category")
        .map(|c| id_for_category(conn, c))
        .transpose()
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let item = RecurringItem {
                id: 0,
                name: req_str(sub, "name")?.to_string(),
                amount: parse_decimal(req_str(sub, "amount")?)?,
                currency: opt_str(sub, "currency")
                    .map(|c| c.to_uppercase())
                    .unwrap_or_else(|| cfg.home_currency.clone()),
                category_id: category_arg(conn, sub)?,
                frequency: req_str(sub, "frequency")?.parse()?,
                next_due_date: parse_date(req_str(sub, "next-due")?)?,
                merchant: opt_str(sub, "merchant").map(str::to_string),
                is_active: true,
            };
            repo::insert_recurring_item(conn, &cfg.home_currency, &item)?;
            println!(
                "Added {} subscription '{}' due {}",
                item.frequency, item.name, item.next_due_date
            );
        }
        Some(("list", sub)) => {
            let items = repo::load_recurring_items(conn, false)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let committed: Decimal = items
                    .iter()
                    .filter(|i| i.is_active)
                    .map(|i| monthly_equivalent(i.amount, i.frequency, &cfg.frequency))
                    .sum();
                let data = items
                    .iter()
                    .map(|i| {
                        vec![
                            i.name.clone(),
                            fmt_money(&i.amount, &i.currency),
                            i.frequency.to_string(),
                            i.next_due_date.to_string(),
                            format!(
                                "{:.2}",
                                monthly_equivalent(i.amount, i.frequency, &cfg.frequency)
                                    .round_dp(2)
                            ),
                            if i.is_active { "active" } else { "paused" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Name", "Amount", "Frequency", "Next due", "Monthly eq.", "Status"],
                        data
                    )
                );
                println!(
                    "Committed per month: {}",
                    fmt_money(&committed, &cfg.home_currency)
                );
            }
        }
        Some(("pause", sub)) => {
            let name = req_str(sub, "name")?;
            repo::set_recurring_active(conn, name, false)?;
            println!("Paused '{}'", name);
        }
        Some(("resume", sub)) => {
            let name = req_str(sub, "name")?;
            repo::set_recurring_active(conn, name, true)?;
            println!("Resumed '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_income(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let src = IncomeSource {
                id: 0,
                name: req_str(sub, "name")?.to_string(),
                r#type: req_str(sub, "type")?.to_string(),
                amount: parse_decimal(req_str(sub, "amount")?)?,
                frequency: req_str(sub, "frequency")?.parse()?,
                category_id: category_arg(conn, sub)?,
                is_active: true,
            };
            repo::insert_income_source(conn, &src)?;
            if cfg.income.windows_for(src.frequency).is_empty() {
                println!(
                    "Added income '{}'; note: {} income has no posting window and is never auto-posted",
                    src.name, src.frequency
                );
            } else {
                println!("Added {} income '{}'", src.frequency, src.name);
            }
        }
        Some(("list", sub)) => {
            let sources = repo::load_income_sources(conn, false)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &sources)? {
                let data = sources
                    .iter()
                    .map(|s| {
                        let windows = cfg
                            .income
                            .windows_for(s.frequency)
                            .iter()
                            .map(|w| format!("{}-{}", w.0, w.1))
                            .collect::<Vec<_>>()
                            .join(", ");
                        vec![
                            s.name.clone(),
                            s.r#type.clone(),
                            fmt_money(&s.amount, &cfg.home_currency),
                            s.frequency.to_string(),
                            windows,
                            if s.is_active { "active" } else { "paused" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Name", "Type", "Amount", "Frequency", "Posting days", "Status"],
                        data
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_msi(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let plan = InstallmentPlan {
                id: 0,
                name: req_str(sub, "name")?.to_string(),
                merchant: opt_str(sub, "merchant").map(str::to_string),
                installment_amount: parse_decimal(req_str(sub, "amount")?)?,
                installment_count: sub.get_one::<u32>("count").copied().unwrap_or(0),
                payments_made: sub.get_one::<u32>("paid").copied().unwrap_or(0),
                category_id: category_arg(conn, sub)?,
                is_active: true,
            };
            repo::insert_installment_plan(conn, &plan)?;
            println!(
                "Added MSI '{}': {} x {}",
                plan.name,
                plan.installment_count,
                fmt_money(&plan.installment_amount, &cfg.home_currency)
            );
        }
        Some(("list", sub)) => {
            let plans = repo::load_installment_plans(conn, false)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &plans)? {
                let data = plans
                    .iter()
                    .map(|p| {
                        let left = Decimal::from(p.installment_count - p.payments_made.min(p.installment_count))
                            * p.installment_amount;
                        vec![
                            p.name.clone(),
                            fmt_money(&p.installment_amount, &cfg.home_currency),
                            format!("{}/{}", p.payments_made, p.installment_count),
                            fmt_money(&left, &cfg.home_currency),
                            if p.is_active { "active" } else { "done" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Plan", "Installment", "Paid", "Outstanding", "Status"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
