// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::Datelike;
use rusqlite::Connection;

use crate::engine::allocation::{load_budget_statuses, monthly_trend};
use crate::engine::enrichment::{enrich_budgets, enrich_transactions};
use crate::repo::{self, TxFilter};
use crate::utils::{
    add_months, fmt_month, id_for_category, maybe_print_json, parse_decimal, parse_month,
    pretty_table, req_str,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("trend", sub)) => trend(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(req_str(sub, "month")?)?;
    let cat = req_str(sub, "category")?;
    let amount = parse_decimal(req_str(sub, "amount")?)?;
    let cat_id = id_for_category(conn, cat)?;
    repo::set_budget(conn, cat_id, month, amount)?;
    println!("Budget set for {} / {} = {}", fmt_month(month), cat, amount);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub
        .get_one::<String>("month")
        .map(|s| parse_month(s))
        .transpose()?;
    let categories = repo::load_categories(conn)?;
    let budgets = enrich_budgets(&repo::load_budgets(conn, month)?, &categories)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        let data = budgets
            .iter()
            .map(|b| {
                vec![
                    fmt_month(b.month),
                    b.category_name.clone(),
                    b.billing_cycle.to_string(),
                    format!("{:.2}", b.amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Category", "Cycle", "Budget"], data)
        );
    }
    Ok(())
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(req_str(sub, "month")?)?;
    let statuses = load_budget_statuses(conn, month)
        .with_context(|| format!("Budget status for {}", fmt_month(month)))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &statuses)? {
        let data = statuses
            .iter()
            .map(|s| {
                let a = &s.allocation;
                vec![
                    s.category_name.clone(),
                    a.billing_cycle.to_string(),
                    format!("{}..{}", a.window_start, a.window_end),
                    format!("{:.2}", a.budget_amount),
                    format!("{:.2}", a.window_total.round_dp(2)),
                    format!("{:.2}", a.monthly_equivalent_spend.round_dp(2)),
                    format!("{:.1}%", a.percent_used.round_dp(1)),
                    format!("{:.2}", s.remaining().round_dp(2)),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Category", "Cycle", "Window", "Budget", "Spent", "Monthly eq.", "Used",
                    "Remaining",
                ],
                data,
            )
        );
    }
    Ok(())
}

fn trend(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cat = req_str(sub, "category")?;
    let end = parse_month(req_str(sub, "month")?)?;
    let months = sub.get_one::<u32>("months").copied().unwrap_or(6).max(1);
    let cat_id = id_for_category(conn, cat)?;
    let categories = repo::load_categories(conn)?;
    let cycle = categories
        .iter()
        .find(|c| c.id == cat_id)
        .map(|c| c.billing_cycle)
        .unwrap_or_default();

    // widen to whole years so the oldest window is complete
    let first = end
        .checked_sub_months(chrono::Months::new(months - 1))
        .unwrap_or(end);
    let filter = TxFilter {
        category_id: Some(cat_id),
        from: first.with_month(1),
        to: add_months(end, 12 - end.month()).with_day(31),
        ..TxFilter::default()
    };
    let txns = enrich_transactions(&repo::load_transactions(conn, &filter)?, &categories);
    let points = monthly_trend(&txns, cycle, end, months);

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &points)? {
        let data = points
            .iter()
            .map(|p| {
                vec![
                    fmt_month(p.month),
                    format!("{:.2}", p.monthly_equivalent_spend.round_dp(2)),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Monthly eq."], data));
    }
    Ok(())
}
