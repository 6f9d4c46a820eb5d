// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Funding target, debts and the monthly projection report.

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::live_balances;
use crate::config::Config;
use crate::engine::projection::{
    MilestoneStatus, ProjectionInput, ProjectionReport, fixed_transfer_for, project,
};
use crate::models::FundingTarget;
use crate::repo;
use crate::utils::{
    fmt_money, fmt_month, maybe_print_json, opt_date, opt_decimal, parse_date, parse_decimal,
    pretty_table, req_str, today_from,
};

pub fn handle(conn: &mut Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, cfg, sub)?,
        Some(("show", sub)) => {
            let target = repo::active_funding_target(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &target)? {
                let ccy = &cfg.home_currency;
                let opt = |v: Option<Decimal>| v.map(|d| fmt_money(&d, ccy)).unwrap_or_default();
                let optd = |v: Option<chrono::NaiveDate>| v.map(|d| d.to_string()).unwrap_or_default();
                let rows = vec![
                    vec!["Name".to_string(), target.name.clone()],
                    vec!["Target".to_string(), fmt_money(&target.target_amount, ccy)],
                    vec!["Delivery".to_string(), target.delivery_date.to_string()],
                    vec!["Paid".to_string(), fmt_money(&target.amount_paid, ccy)],
                    vec![
                        "Monthly payment".to_string(),
                        format!("{} {}", opt(target.monthly_payment), optd(target.monthly_payment_end)),
                    ],
                    vec![
                        "Lump sum".to_string(),
                        format!("{} {}", opt(target.lump_sum_amount), optd(target.lump_sum_date)),
                    ],
                    vec![
                        "Sale proceeds".to_string(),
                        format!(
                            "{} {}",
                            opt(target.sale_proceeds_amount),
                            optd(target.sale_proceeds_date)
                        ),
                    ],
                    vec![
                        "Investment return".to_string(),
                        target.investment_annual_return.to_string(),
                    ],
                    vec![
                        "Property".to_string(),
                        format!(
                            "{} at {}",
                            fmt_money(&target.property_current_value, ccy),
                            target.property_appreciation_rate
                        ),
                    ],
                    vec!["Fixed transfer".to_string(), opt(target.fixed_transfer_amount)],
                ];
                println!("{}", pretty_table(&["Field", "Value"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

fn set(conn: &mut Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let debts = repo::load_debts(conn)?;
    let debt_payoff_ids = sub
        .get_many::<String>("payoff-debt")
        .map(|names| {
            names
                .map(|n| {
                    debts
                        .iter()
                        .find(|d| d.name.eq_ignore_ascii_case(n.trim()))
                        .map(|d| d.id)
                        .ok_or_else(|| anyhow!("Debt '{}' not found", n))
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();

    let target = FundingTarget {
        id: 0,
        name: req_str(sub, "name")?.to_string(),
        target_amount: parse_decimal(req_str(sub, "amount")?)?,
        delivery_date: parse_date(req_str(sub, "delivery")?)?,
        monthly_payment: opt_decimal(sub, "monthly-payment")?,
        monthly_payment_end: opt_date(sub, "payment-end")?,
        lump_sum_amount: opt_decimal(sub, "lump-sum")?,
        lump_sum_date: opt_date(sub, "lump-sum-date")?,
        sale_proceeds_amount: opt_decimal(sub, "sale-proceeds")?,
        sale_proceeds_date: opt_date(sub, "sale-date")?,
        debt_payoff_ids,
        investment_annual_return: parse_decimal(req_str(sub, "return")?)?,
        property_appreciation_rate: parse_decimal(req_str(sub, "appreciation")?)?,
        property_current_value: parse_decimal(req_str(sub, "property-value")?)?,
        amount_paid: parse_decimal(req_str(sub, "paid")?)?,
        fixed_transfer_amount: opt_decimal(sub, "fixed-transfer")?,
        is_active: true,
    };
    if target.lump_sum_amount.is_some() != target.lump_sum_date.is_some() {
        anyhow::bail!("--lump-sum and --lump-sum-date must be given together");
    }
    if target.sale_proceeds_amount.is_some() != target.sale_proceeds_date.is_some() {
        anyhow::bail!("--sale-proceeds and --sale-date must be given together");
    }
    let id = repo::replace_funding_target(conn, &target)?;
    println!(
        "Funding target '{}' set: {} by {} (#{})",
        target.name,
        fmt_money(&target.target_amount, &cfg.home_currency),
        target.delivery_date,
        id
    );
    Ok(())
}

pub fn handle_debt(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_str(sub, "name")?;
            let balance = parse_decimal(req_str(sub, "balance")?)?;
            if balance < Decimal::ZERO {
                anyhow::bail!("Debt balance must be non-negative");
            }
            repo::insert_debt(conn, name, balance)?;
            println!("Added debt '{}' ({})", name, fmt_money(&balance, &cfg.home_currency));
        }
        Some(("list", sub)) => {
            let debts = repo::load_debts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &debts)? {
                let data = debts
                    .iter()
                    .map(|d| vec![d.name.clone(), fmt_money(&d.balance, &cfg.home_currency)])
                    .collect();
                println!("{}", pretty_table(&["Debt", "Balance"], data));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Loads everything the projection needs and runs it.
pub fn build_report(
    conn: &Connection,
    cfg: &Config,
    today: chrono::NaiveDate,
    offline: bool,
) -> Result<ProjectionReport> {
    let target = repo::active_funding_target(conn).context("Projection needs a funding target")?;
    let debts = repo::load_debts(conn)?;
    let records = repo::load_retirement_records(conn)?;
    let input = ProjectionInput {
        target: &target,
        debts: &debts,
        balances: live_balances(conn, cfg, offline),
        fixed_transfer: fixed_transfer_for(&target, &records),
        today,
    };
    Ok(project(&input, &cfg.projection))
}

pub fn projection(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    let today = today_from(m)?;
    let report = build_report(conn, cfg, today, m.get_flag("offline"))?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let ccy = &cfg.home_currency;
    let money = |d: &Decimal| format!("{:.2}", d.round_dp(2));
    println!(
        "{}: {} due {}",
        report.target_name,
        fmt_money(&report.target_amount, ccy),
        report.delivery_date
    );
    let series = report
        .series
        .iter()
        .map(|p| {
            vec![
                fmt_month(p.month),
                money(&p.paid),
                money(&p.investment),
                money(&p.crypto),
                money(&p.fixed_transfer),
                money(&p.total),
                money(&p.gap),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Month", "Paid", "Investment", "Crypto", "Transfer", "Total", "Gap"],
            series
        )
    );

    let scenarios = report
        .scenarios
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                format!("{}%", (s.annual_rate * Decimal::from(100)).normalize()),
                money(&s.total),
                money(&s.gap),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Scenario", "Rate", "Total", "Gap"], scenarios)
    );

    let milestones = report
        .milestones
        .iter()
        .map(|ms| {
            let status = match ms.status {
                MilestoneStatus::Done => "done",
                MilestoneStatus::Pending => "pending",
                MilestoneStatus::Target => "target",
            };
            vec![
                ms.date.to_string(),
                ms.label.clone(),
                ms.amount.as_ref().map(money).unwrap_or_default(),
                status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Milestone", "Amount", "Status"], milestones)
    );
    println!("Projected equity at delivery: {}", fmt_money(&report.equity, ccy));
    for c in &report.caveats {
        println!("note: {}", c);
    }
    Ok(())
}
