// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::Config;
use crate::engine::enrichment::enrich_transactions;
use crate::models::TxType;
use crate::repo::{self, NewTransaction, TxFilter};
use crate::utils::{
    id_for_category, maybe_print_json, opt_date, opt_decimal, opt_str, parse_date, parse_decimal,
    pretty_table, req_str,
};

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(req_str(sub, "date")?)?;
    let amount = parse_decimal(req_str(sub, "amount")?)?;
    let merchant = req_str(sub, "merchant")?;
    let kind: TxType = req_str(sub, "type")?.parse()?;
    let currency = opt_str(sub, "currency")
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| cfg.home_currency.clone());
    let amount_home = match opt_decimal(sub, "amount-home")? {
        Some(v) => v,
        None if currency == cfg.home_currency => amount,
        None => bail!(
            "--amount-home is required for {} transactions (home currency is {})",
            currency,
            cfg.home_currency
        ),
    };
    let category_id = opt_str(sub, "category")
        .map(|c| id_for_category(conn, c))
        .transpose()?;
    let tags = sub
        .get_many::<String>("tag")
        .map(|vals| vals.map(|t| t.trim().to_string()).collect())
        .unwrap_or_default();

    let id = repo::insert_transaction(
        conn,
        &NewTransaction {
            r#type: kind,
            amount,
            currency: currency.clone(),
            amount_home,
            category_id,
            merchant: merchant.to_string(),
            description: opt_str(sub, "description").map(str::to_string),
            date,
            owner: opt_str(sub, "owner").map(str::to_string),
            recurring_id: None,
            tags,
            coverage_start: opt_date(sub, "coverage-start")?,
            coverage_end: opt_date(sub, "coverage-end")?,
            idempotency_key: None,
        },
    )?;
    println!(
        "Recorded {} {} {} on {} at '{}' (#{})",
        kind, amount, currency, date, merchant, id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, &list_filter(conn, sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.r#type.clone(),
                    r.merchant.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                    r.coverage.clone(),
                    r.tags.join(","),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Merchant", "Amount", "CCY", "Category", "Covers", "Tags"],
                rows,
            )
        );
    }
    Ok(())
}

/// Filter built from `tx list` arguments.
pub fn list_filter(conn: &Connection, sub: &clap::ArgMatches) -> Result<TxFilter> {
    Ok(TxFilter {
        category_id: opt_str(sub, "category")
            .map(|c| id_for_category(conn, c))
            .transpose()?,
        from: opt_date(sub, "from")?,
        to: opt_date(sub, "to")?,
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub r#type: String,
    pub merchant: String,
    pub amount: String,
    pub currency: String,
    pub amount_home: String,
    pub category: String,
    pub description: String,
    pub coverage: String,
    pub owner: String,
    pub tags: Vec<String>,
}

/// Flat, display-ready rows, newest first.
pub fn query_rows(conn: &Connection, filter: &TxFilter) -> Result<Vec<TransactionRow>> {
    let categories = repo::load_categories(conn)?;
    let txns = repo::load_transactions(conn, filter)?;
    Ok(enrich_transactions(&txns, &categories)
        .into_iter()
        .map(|e| TransactionRow {
            date: e.tx.date.to_string(),
            r#type: e.tx.r#type.to_string(),
            coverage: e
                .tx
                .coverage()
                .map(|(s, end)| format!("{}..{}", s, end))
                .unwrap_or_default(),
            merchant: e.tx.merchant,
            amount: e.tx.amount.to_string(),
            currency: e.tx.currency,
            amount_home: e.tx.amount_home.to_string(),
            category: e.category_name,
            description: e.tx.description.unwrap_or_default(),
            owner: e.tx.owner.unwrap_or_default(),
            tags: e.tx.tags,
        })
        .collect())
}
