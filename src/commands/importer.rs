// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::models::TxType;
use crate::repo::{self, NewTransaction};
use crate::utils::{id_for_category, parse_date, parse_decimal, req_str};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::{HashMap, hash_map::Entry};
use tracing::info;

pub fn handle(conn: &mut Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(conn, cfg, sub),
        _ => Ok(()),
    }
}

/// Columns: date,type,amount,currency,category,merchant,description,owner,amount_home.
/// An empty type takes the direction from the amount's sign.
fn import_transactions(conn: &mut Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let path = req_str(sub, "path")?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut category_cache: HashMap<String, i64> = HashMap::new();
    let mut imported = 0usize;

    for result in rdr.records() {
        let rec = result?;
        let field = |i: usize| rec.get(i).map(str::trim).unwrap_or("");
        let opt_field = |i: usize| Some(field(i)).filter(|s| !s.is_empty()).map(str::to_string);

        let date_raw = field(0);
        let type_raw = field(1);
        let amount_raw = field(2);
        let merchant = field(5).to_string();
        if merchant.is_empty() {
            return Err(anyhow!("Merchant missing for row dated '{}'", date_raw));
        }

        let date = parse_date(date_raw)
            .with_context(|| format!("Invalid transaction date '{}'", date_raw))?;
        let signed = parse_decimal(amount_raw)
            .with_context(|| format!("Invalid amount '{}' for {}", amount_raw, merchant))?;
        let kind = if type_raw.is_empty() {
            if signed < Decimal::ZERO {
                TxType::Expense
            } else {
                TxType::Income
            }
        } else {
            type_raw.parse::<TxType>()?
        };
        let amount = signed.abs();

        let currency = match field(3) {
            "" => cfg.home_currency.clone(),
            c => c.to_uppercase(),
        };
        let amount_home = match field(8) {
            "" if currency == cfg.home_currency => amount,
            "" => {
                return Err(anyhow!(
                    "Currency '{}' on {} needs an amount_home value ({})",
                    currency,
                    date,
                    cfg.home_currency
                ));
            }
            raw => parse_decimal(raw)
                .with_context(|| format!("Invalid amount_home '{}' for {}", raw, merchant))?
                .abs(),
        };

        let category = field(4);
        let category_id = if category.is_empty() {
            None
        } else {
            let id = match category_cache.entry(category.to_string()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => *entry.insert(id_for_category(&tx, category)?),
            };
            Some(id)
        };

        repo::insert_transaction(
            &tx,
            &NewTransaction {
                r#type: kind,
                amount,
                currency,
                amount_home,
                category_id,
                merchant,
                description: opt_field(6),
                date,
                owner: opt_field(7),
                recurring_id: None,
                tags: Vec::new(),
                coverage_start: None,
                coverage_end: None,
                idempotency_key: None,
            },
        )?;
        imported += 1;
    }
    tx.commit()?;
    info!(imported, path, "csv import committed");
    println!("Imported {} transactions from {}", imported, path);
    Ok(())
}
