// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use super::live_balances;
use crate::balances;
use crate::config::Config;
use crate::repo;
use crate::utils::{fmt_money, maybe_print_json, opt_str, parse_date, parse_decimal, pretty_table, req_str};

#[derive(Serialize)]
struct BalanceRow {
    source: &'static str,
    amount: Option<rust_decimal::Decimal>,
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ledger-add", sub)) => {
            let date = parse_date(req_str(sub, "date")?)?;
            let amount = parse_decimal(req_str(sub, "amount")?)?;
            repo::insert_fixed_income_entry(conn, date, amount, opt_str(sub, "note"))?;
            println!(
                "Recorded fixed-income movement {} on {}",
                fmt_money(&amount, &cfg.home_currency),
                date
            );
        }
        Some(("crypto-add", sub)) => {
            let quantity = parse_decimal(req_str(sub, "quantity")?)?;
            let symbol = balances::add_crypto_holding(conn, cfg, req_str(sub, "symbol")?, quantity)?;
            println!("Holding {} {}", quantity, symbol);
        }
        Some(("crypto-list", sub)) => {
            let holdings = repo::load_crypto_holdings(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &holdings)? {
                let data = holdings
                    .iter()
                    .map(|h| vec![h.symbol.clone(), h.quantity.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Symbol", "Quantity"], data));
            }
        }
        Some(("balances", sub)) => {
            let live = live_balances(conn, cfg, sub.get_flag("offline"));
            let rows = vec![
                BalanceRow {
                    source: "fixed-income",
                    amount: live.fixed_income,
                },
                BalanceRow {
                    source: "crypto",
                    amount: live.crypto,
                },
            ];
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.source.to_string(),
                            r.amount
                                .map(|a| fmt_money(&a, &cfg.home_currency))
                                .unwrap_or_else(|| "unavailable".into()),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Source", "Balance"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
