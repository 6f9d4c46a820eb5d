// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use super::transactions::query_rows;
use crate::engine::enrichment::UNCATEGORIZED;
use crate::repo::TxFilter;
use crate::utils::req_str;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req_str(sub, "format")?.to_lowercase();
    let out = req_str(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let mut rows = query_rows(conn, &TxFilter::default())?;
    // oldest first in files
    rows.reverse();

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "date",
            "type",
            "amount",
            "currency",
            "category",
            "merchant",
            "description",
            "owner",
            "amount_home",
        ])?;
        for r in &rows {
            let category = if r.category == UNCATEGORIZED {
                ""
            } else {
                r.category.as_str()
            };
            wtr.write_record([
                r.date.as_str(),
                r.r#type.as_str(),
                r.amount.as_str(),
                r.currency.as_str(),
                category,
                r.merchant.as_str(),
                r.description.as_str(),
                r.owner.as_str(),
                r.amount_home.as_str(),
            ])?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
    }
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
