// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

use crate::config::Config;
use crate::engine::recurring::{RecurringProcessor, SweepOutcome};
use crate::utils::{pretty_table, today_from};

pub fn handle(conn: &mut Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("run", sub)) = m.subcommand() {
        let today = today_from(sub)?;
        let summary = RecurringProcessor::new(cfg).run(conn, today)?;
        let outcome = summary.outcome();

        if sub.get_flag("json") || sub.get_flag("jsonl") {
            let v = json!({ "date": today, "outcome": outcome, "summary": summary });
            if sub.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&v)?);
            } else {
                println!("{}", serde_json::to_string(&v)?);
            }
            return Ok(());
        }

        if outcome == SweepOutcome::Busy {
            println!("Another sweep holds the lease; nothing was posted.");
            return Ok(());
        }
        println!(
            "{}",
            pretty_table(
                &["Subscriptions", "Income", "MSI", "Skipped", "Errors"],
                vec![vec![
                    summary.subscriptions.to_string(),
                    summary.income.to_string(),
                    summary.installments.to_string(),
                    summary.skipped.to_string(),
                    summary.errors.len().to_string(),
                ]],
            )
        );
        for e in &summary.errors {
            println!("  {}: {}", e.item, e.message);
        }
        println!("Sweep for {}: {:?}", today, outcome);
    }
    Ok(())
}
