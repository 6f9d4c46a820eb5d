// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use super::live_balances;
use crate::config::Config;
use crate::engine::insights::current_or_refresh;
use crate::models::Severity;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("show", sub)) = m.subcommand() {
        let offline = sub.get_flag("offline");
        let run = current_or_refresh(conn, cfg, Utc::now(), sub.get_flag("refresh"), || {
            live_balances(conn, cfg, offline)
        })?;
        if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &run.entry.insights)? {
            return Ok(());
        }
        let data = run
            .entry
            .insights
            .iter()
            .map(|i| {
                let sev = match i.severity {
                    Severity::Critical => "CRITICAL",
                    Severity::Warning => "warning",
                    Severity::Info => "info",
                };
                vec![sev.to_string(), i.title.clone(), i.detail.clone()]
            })
            .collect();
        println!("{}", pretty_table(&["Severity", "Insight", "Detail"], data));
        println!(
            "Generated {}{}",
            run.entry.created_at.format("%Y-%m-%d %H:%M UTC"),
            if run.from_cache { " (cached)" } else { "" }
        );
    }
    Ok(())
}
