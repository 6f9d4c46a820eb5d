// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

use crate::config::Config;
use crate::engine::retirement::project_retirement;
use crate::models::{Instrument, RetirementRecord};
use crate::repo;
use crate::utils::{
    fmt_money, maybe_print_json, opt_date, opt_decimal, parse_decimal, pretty_table, req_str,
    today_from,
};

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let instrument: Instrument = req_str(sub, "instrument")?.parse()?;
            let rec = RetirementRecord {
                id: 0,
                instrument,
                owner: req_str(sub, "owner")?.to_string(),
                current_balance: parse_decimal(req_str(sub, "balance")?)?,
                annual_return_rate: opt_decimal(sub, "rate")?,
                retirement_age: sub.get_one::<u32>("age").copied(),
                usable_for_target: sub.get_flag("usable"),
                last_updated: opt_date(sub, "updated")?
                    .unwrap_or_else(|| Local::now().date_naive()),
            };
            repo::upsert_retirement_record(conn, &rec)?;
            println!(
                "Saved {} balance for {}: {}",
                rec.instrument,
                rec.owner,
                fmt_money(&rec.current_balance, &cfg.home_currency)
            );
        }
        Some(("list", sub)) => {
            let records = repo::load_retirement_records(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &records)? {
                let data = records
                    .iter()
                    .map(|r| {
                        vec![
                            r.owner.clone(),
                            r.instrument.to_string(),
                            fmt_money(&r.current_balance, &cfg.home_currency),
                            r.annual_return_rate
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "default".into()),
                            if r.usable_for_target { "yes" } else { "" }.to_string(),
                            r.last_updated.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Owner", "Instrument", "Balance", "Rate", "For target", "Updated"],
                        data
                    )
                );
            }
        }
        Some(("project", sub)) => {
            let today = today_from(sub)?;
            let records = repo::load_retirement_records(conn)?;
            let report = project_retirement(&records, &cfg.retirement, today);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                let scenario_names: Vec<&str> = cfg
                    .retirement
                    .scenarios
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect();
                let mut headers = vec!["Owner", "Retires", "Years", "Balance", "Projected"];
                headers.extend(scenario_names.iter().copied());
                let data = report
                    .rows
                    .iter()
                    .map(|r| {
                        let mut row = vec![
                            r.owner.clone(),
                            r.retirement_date.to_string(),
                            format!("{:.1}", r.years_to_retirement.round_dp(1)),
                            format!("{:.2}", r.current_balance.round_dp(2)),
                            format!("{:.2}", r.projected_balance.round_dp(2)),
                        ];
                        row.extend(
                            r.scenarios
                                .iter()
                                .map(|s| format!("{:.2}", s.projected_balance.round_dp(2))),
                        );
                        row
                    })
                    .collect();
                println!("{}", pretty_table(&headers, data));
                for c in &report.caveats {
                    println!("note: {}", c);
                }
            }
        }
        _ => {}
    }
    Ok(())
}
