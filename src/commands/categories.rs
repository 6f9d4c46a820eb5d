// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{BillingCycle, CategoryType};
use crate::repo;
use crate::utils::{maybe_print_json, opt_str, pretty_table, req_str};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_str(sub, "name")?;
            let kind: CategoryType = req_str(sub, "type")?.parse()?;
            let cycle: BillingCycle = req_str(sub, "cycle")?.parse()?;
            repo::insert_category(
                conn,
                name,
                kind,
                cycle,
                opt_str(sub, "icon"),
                opt_str(sub, "color"),
            )?;
            println!("Added category '{}' ({}, billed {})", name, kind, cycle);
        }
        Some(("list", sub)) => {
            let cats = repo::load_categories(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let data = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.r#type.to_string(),
                            c.billing_cycle.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Type", "Billing cycle"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
