// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finboard::config::Config;
use finboard::models::{BillingCycle, CategoryType};
use finboard::{cli, commands::transactions, db, repo};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    repo::insert_category(&conn, "Cat1", CategoryType::Expense, BillingCycle::Monthly, None, None)
        .unwrap();
    conn
}

fn tx(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["finboard", "tx"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        transactions::handle(conn, &Config::default(), tx_m)
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_limit_respected() {
    let conn = setup();
    for day in 1..=3 {
        let date = format!("2025-01-0{}", day);
        tx(&conn, &["add", "--date", &date, "--amount", "10", "--merchant", "P", "--category", "Cat1"])
            .unwrap();
    }
    let matches = cli::build_cli().get_matches_from(["finboard", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let filter = transactions::list_filter(&conn, list_m).unwrap();
            let rows = transactions::query_rows(&conn, &filter).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-01-03");
            assert_eq!(rows[0].category, "Cat1");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn foreign_currency_requires_home_amount() {
    let conn = setup();
    let err = tx(
        &conn,
        &["add", "--date", "2025-02-03", "--amount", "20", "--merchant", "Shop", "--currency", "usd"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("--amount-home is required for USD"));

    tx(
        &conn,
        &[
            "add", "--date", "2025-02-03", "--amount", "20", "--merchant", "Shop", "--currency",
            "usd", "--amount-home", "342.80",
        ],
    )
    .unwrap();
    let (ccy, home): (String, String) = conn
        .query_row("SELECT currency, amount_home FROM transactions", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(ccy, "USD");
    assert_eq!(home, "342.80");
}

#[test]
fn negative_amount_is_rejected_before_write() {
    let conn = setup();
    let err = tx(&conn, &["add", "--date", "2025-02-03", "--amount=-5", "--merchant", "Shop"])
        .unwrap_err();
    assert!(err.to_string().contains("amount"));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn coverage_and_tags_are_stored() {
    let conn = setup();
    tx(
        &conn,
        &[
            "add", "--date", "2025-03-05", "--amount", "900", "--merchant", "Water", "--tag",
            "utility", "--tag", " home ", "--coverage-start", "2025-01-01", "--coverage-end",
            "2025-03-31",
        ],
    )
    .unwrap();
    let rows = transactions::query_rows(&conn, &repo::TxFilter::default()).unwrap();
    assert_eq!(rows[0].coverage, "2025-01-01..2025-03-31");
    assert_eq!(rows[0].tags, vec!["utility".to_string(), "home".to_string()]);
    assert_eq!(rows[0].category, "Uncategorized");
}

#[test]
fn half_open_coverage_is_rejected() {
    let conn = setup();
    let err = tx(
        &conn,
        &["add", "--date", "2025-03-05", "--amount", "900", "--merchant", "Water", "--coverage-start", "2025-01-01"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("coverage"));
}
