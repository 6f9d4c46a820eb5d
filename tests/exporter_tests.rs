// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finboard::config::Config;
use finboard::models::{BillingCycle, CategoryType, TxType};
use finboard::repo::{self, NewTransaction};
use finboard::{cli, commands::exporter, commands::importer, db};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let cat = repo::insert_category(
        &conn,
        "Groceries",
        CategoryType::Expense,
        BillingCycle::Monthly,
        None,
        None,
    )
    .unwrap();
    repo::insert_transaction(
        &conn,
        &NewTransaction {
            r#type: TxType::Expense,
            amount: Decimal::new(1234, 2),
            currency: "MXN".into(),
            amount_home: Decimal::new(1234, 2),
            category_id: Some(cat),
            merchant: "Corner Shop".into(),
            description: Some("Weekly run".into()),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            owner: None,
            recurring_id: None,
            tags: vec![],
            coverage_start: None,
            coverage_end: None,
            idempotency_key: None,
        },
    )
    .unwrap();
    conn
}

fn export(conn: &Connection, format: &str, out: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from([
        "finboard",
        "export",
        "transactions",
        "--format",
        format,
        "--out",
        out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_transactions_writes_pretty_json() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    export(&conn, "json", &out_path.to_string_lossy()).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-02",
                "type": "expense",
                "merchant": "Corner Shop",
                "amount": "12.34",
                "currency": "MXN",
                "amount_home": "12.34",
                "category": "Groceries",
                "description": "Weekly run",
                "coverage": "",
                "owner": "",
                "tags": []
            }
        ])
    );
}

#[test]
fn csv_export_can_be_imported_again() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();
    export(&conn, "csv", &out_str).unwrap();

    let mut other = Connection::open_in_memory().unwrap();
    db::init_schema(&mut other).unwrap();
    repo::insert_category(&other, "Groceries", CategoryType::Expense, BillingCycle::Monthly, None, None)
        .unwrap();
    let matches =
        cli::build_cli().get_matches_from(["finboard", "import", "transactions", "--path", &out_str]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut other, &Config::default(), import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let (merchant, amount): (String, String) = other
        .query_row("SELECT merchant, amount FROM transactions", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(merchant, "Corner Shop");
    assert_eq!(amount, "12.34");
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    assert!(export(&conn, "xml", &out_path.to_string_lossy()).is_err());
    assert!(!out_path.exists());
}
