// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finboard::engine::allocation::load_budget_statuses;
use finboard::models::{BillingCycle, CategoryType, TxType};
use finboard::repo::{self, NewTransaction};
use finboard::{cli, commands::budgets, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    repo::insert_category(&conn, "Power", CategoryType::Expense, BillingCycle::Bimonthly, None, None)
        .unwrap();
    repo::insert_category(&conn, "Groceries", CategoryType::Expense, BillingCycle::Monthly, None, None)
        .unwrap();
    conn
}

fn spend(conn: &Connection, category: &str, date: NaiveDate, amount: &str) {
    let cat = finboard::utils::id_for_category(conn, category).unwrap();
    let amount: Decimal = amount.parse().unwrap();
    repo::insert_transaction(
        conn,
        &NewTransaction {
            r#type: TxType::Expense,
            amount,
            currency: "MXN".into(),
            amount_home: amount,
            category_id: Some(cat),
            merchant: format!("{} bill", category),
            description: None,
            date,
            owner: None,
            recurring_id: None,
            tags: vec![],
            coverage_start: None,
            coverage_end: None,
            idempotency_key: None,
        },
    )
    .unwrap();
}

fn run(conn: &Connection, args: &[&str]) {
    let mut full = vec!["finboard", "budget"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    if let Some(("budget", budget_m)) = matches.subcommand() {
        budgets::handle(conn, budget_m).unwrap();
    } else {
        panic!("no budget subcommand");
    }
}

#[test]
fn bimonthly_bill_is_charged_to_its_calendar_window() {
    let conn = setup();
    run(&conn, &["set", "--month", "2025-10", "--category", "Power", "--amount", "500"]);
    spend(&conn, "Power", d(2025, 9, 20), "350");
    // outside the Sep-Oct window
    spend(&conn, "Power", d(2025, 8, 28), "410");

    let statuses = load_budget_statuses(&conn, d(2025, 10, 1)).unwrap();
    assert_eq!(statuses.len(), 1);
    let a = &statuses[0].allocation;
    assert_eq!(a.window_start, d(2025, 9, 1));
    assert_eq!(a.window_end, d(2025, 10, 31));
    assert_eq!(a.window_total, Decimal::from(350));
    assert_eq!(a.monthly_equivalent_spend, Decimal::from(175));
    assert_eq!(a.percent_used, Decimal::from(70));
    assert_eq!(statuses[0].remaining(), Decimal::from(150));
}

#[test]
fn budget_set_updates_existing_row() {
    let conn = setup();
    run(&conn, &["set", "--month", "2025-10", "--category", "Groceries", "--amount", "4000"]);
    run(&conn, &["set", "--month", "2025-10", "--category", "Groceries", "--amount", "4500"]);

    let rows: Vec<(String, String)> = conn
        .prepare("SELECT month, amount FROM budgets")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows, vec![("2025-10-01".to_string(), "4500".to_string())]);
}

#[test]
fn monthly_budget_counts_only_the_month() {
    let conn = setup();
    run(&conn, &["set", "--month", "2025-10", "--category", "Groceries", "--amount", "4000"]);
    spend(&conn, "Groceries", d(2025, 10, 2), "1200.50");
    spend(&conn, "Groceries", d(2025, 10, 30), "799.50");
    spend(&conn, "Groceries", d(2025, 11, 1), "600");

    let statuses = load_budget_statuses(&conn, d(2025, 10, 15)).unwrap();
    let a = &statuses[0].allocation;
    assert_eq!(a.window_total, Decimal::from(2000));
    assert_eq!(a.percent_used, Decimal::from(50));
}

#[test]
fn duplicate_budget_rows_are_reported() {
    let conn = setup();
    let cat = finboard::utils::id_for_category(&conn, "Groceries").unwrap();
    for amount in ["100", "200"] {
        conn.execute(
            "INSERT INTO budgets(category_id, month, amount) VALUES (?1, '2025-10-01', ?2)",
            rusqlite::params![cat, amount],
        )
        .unwrap();
    }
    let err = load_budget_statuses(&conn, d(2025, 10, 1)).unwrap_err();
    assert!(matches!(err, finboard::error::CoreError::Ambiguous { count: 2, .. }));
}

#[test]
fn status_and_trend_commands_run() {
    let conn = setup();
    run(&conn, &["set", "--month", "2025-10", "--category", "Power", "--amount", "500"]);
    spend(&conn, "Power", d(2025, 9, 20), "350");
    run(&conn, &["status", "--month", "2025-10", "--json"]);
    run(&conn, &["trend", "--category", "Power", "--month", "2025-10", "--months", "3"]);
    run(&conn, &["list"]);
}
