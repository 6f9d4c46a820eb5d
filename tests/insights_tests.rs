// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use finboard::config::Config;
use finboard::engine::insights::current_or_refresh;
use finboard::engine::projection::LiveBalances;
use finboard::models::{BillingCycle, CategoryType, Frequency, RecurringItem, Severity, TxType};
use finboard::repo::{self, NewTransaction};
use finboard::db;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let cat = repo::insert_category(&conn, "Dining", CategoryType::Expense, BillingCycle::Monthly, None, None)
        .unwrap();
    repo::set_budget(&conn, cat, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(), Decimal::from(2_000))
        .unwrap();
    repo::insert_transaction(
        &conn,
        &NewTransaction {
            r#type: TxType::Expense,
            amount: Decimal::from(2_400),
            currency: "MXN".into(),
            amount_home: Decimal::from(2_400),
            category_id: Some(cat),
            merchant: "Tacos".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 10, 10).unwrap(),
            owner: None,
            recurring_id: None,
            tags: vec![],
            coverage_start: None,
            coverage_end: None,
            idempotency_key: None,
        },
    )
    .unwrap();
    repo::insert_recurring_item(
        &conn,
        "MXN",
        &RecurringItem {
            id: 0,
            name: "Netflix".into(),
            amount: Decimal::from(219),
            currency: "MXN".into(),
            category_id: None,
            frequency: Frequency::Monthly,
            next_due_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            merchant: None,
            is_active: true,
        },
    )
    .unwrap();
    conn
}

fn offline() -> LiveBalances {
    LiveBalances::default()
}

#[test]
fn overspent_budget_is_the_first_insight() {
    let conn = setup();
    let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
    let run = current_or_refresh(&conn, &Config::default(), now, false, offline).unwrap();

    assert!(!run.from_cache);
    let first = &run.entry.insights[0];
    assert_eq!(first.severity, Severity::Critical);
    assert_eq!(first.title, "Dining is over budget");
    assert!(
        run.entry
            .insights
            .iter()
            .any(|i| i.kind == "commitments" && i.severity == Severity::Warning)
    );
    // no funding target configured
    assert!(run.entry.insights.iter().all(|i| i.kind != "funding"));
}

#[test]
fn fresh_entry_is_served_from_cache() {
    let conn = setup();
    let cfg = Config::default();
    let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
    let first = current_or_refresh(&conn, &cfg, now, false, offline).unwrap();

    let fetched = Cell::new(false);
    let later = current_or_refresh(&conn, &cfg, now + Duration::hours(23), false, || {
        fetched.set(true);
        offline()
    })
    .unwrap();
    assert!(later.from_cache);
    assert!(!fetched.get());
    assert_eq!(later.entry.id, first.entry.id);
    assert_eq!(later.entry.insights, first.entry.insights);
}

#[test]
fn stale_entry_is_regenerated_and_appended() {
    let conn = setup();
    let cfg = Config::default();
    let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
    let first = current_or_refresh(&conn, &cfg, now, false, offline).unwrap();
    let later = current_or_refresh(&conn, &cfg, now + Duration::hours(25), false, offline).unwrap();

    assert!(!later.from_cache);
    assert!(later.entry.id > first.entry.id);
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM insight_cache", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

#[test]
fn forced_refresh_ignores_a_fresh_entry() {
    let conn = setup();
    let cfg = Config::default();
    let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
    current_or_refresh(&conn, &cfg, now, false, offline).unwrap();
    let forced = current_or_refresh(&conn, &cfg, now + Duration::minutes(5), true, offline).unwrap();
    assert!(!forced.from_cache);
    // 219 × 30.4375 / 30
    assert_eq!(forced.entry.input_snapshot["committed_monthly"], "222.19");
}
