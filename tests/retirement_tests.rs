// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finboard::config::Config;
use finboard::engine::retirement::project_retirement;
use finboard::{cli, commands::retirement, db, repo};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config() -> Config {
    let mut cfg = Config::default();
    cfg.retirement.birth_dates.insert("ana".into(), d(1990, 3, 15));
    cfg.retirement.birth_dates.insert("luis".into(), d(1985, 7, 1));
    cfg
}

fn set(conn: &Connection, cfg: &Config, args: &[&str]) {
    let mut full = vec!["finboard", "retirement", "set", "--updated", "2025-10-01"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    if let Some(("retirement", m)) = matches.subcommand() {
        retirement::handle(conn, cfg, m).unwrap();
    } else {
        panic!("no retirement subcommand");
    }
}

fn setup(cfg: &Config) -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    set(&conn, cfg, &["--instrument", "afore", "--owner", "ana", "--balance", "500000"]);
    set(
        &conn,
        cfg,
        &["--instrument", "afore", "--owner", "luis", "--balance", "800000", "--rate", "0.09", "--age", "60"],
    );
    set(
        &conn,
        cfg,
        &["--instrument", "infonavit", "--owner", "ana", "--balance", "150000", "--usable"],
    );
    conn
}

#[test]
fn scenario_balances_follow_rate_order() {
    let cfg = config();
    let conn = setup(&cfg);
    let records = repo::load_retirement_records(&conn).unwrap();
    let report = project_retirement(&records, &cfg.retirement, d(2025, 10, 19));

    assert_eq!(report.rows.len(), 2);
    for row in &report.rows {
        let balances: Vec<Decimal> = row.scenarios.iter().map(|s| s.projected_balance).collect();
        assert!(balances.windows(2).all(|w| w[0] < w[1]), "{:?}", balances);
        assert!(row.projected_balance > row.current_balance);
    }
}

#[test]
fn record_overrides_defaults() {
    let cfg = config();
    let conn = setup(&cfg);
    let records = repo::load_retirement_records(&conn).unwrap();
    let report = project_retirement(&records, &cfg.retirement, d(2025, 10, 19));

    let ana = report.rows.iter().find(|r| r.owner == "ana").unwrap();
    assert_eq!(ana.retirement_age, 65);
    assert_eq!(ana.retirement_date, d(2055, 3, 15));
    assert_eq!(ana.annual_rate, Decimal::new(85, 3));

    let luis = report.rows.iter().find(|r| r.owner == "luis").unwrap();
    assert_eq!(luis.retirement_age, 60);
    assert_eq!(luis.retirement_date, d(2045, 7, 1));
    assert_eq!(luis.annual_rate, Decimal::new(9, 2));
}

#[test]
fn upsert_keeps_one_row_per_owner_and_instrument() {
    let cfg = config();
    let conn = setup(&cfg);
    set(&conn, &cfg, &["--instrument", "afore", "--owner", "ana", "--balance", "525000"]);

    let records = repo::load_retirement_records(&conn).unwrap();
    assert_eq!(records.len(), 3);
    let ana = records
        .iter()
        .find(|r| r.owner == "ana" && r.current_balance == Decimal::from(525_000))
        .unwrap();
    assert_eq!(ana.last_updated, d(2025, 10, 1));
}

#[test]
fn missing_birth_date_is_a_caveat_not_a_guess() {
    let cfg = Config::default();
    let conn = setup(&config());
    let records = repo::load_retirement_records(&conn).unwrap();
    let report = project_retirement(&records, &cfg.retirement, d(2025, 10, 19));

    assert!(report.rows.is_empty());
    assert_eq!(report.caveats.len(), 2);
    assert!(report.caveats[0].contains("is not configured"));
}

#[test]
fn negative_balance_is_rejected() {
    let cfg = config();
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let matches = cli::build_cli().get_matches_from([
        "finboard",
        "retirement",
        "set",
        "--instrument",
        "afore",
        "--owner",
        "ana",
        "--balance=-1",
    ]);
    if let Some(("retirement", m)) = matches.subcommand() {
        let err = retirement::handle(&conn, &cfg, m).unwrap_err();
        assert!(err.to_string().contains("current_balance"));
    } else {
        panic!("no retirement subcommand");
    }
}

#[test]
fn rate_at_or_below_minus_one_is_rejected() {
    let cfg = config();
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let matches = cli::build_cli().get_matches_from([
        "finboard",
        "retirement",
        "set",
        "--instrument",
        "afore",
        "--owner",
        "ana",
        "--balance",
        "500000",
        "--rate=-1",
    ]);
    if let Some(("retirement", m)) = matches.subcommand() {
        let err = retirement::handle(&conn, &cfg, m).unwrap_err();
        assert!(err.to_string().contains("annual_return_rate"));
    } else {
        panic!("no retirement subcommand");
    }
    assert!(repo::load_retirement_records(&conn).unwrap().is_empty());
}
