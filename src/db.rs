// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("org", "Finboard", "finboard"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("finboard.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Creates every table if missing. Money is stored as decimal TEXT, dates as
/// `YYYY-MM-DD`, timestamps as RFC 3339.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        icon TEXT,
        color TEXT,
        type TEXT NOT NULL DEFAULT 'expense' CHECK(type IN ('expense','income','both')),
        billing_cycle TEXT NOT NULL DEFAULT 'monthly'
            CHECK(billing_cycle IN ('monthly','bimonthly','quarterly','annual'))
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL CHECK(type IN ('expense','income')),
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        amount_home TEXT NOT NULL,
        category_id INTEGER,
        merchant TEXT NOT NULL,
        description TEXT,
        date TEXT NOT NULL,
        owner TEXT,
        recurring_id INTEGER,
        tags TEXT NOT NULL DEFAULT '[]',
        coverage_start TEXT,
        coverage_end TEXT,
        idempotency_key TEXT UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_recurring ON transactions(recurring_id, date);

    -- one row per category per month is expected but deliberately not enforced
    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        month TEXT NOT NULL,
        amount TEXT NOT NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS recurring_items(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        category_id INTEGER,
        frequency TEXT NOT NULL
            CHECK(frequency IN ('weekly','biweekly','monthly','quarterly','yearly')),
        next_due_date TEXT NOT NULL,
        merchant TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS income_sources(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL,
        amount TEXT NOT NULL,
        frequency TEXT NOT NULL
            CHECK(frequency IN ('weekly','biweekly','monthly','quarterly','yearly')),
        category_id INTEGER,
        is_active INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS installment_plans(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        merchant TEXT,
        installment_amount TEXT NOT NULL,
        installment_count INTEGER NOT NULL CHECK(installment_count > 0),
        payments_made INTEGER NOT NULL DEFAULT 0 CHECK(payments_made >= 0),
        category_id INTEGER,
        is_active INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS debts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        balance TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS funding_targets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        delivery_date TEXT NOT NULL,
        monthly_payment TEXT,
        monthly_payment_end TEXT,
        lump_sum_amount TEXT,
        lump_sum_date TEXT,
        sale_proceeds_amount TEXT,
        sale_proceeds_date TEXT,
        debt_payoff_ids TEXT NOT NULL DEFAULT '[]',
        investment_annual_return TEXT NOT NULL,
        property_appreciation_rate TEXT NOT NULL DEFAULT '0',
        property_current_value TEXT NOT NULL DEFAULT '0',
        amount_paid TEXT NOT NULL DEFAULT '0',
        fixed_transfer_amount TEXT,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS retirement_records(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        instrument TEXT NOT NULL CHECK(instrument IN ('afore','infonavit')),
        owner TEXT NOT NULL,
        current_balance TEXT NOT NULL,
        annual_return_rate TEXT,
        retirement_age INTEGER,
        usable_for_target INTEGER NOT NULL DEFAULT 0,
        last_updated TEXT NOT NULL,
        UNIQUE(instrument, owner)
    );

    CREATE TABLE IF NOT EXISTS fixed_income_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        note TEXT
    );

    CREATE TABLE IF NOT EXISTS crypto_holdings(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL UNIQUE,
        quantity TEXT NOT NULL
    );

    -- append-only; the newest row is the current one
    CREATE TABLE IF NOT EXISTS insight_cache(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        insights TEXT NOT NULL,
        input_snapshot TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sweep_lease(
        id INTEGER PRIMARY KEY CHECK(id = 1),
        holder TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}
