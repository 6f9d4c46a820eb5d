// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod categories;
pub mod exporter;
pub mod holdings;
pub mod importer;
pub mod insights;
pub mod recurring;
pub mod retirement;
pub mod sweep;
pub mod target;
pub mod transactions;

use rusqlite::Connection;

use crate::balances::{self, CoinGeckoFeed, OfflineFeed};
use crate::config::Config;
use crate::engine::projection::LiveBalances;

/// Fetches both live balances. Failures are logged and surface as `None`.
pub fn live_balances(conn: &Connection, cfg: &Config, offline: bool) -> LiveBalances {
    let fixed = balances::fixed_income_balance(conn);
    let crypto = if offline {
        balances::crypto_valuation(conn, &OfflineFeed, cfg)
    } else {
        CoinGeckoFeed::new(&cfg.prices)
            .and_then(|feed| balances::crypto_valuation(conn, &feed, cfg))
    };
    LiveBalances::from_results(fixed, crypto)
}
