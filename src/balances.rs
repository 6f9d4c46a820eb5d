// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live balance sources fed into the projection.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::{Config, PricesConfig};
use crate::error::{CoreError, Result};
use crate::repo;
use crate::utils::http_client;

/// Spot prices keyed by feed id (e.g. `bitcoin`), quoted in `vs_currency`.
pub trait PriceFeed {
    fn spot_prices(&self, ids: &[&str], vs_currency: &str) -> Result<HashMap<String, Decimal>>;
}

pub struct CoinGeckoFeed {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl CoinGeckoFeed {
    pub fn new(cfg: &PricesConfig) -> Result<Self> {
        let client = http_client().map_err(|e| upstream(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

fn upstream(message: impl Into<String>) -> CoreError {
    CoreError::Upstream {
        source_name: "price feed".to_string(),
        message: message.into(),
    }
}

impl PriceFeed for CoinGeckoFeed {
    fn spot_prices(&self, ids: &[&str], vs_currency: &str) -> Result<HashMap<String, Decimal>> {
        let vs = vs_currency.to_lowercase();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("ids", ids.join(",")), ("vs_currencies", vs.clone())])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| upstream(e.to_string()))?;
        let body: HashMap<String, HashMap<String, Decimal>> =
            resp.json().map_err(|e| upstream(e.to_string()))?;
        Ok(body
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get(&vs).map(|p| (id, *p)))
            .collect())
    }
}

/// Feed used with `--offline`: every lookup is unavailable.
pub struct OfflineFeed;

impl PriceFeed for OfflineFeed {
    fn spot_prices(&self, _ids: &[&str], _vs_currency: &str) -> Result<HashMap<String, Decimal>> {
        Err(upstream("offline"))
    }
}

/// Sum of the fixed-income ledger.
pub fn fixed_income_balance(conn: &Connection) -> Result<Decimal> {
    Ok(repo::load_fixed_income_amounts(conn)?.into_iter().sum())
}

/// Holdings valued at spot in the home currency. No holdings means no feed call.
pub fn crypto_valuation(conn: &Connection, feed: &dyn PriceFeed, cfg: &Config) -> Result<Decimal> {
    let holdings = repo::load_crypto_holdings(conn)?;
    if holdings.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let mut ids = Vec::with_capacity(holdings.len());
    for h in &holdings {
        let id = cfg
            .prices
            .symbols
            .get(&h.symbol)
            .ok_or_else(|| CoreError::NotConfigured {
                what: format!("price id for {}", h.symbol),
            })?;
        ids.push(id.as_str());
    }
    let prices = feed.spot_prices(&ids, &cfg.home_currency)?;

    let mut total = Decimal::ZERO;
    for (h, id) in holdings.iter().zip(ids) {
        let price = prices
            .get(id)
            .ok_or_else(|| upstream(format!("no quote for {}", h.symbol)))?;
        debug!(symbol = %h.symbol, quantity = %h.quantity, price = %price, "valued holding");
        total += h.quantity * *price;
    }
    Ok(total)
}

/// Validates and stores a crypto holding; the quantity replaces any previous one.
pub fn add_crypto_holding(
    conn: &Connection,
    cfg: &Config,
    symbol: &str,
    quantity: Decimal,
) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if !cfg.prices.symbols.contains_key(&symbol) {
        let supported: Vec<&str> = cfg.prices.symbols.keys().map(|s| s.as_str()).collect();
        return Err(CoreError::invalid(
            "symbol",
            format!("unsupported symbol '{}' (supported: {})", symbol, supported.join(", ")),
        ));
    }
    if quantity < Decimal::ZERO {
        return Err(CoreError::invalid("quantity", "must be non-negative"));
    }
    repo::upsert_crypto_holding(conn, &symbol, quantity)?;
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    struct FixedFeed(HashMap<String, Decimal>);

    impl PriceFeed for FixedFeed {
        fn spot_prices(&self, _ids: &[&str], _vs: &str) -> Result<HashMap<String, Decimal>> {
            Ok(self.0.clone())
        }
    }

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn
    }

    #[test]
    fn crypto_is_quantity_times_spot() {
        let conn = conn();
        let cfg = Config::default();
        add_crypto_holding(&conn, &cfg, " btc ", Decimal::new(5, 1)).unwrap();
        add_crypto_holding(&conn, &cfg, "ETH", Decimal::from(2)).unwrap();
        let feed = FixedFeed(HashMap::from([
            ("bitcoin".to_string(), Decimal::from(2_000_000)),
            ("ethereum".to_string(), Decimal::from(60_000)),
        ]));
        let v = crypto_valuation(&conn, &feed, &cfg).unwrap();
        assert_eq!(v, Decimal::from(1_120_000));
    }

    #[test]
    fn empty_holdings_skip_the_feed() {
        let conn = conn();
        let v = crypto_valuation(&conn, &OfflineFeed, &Config::default()).unwrap();
        assert!(v.is_zero());
    }

    #[test]
    fn feed_failure_is_upstream() {
        let conn = conn();
        let cfg = Config::default();
        add_crypto_holding(&conn, &cfg, "SOL", Decimal::from(3)).unwrap();
        let err = crypto_valuation(&conn, &OfflineFeed, &cfg).unwrap_err();
        assert!(matches!(err, CoreError::Upstream { .. }));
    }

    #[test]
    fn holdings_are_validated_before_write() {
        let conn = conn();
        let cfg = Config::default();
        let err = add_crypto_holding(&conn, &cfg, "DOGE", Decimal::ONE).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "symbol"));
        let err = add_crypto_holding(&conn, &cfg, "BTC", Decimal::from(-1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "quantity"));
        assert!(repo::load_crypto_holdings(&conn).unwrap().is_empty());
    }

    #[test]
    fn fixed_income_sums_the_ledger() {
        let conn = conn();
        let d = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        repo::insert_fixed_income_entry(&conn, d, Decimal::from(500_000), None).unwrap();
        repo::insert_fixed_income_entry(&conn, d, Decimal::from(300_000), Some("cetes")).unwrap();
        assert_eq!(fixed_income_balance(&conn).unwrap(), Decimal::from(800_000));
    }
}
