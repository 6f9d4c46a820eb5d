// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime configuration.
//!
//! Every constant the engines depend on (frequency divisors, default rates,
//! retirement scenarios, income eligibility windows) lives here so callers
//! can inject their own values. A missing file yields the defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Frequency;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_home_currency")]
    pub home_currency: String,

    #[serde(default)]
    pub frequency: FrequencyConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,

    #[serde(default)]
    pub retirement: RetirementConfig,

    #[serde(default)]
    pub income: IncomeConfig,

    #[serde(default)]
    pub insights: InsightsConfig,

    #[serde(default)]
    pub prices: PricesConfig,

    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_currency: default_home_currency(),
            frequency: FrequencyConfig::default(),
            projection: ProjectionConfig::default(),
            retirement: RetirementConfig::default(),
            income: IncomeConfig::default(),
            insights: InsightsConfig::default(),
            prices: PricesConfig::default(),
            access: AccessConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Read config at {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Parse config at {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Explicit path wins; otherwise the platform config dir is tried and a
    /// missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        for name in self
            .income
            .windows
            .keys()
            .chain(self.frequency.divisors.keys())
        {
            name.parse::<Frequency>()
                .map_err(|_| anyhow::anyhow!("Unknown frequency '{}' in config", name))?;
        }
        for (freq, windows) in self.income.windows.iter() {
            for w in windows {
                if w.0 == 0 || w.1 > 31 || w.0 > w.1 {
                    anyhow::bail!(
                        "Invalid income window [{}, {}] for {}: days must satisfy 1 <= start <= end <= 31",
                        w.0,
                        w.1,
                        freq
                    );
                }
            }
        }
        for (freq, days) in self.frequency.divisors.iter() {
            if *days == 0 {
                anyhow::bail!("Frequency divisor for {} must be positive", freq);
            }
        }
        let rates = [
            ("projection.crypto_annual_growth", self.projection.crypto_annual_growth),
            ("retirement.default_annual_rate", self.retirement.default_annual_rate),
        ]
        .into_iter()
        .map(|(k, r)| (k.to_string(), r))
        .chain(
            self.projection
                .investment_scenarios
                .iter()
                .map(|s| (format!("projection.investment_scenarios.{}", s.name), s.annual_rate)),
        )
        .chain(
            self.retirement
                .scenarios
                .iter()
                .map(|s| (format!("retirement.scenarios.{}", s.name), s.annual_rate)),
        );
        for (key, rate) in rates {
            if rate <= -Decimal::ONE {
                anyhow::bail!("Rate {} for {} must be greater than -1", rate, key);
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "Finboard", "finboard")
        .map(|p| p.config_dir().join("config.toml"))
}

fn default_home_currency() -> String {
    "MXN".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyConfig {
    /// Day length of one period, keyed by frequency name.
    #[serde(default = "default_divisors")]
    pub divisors: BTreeMap<String, u32>,

    /// Average days per calendar month used when normalising to a monthly figure.
    #[serde(default = "default_month_days")]
    pub month_days: Decimal,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            divisors: default_divisors(),
            month_days: default_month_days(),
        }
    }
}

impl FrequencyConfig {
    pub fn days(&self, freq: Frequency) -> u32 {
        self.divisors
            .get(freq.as_str())
            .copied()
            .unwrap_or_else(|| Self::builtin_days(freq))
    }

    fn builtin_days(freq: Frequency) -> u32 {
        match freq {
            Frequency::Weekly => 7,
            Frequency::Biweekly => 14,
            Frequency::Monthly => 30,
            Frequency::Quarterly => 91,
            Frequency::Yearly => 365,
        }
    }
}

fn default_divisors() -> BTreeMap<String, u32> {
    [
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ]
    .into_iter()
    .map(|f| (f.as_str().to_string(), FrequencyConfig::builtin_days(f)))
    .collect()
}

fn default_month_days() -> Decimal {
    Decimal::new(304375, 4)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateScenario {
    pub name: String,
    pub annual_rate: Decimal,
}

impl RateScenario {
    pub fn new(name: &str, annual_rate: Decimal) -> Self {
        Self {
            name: name.to_string(),
            annual_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_crypto_growth")]
    pub crypto_annual_growth: Decimal,

    /// Alternative investment rates; the base case always uses the target's own rate.
    #[serde(default = "default_investment_scenarios")]
    pub investment_scenarios: Vec<RateScenario>,

    /// Investment balance at which the fixed-income commission tier drops.
    #[serde(default)]
    pub commission_threshold: Option<Decimal>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            crypto_annual_growth: default_crypto_growth(),
            investment_scenarios: default_investment_scenarios(),
            commission_threshold: None,
        }
    }
}

fn default_crypto_growth() -> Decimal {
    Decimal::new(15, 2)
}

fn default_investment_scenarios() -> Vec<RateScenario> {
    vec![
        RateScenario::new("pessimistic", Decimal::new(7, 2)),
        RateScenario::new("optimistic", Decimal::new(12, 2)),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementConfig {
    #[serde(default = "default_retirement_rate")]
    pub default_annual_rate: Decimal,

    #[serde(default = "default_retirement_age")]
    pub default_retirement_age: u32,

    #[serde(default = "default_retirement_scenarios")]
    pub scenarios: Vec<RateScenario>,

    /// Owner name to date of birth.
    #[serde(default)]
    pub birth_dates: BTreeMap<String, NaiveDate>,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            default_annual_rate: default_retirement_rate(),
            default_retirement_age: default_retirement_age(),
            scenarios: default_retirement_scenarios(),
            birth_dates: BTreeMap::new(),
        }
    }
}

fn default_retirement_rate() -> Decimal {
    Decimal::new(85, 3)
}

fn default_retirement_age() -> u32 {
    65
}

fn default_retirement_scenarios() -> Vec<RateScenario> {
    vec![
        RateScenario::new("conservative", Decimal::new(7, 2)),
        RateScenario::new("base", Decimal::new(85, 3)),
        RateScenario::new("optimistic", Decimal::new(10, 2)),
    ]
}

/// Inclusive day-of-month range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayWindow(pub u32, pub u32);

impl DayWindow {
    pub fn contains(&self, day: u32) -> bool {
        day >= self.0 && day <= self.1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeConfig {
    /// Days of the month on which an income source of a given frequency may post.
    /// Frequencies without windows are never auto-posted.
    #[serde(default = "default_income_windows")]
    pub windows: BTreeMap<String, Vec<DayWindow>>,
}

impl IncomeConfig {
    pub fn windows_for(&self, freq: Frequency) -> &[DayWindow] {
        self.windows
            .get(freq.as_str())
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for IncomeConfig {
    fn default() -> Self {
        Self {
            windows: default_income_windows(),
        }
    }
}

fn default_income_windows() -> BTreeMap<String, Vec<DayWindow>> {
    BTreeMap::from([
        ("monthly".to_string(), vec![DayWindow(1, 5)]),
        ("biweekly".to_string(), vec![DayWindow(1, 3), DayWindow(14, 17)]),
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: i64,

    /// Percent of budget used at which a warning insight is raised.
    #[serde(default = "default_warning_pct")]
    pub overspend_warning_pct: Decimal,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_hours: default_cache_ttl_hours(),
            overspend_warning_pct: default_warning_pct(),
        }
    }
}

fn default_cache_ttl_hours() -> i64 {
    24
}

fn default_warning_pct() -> Decimal {
    Decimal::from(90)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesConfig {
    #[serde(default = "default_price_endpoint")]
    pub endpoint: String,

    /// Supported ticker symbol to price-feed asset id.
    #[serde(default = "default_price_symbols")]
    pub symbols: BTreeMap<String, String>,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_price_endpoint(),
            symbols: default_price_symbols(),
        }
    }
}

fn default_price_endpoint() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_price_symbols() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("BTC".to_string(), "bitcoin".to_string()),
        ("ETH".to_string(), "ethereum".to_string()),
        ("SOL".to_string(), "solana".to_string()),
    ])
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            lease_seconds: default_lease_seconds(),
        }
    }
}

fn default_lease_seconds() -> i64 {
    300
}
