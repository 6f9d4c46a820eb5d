// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use clap::parser::ValueSource;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use finboard::config::Config;
use finboard::{access, cli, commands, db};

fn init_tracing(matches: &clap::ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    // RUST_LOG applies unless --log-level was given explicitly
    let filter = match matches.value_source("log-level") {
        Some(ValueSource::CommandLine) => EnvFilter::try_new(level),
        _ => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level)),
    }
    .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_tracing(&matches);

    let cfg = Config::load(matches.get_one::<String>("config").map(PathBuf::from).as_deref())?;
    let user = matches
        .get_one::<String>("user")
        .cloned()
        .or_else(|| std::env::var("FINBOARD_USER").ok());
    access::ensure_allowed(&cfg.access, user.as_deref())?;

    let mut conn = db::open_or_init()?;
    debug!(home_currency = %cfg.home_currency, "database ready");

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, &cfg, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&conn, &cfg, sub)?,
        Some(("income", sub)) => commands::recurring::handle_income(&conn, &cfg, sub)?,
        Some(("msi", sub)) => commands::recurring::handle_msi(&conn, &cfg, sub)?,
        Some(("sweep", sub)) => commands::sweep::handle(&mut conn, &cfg, sub)?,
        Some(("target", sub)) => commands::target::handle(&mut conn, &cfg, sub)?,
        Some(("debt", sub)) => commands::target::handle_debt(&conn, &cfg, sub)?,
        Some(("projection", sub)) => commands::target::projection(&conn, &cfg, sub)?,
        Some(("retirement", sub)) => commands::retirement::handle(&conn, &cfg, sub)?,
        Some(("holdings", sub)) => commands::holdings::handle(&conn, &cfg, sub)?,
        Some(("insights", sub)) => commands::insights::handle(&conn, &cfg, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, &cfg, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
