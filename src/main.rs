// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use expenses_agent::{cli, commands, config::AppConfig, db};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = AppConfig::load()?;
    let conn = db::open_or_init(&cfg)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path(&cfg)?.display());
        }
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&conn, &cfg, sub)?,
        Some(("rules", sub)) => commands::rules::handle(&conn, sub)?,
        Some(("classify", sub)) => commands::classify::handle(&conn, sub)?,
        Some(("summary", sub)) => commands::summary::handle(&conn, &cfg, sub)?,
        Some(("validate", sub)) => commands::validate::handle(sub)?,
        Some(("session", sub)) => commands::session::handle(&conn, &cfg, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
