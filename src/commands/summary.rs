// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::AppConfig;
use crate::repo::ExpenseRepository;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    let user = m
        .get_one::<String>("user")
        .map(|s| s.trim().to_string())
        .or_else(|| cfg.user().map(str::to_string));
    let summary = ExpenseRepository::new(conn).summary(user.as_deref())?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &summary)? {
        return Ok(());
    }

    let data: Vec<Vec<String>> = summary
        .totals
        .iter()
        .map(|t| vec![t.currency.to_string(), format!("{:.2}", t.total), t.count.to_string()])
        .collect();
    println!("{}", pretty_table(&["Currency", "Total", "Expenses"], data));
    println!(
        "{} expenses{}",
        summary.expense_count,
        user.map(|u| format!(" for {}", u)).unwrap_or_default()
    );
    Ok(())
}
