// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde_json::json;

use crate::assistant::{ExpenseData, ExpenseDraft};
use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::models::{Expense, ExpenseFilter, ExpenseUpdate, NewExpense};
use crate::repo::{CategoryRepository, ExpenseRepository};
use crate::utils::{
    format_timestamp, id_for_category, maybe_print_json, parse_decimal, parse_id, pretty_table,
    required_arg,
};

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("export", sub)) => export(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// Collects expense fields from the command line and runs them through the
/// same validation as assistant-extracted data.
fn expense_data(sub: &clap::ArgMatches) -> Result<ExpenseData> {
    let text = |id: &str| sub.get_one::<String>(id).cloned();
    let amount = match sub.get_one::<String>("amount") {
        Some(raw) => Some(parse_decimal(raw)?),
        None => None,
    };
    let draft = ExpenseDraft {
        amount,
        currency: text("currency").map(|c| c.trim().to_uppercase()),
        description: text("description"),
        category_name: text("category"),
        payment_method: text("method"),
        expense_date: text("date"),
        notes: text("notes"),
        user_name: text("user"),
        confidence: None,
    };
    Ok(ExpenseData::try_from(draft)?)
}

fn add(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let data = expense_data(sub)?.fill_missing(cfg.user(), cfg.default_currency()?, None);

    let category_id = match data.category_name() {
        Some(name) => Some(id_for_category(conn, name)?),
        None => {
            let description = data.description().unwrap_or_default();
            let result = Classifier::new(conn).classify(description)?;
            if let Some(name) = result.category_name() {
                println!(
                    "Classified as '{}' ({})",
                    name,
                    result.reasoning().unwrap_or("no reason given")
                );
            }
            result.category_id()
        }
    };

    let new = NewExpense::from_expense_data(&data, category_id)?;
    let expense = ExpenseRepository::new(conn).create(&new)?;
    println!(
        "Recorded expense {}: {} {} for '{}' ({})",
        expense.id,
        expense.amount,
        expense.currency,
        expense.description,
        expense.user_name
    );
    Ok(())
}

fn list(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(id_for_category(conn, name)?),
        None => None,
    };
    let limit = match sub.get_one::<String>("limit") {
        Some(raw) => Some(
            raw.trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid limit '{}'", raw))?,
        ),
        None => None,
    };
    let filter = ExpenseFilter {
        user_name: sub
            .get_one::<String>("user")
            .map(|s| s.trim().to_string())
            .or_else(|| cfg.user().map(str::to_string)),
        category_id,
        limit,
    };
    let data = ExpenseRepository::new(conn).list(&filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let names = category_names(conn)?;
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    format_timestamp(&e.expense_date),
                    e.user_name.clone(),
                    e.description.clone(),
                    format!("{} {}", e.amount, e.currency),
                    category_label(&names, e),
                    e.payment_method.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "User", "Description", "Amount", "Category", "Method"],
                rows
            )
        );
    }
    Ok(())
}

fn category_names(conn: &Connection) -> Result<Vec<(i64, String)>> {
    Ok(CategoryRepository::new(conn)
        .list(false)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn category_label(names: &[(i64, String)], e: &Expense) -> String {
    e.category_id
        .and_then(|id| names.iter().find(|(cid, _)| *cid == id))
        .map(|(_, name)| name.clone())
        .unwrap_or_default()
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required_arg(sub, "id")?)?;
    let data = expense_data(sub)?;
    let category_id = match data.category_name() {
        Some(name) => Some(id_for_category(conn, name)?),
        None => None,
    };
    let changes = ExpenseUpdate::from_expense_data(&data, category_id);
    if changes.is_empty() {
        bail!("Nothing to update for expense {}", id);
    }
    match ExpenseRepository::new(conn).update(id, &changes)? {
        Some(e) => println!("Updated expense {}: {} {} for '{}'", e.id, e.amount, e.currency, e.description),
        None => bail!("Expense {} not found", id),
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required_arg(sub, "id")?)?;
    if !ExpenseRepository::new(conn).delete(id)? {
        bail!("Expense {} not found", id);
    }
    println!("Removed expense {}", id);
    Ok(())
}

fn export(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required_arg(sub, "format")?.trim().to_lowercase();
    let out = required_arg(sub, "out")?.trim();
    let filter = ExpenseFilter {
        user_name: sub
            .get_one::<String>("user")
            .map(|s| s.trim().to_string())
            .or_else(|| cfg.user().map(str::to_string)),
        ..Default::default()
    };
    let expenses = ExpenseRepository::new(conn).list(&filter)?;
    let names = category_names(conn)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "expense_date",
                "user_name",
                "description",
                "amount",
                "currency",
                "category",
                "payment_method",
                "notes",
            ])?;
            for e in &expenses {
                wtr.write_record([
                    e.id.to_string(),
                    format_timestamp(&e.expense_date),
                    e.user_name.clone(),
                    e.description.clone(),
                    e.amount.to_string(),
                    e.currency.to_string(),
                    category_label(&names, e),
                    e.payment_method.to_string(),
                    e.notes.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<serde_json::Value> = expenses
                .iter()
                .map(|e| {
                    let mut v = json!(e);
                    v["category"] = json!(e.category_id.map(|_| category_label(&names, e)));
                    v
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported {} expenses to {}", expenses.len(), out);
    Ok(())
}
