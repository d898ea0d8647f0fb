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
use tracing::info;

use crate::config::AppConfig;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "ExpensesAgent", "expenses-agent"));

pub fn db_path(cfg: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = cfg.db_path() {
        return Ok(PathBuf::from(path));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("expenses.sqlite"))
}

/// Opens the configured database, creating tables that do not exist yet.
pub fn open_or_init(cfg: &AppConfig) -> Result<Connection> {
    let path = db_path(cfg)?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL,
        color_code TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_name TEXT NOT NULL,
        category_id INTEGER,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        description TEXT NOT NULL,
        expense_date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        payment_method TEXT NOT NULL DEFAULT 'Other',
        notes TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_user ON expenses(user_name);
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date);

    -- Classification rules: a regex over the description selects a category
    CREATE TABLE IF NOT EXISTS rules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pattern TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
