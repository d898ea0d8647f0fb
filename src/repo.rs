// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CRUD over the `categories` and `expenses` tables.
//!
//! Repositories borrow a connection owned by the caller; one connection is
//! opened per process and handed to whoever needs it.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::models::{
    Category, CategoryUpdate, Currency, CurrencyTotal, Expense, ExpenseFilter, ExpenseSummary,
    ExpenseUpdate, NewCategory, NewExpense, PaymentMethod,
};
use crate::utils::{format_timestamp, now_utc, parse_timestamp};

const CATEGORY_COLUMNS: &str = "id, name, description, color_code, is_active, created_at";
const EXPENSE_COLUMNS: &str = "id, user_name, category_id, amount, currency, description, expense_date, created_at, payment_method, notes";

struct CategoryRow {
    id: i64,
    name: String,
    description: String,
    color_code: String,
    is_active: bool,
    created_at: String,
}

fn read_category(r: &Row) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        color_code: r.get(3)?,
        is_active: r.get(4)?,
        created_at: r.get(5)?,
    })
}

impl CategoryRow {
    fn into_category(self) -> Result<Category> {
        let created_at = parse_timestamp(&self.created_at)
            .with_context(|| format!("Invalid created_at for category {}", self.id))?;
        Ok(Category {
            id: self.id,
            name: self.name,
            description: self.description,
            color_code: self.color_code,
            is_active: self.is_active,
            created_at,
        })
    }
}

struct ExpenseRow {
    id: i64,
    user_name: String,
    category_id: Option<i64>,
    amount: String,
    currency: Currency,
    description: String,
    expense_date: String,
    created_at: String,
    payment_method: PaymentMethod,
    notes: String,
}

fn read_expense(r: &Row) -> rusqlite::Result<ExpenseRow> {
    Ok(ExpenseRow {
        id: r.get(0)?,
        user_name: r.get(1)?,
        category_id: r.get(2)?,
        amount: r.get(3)?,
        currency: r.get(4)?,
        description: r.get(5)?,
        expense_date: r.get(6)?,
        created_at: r.get(7)?,
        payment_method: r.get(8)?,
        notes: r.get(9)?,
    })
}

impl ExpenseRow {
    fn into_expense(self) -> Result<Expense> {
        let amount = self
            .amount
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' for expense {}", self.amount, self.id))?;
        let expense_date = parse_timestamp(&self.expense_date)
            .with_context(|| format!("Invalid expense_date for expense {}", self.id))?;
        let created_at = parse_timestamp(&self.created_at)
            .with_context(|| format!("Invalid created_at for expense {}", self.id))?;
        Ok(Expense {
            id: self.id,
            user_name: self.user_name,
            category_id: self.category_id,
            amount,
            currency: self.currency,
            description: self.description,
            expense_date,
            created_at,
            payment_method: self.payment_method,
            notes: self.notes,
        })
    }
}

pub struct CategoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        CategoryRepository { conn }
    }

    pub fn create(&self, new: &NewCategory) -> Result<Category> {
        new.validate()?;
        let name = new.name.trim();
        self.conn
            .execute(
                "INSERT INTO categories(name, description, color_code, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    name,
                    new.description.trim(),
                    new.color_code.trim(),
                    new.is_active,
                    format_timestamp(&now_utc()),
                ],
            )
            .with_context(|| format!("Failed to create category '{}'", name))?;
        let id = self.conn.last_insert_rowid();
        info!(id, name, "created category");
        self.get_by_id(id)?
            .with_context(|| format!("Category {} missing after insert", id))
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id=?1", CATEGORY_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], read_category)
            .optional()?;
        if row.is_some() {
            debug!(id, "retrieved category");
        }
        row.map(CategoryRow::into_category).transpose()
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE name=?1", CATEGORY_COLUMNS);
        self.conn
            .query_row(&sql, params![name.trim()], read_category)
            .optional()?
            .map(CategoryRow::into_category)
            .transpose()
    }

    pub fn list(&self, active_only: bool) -> Result<Vec<Category>> {
        let mut sql = format!("SELECT {} FROM categories", CATEGORY_COLUMNS);
        if active_only {
            sql.push_str(" WHERE is_active=1");
        }
        sql.push_str(" ORDER BY name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_category)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?.into_category()?);
        }
        debug!(count = data.len(), active_only, "retrieved categories");
        Ok(data)
    }

    /// Applies `changes`; `None` when no category has this id.
    pub fn update(&self, id: i64, changes: &CategoryUpdate) -> Result<Option<Category>> {
        changes.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let Some(mut category) = self.get_by_id(id)? else {
            warn!(id, "category not found for update");
            return Ok(None);
        };
        changes.apply(&mut category);
        tx.execute(
            "UPDATE categories SET name=?1, description=?2, color_code=?3, is_active=?4 WHERE id=?5",
            params![
                category.name,
                category.description,
                category.color_code,
                category.is_active,
                id
            ],
        )
        .with_context(|| format!("Failed to update category {}", id))?;
        tx.commit()?;
        info!(id, name = %category.name, "updated category");
        Ok(Some(category))
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM categories WHERE id=?1", params![id])?;
        if n == 0 {
            warn!(id, "category not found for deletion");
            return Ok(false);
        }
        info!(id, "deleted category");
        Ok(true)
    }
}

pub struct ExpenseRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        ExpenseRepository { conn }
    }

    pub fn create(&self, new: &NewExpense) -> Result<Expense> {
        if new.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(new.amount).into());
        }
        if new.user_name.trim().is_empty() || new.description.trim().is_empty() {
            let mut missing = Vec::new();
            if new.user_name.trim().is_empty() {
                missing.push("user_name");
            }
            if new.description.trim().is_empty() {
                missing.push("description");
            }
            return Err(ValidationError::MissingField(missing).into());
        }
        let now = now_utc();
        let expense_date = new.expense_date.unwrap_or(now);
        self.conn
            .execute(
                "INSERT INTO expenses(user_name, category_id, amount, currency, description,
                                      expense_date, created_at, payment_method, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new.user_name.trim(),
                    new.category_id,
                    new.amount.to_string(),
                    new.currency,
                    new.description.trim(),
                    format_timestamp(&expense_date),
                    format_timestamp(&now),
                    new.payment_method,
                    new.notes,
                ],
            )
            .context("Failed to create expense")?;
        let id = self.conn.last_insert_rowid();
        info!(id, description = %new.description, amount = %new.amount, currency = %new.currency, "created expense");
        self.get_by_id(id)?
            .with_context(|| format!("Expense {} missing after insert", id))
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Expense>> {
        let sql = format!("SELECT {} FROM expenses WHERE id=?1", EXPENSE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], read_expense)
            .optional()?;
        if row.is_some() {
            debug!(id, "retrieved expense");
        }
        row.map(ExpenseRow::into_expense).transpose()
    }

    /// Most recent first.
    pub fn list(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut sql = format!("SELECT {} FROM expenses WHERE 1=1", EXPENSE_COLUMNS);
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(user) = filter.user_name.as_deref().map(str::trim) {
            sql.push_str(" AND user_name=?");
            values.push(SqlValue::Text(user.to_string()));
        }
        if let Some(cat) = filter.category_id {
            sql.push_str(" AND category_id=?");
            values.push(SqlValue::Integer(cat));
        }
        // Stored dates keep their offset, so text order is not time order.
        sql.push_str(" ORDER BY julianday(expense_date) DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(SqlValue::Integer(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), read_expense)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?.into_expense()?);
        }
        debug!(count = data.len(), "retrieved expenses");
        Ok(data)
    }

    pub fn list_by_user(&self, user_name: &str) -> Result<Vec<Expense>> {
        self.list(&ExpenseFilter {
            user_name: Some(user_name.to_string()),
            ..Default::default()
        })
    }

    pub fn list_by_category(&self, category_id: i64) -> Result<Vec<Expense>> {
        self.list(&ExpenseFilter {
            category_id: Some(category_id),
            ..Default::default()
        })
    }

    /// Applies `changes`; `None` when no expense has this id.
    pub fn update(&self, id: i64, changes: &ExpenseUpdate) -> Result<Option<Expense>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(mut expense) = self.get_by_id(id)? else {
            warn!(id, "expense not found for update");
            return Ok(None);
        };
        changes.apply(&mut expense)?;
        tx.execute(
            "UPDATE expenses SET user_name=?1, category_id=?2, amount=?3, currency=?4,
                    description=?5, expense_date=?6, payment_method=?7, notes=?8
             WHERE id=?9",
            params![
                expense.user_name,
                expense.category_id,
                expense.amount.to_string(),
                expense.currency,
                expense.description,
                format_timestamp(&expense.expense_date),
                expense.payment_method,
                expense.notes,
                id
            ],
        )
        .with_context(|| format!("Failed to update expense {}", id))?;
        tx.commit()?;
        info!(id, description = %expense.description, "updated expense");
        Ok(Some(expense))
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM expenses WHERE id=?1", params![id])?;
        if n == 0 {
            warn!(id, "expense not found for deletion");
            return Ok(false);
        }
        info!(id, "deleted expense");
        Ok(true)
    }

    /// Totals per currency, optionally for one user.
    pub fn summary(&self, user_name: Option<&str>) -> Result<ExpenseSummary> {
        let expenses = self.list(&ExpenseFilter {
            user_name: user_name.map(str::to_string),
            ..Default::default()
        })?;
        let mut totals: BTreeMap<Currency, (Decimal, usize)> = BTreeMap::new();
        for e in &expenses {
            let entry = totals.entry(e.currency).or_insert((Decimal::ZERO, 0));
            entry.0 = entry
                .0
                .checked_add(e.amount)
                .with_context(|| format!("Total for {} overflows", e.currency))?;
            entry.1 += 1;
        }
        Ok(ExpenseSummary {
            user_name: user_name.map(str::to_string),
            expense_count: expenses.len(),
            totals: totals
                .into_iter()
                .map(|(currency, (total, count))| CurrencyTotal {
                    currency,
                    total,
                    count,
                })
                .collect(),
        })
    }
}
