// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assistant::ExpenseData;
use crate::error::{ValidationError, ValidationResult, check_len};
use crate::utils::timestamp;
use crate::vocab::closed_vocabulary;

closed_vocabulary! {
    /// How an expense was paid.
    pub enum PaymentMethod {
        CreditCard => "Credit Card",
        DebitCard => "Debit Card",
        Cash => "Cash",
        BankTransfer => "Bank Transfer",
        MobilePayment => "Mobile Payment",
        Check => "Check",
        Other => "Other",
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Other
    }
}

closed_vocabulary! {
    /// Supported ISO 4217 currencies.
    pub enum Currency {
        Usd => "USD",
        Eur => "EUR",
        Gbp => "GBP",
        Jpy => "JPY",
        Aud => "AUD",
        Cad => "CAD",
        Chf => "CHF",
        Cny => "CNY",
        Sek => "SEK",
        Nzd => "NZD",
    }
}

pub const MAX_CATEGORY_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color_code: String,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub color_code: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl NewCategory {
    pub fn new(name: &str, description: &str, color_code: &str) -> Self {
        NewCategory {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            color_code: color_code.trim().to_string(),
            is_active: true,
        }
    }

    /// Required fields must be present and not blank; the name is capped at
    /// `MAX_CATEGORY_NAME_LEN` characters.
    pub fn validate(&self) -> ValidationResult<()> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("description", &self.description),
            ("color_code", &self.color_code),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingField(missing));
        }
        check_len("name", self.name.trim(), MAX_CATEGORY_NAME_LEN)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color_code.is_none()
            && self.is_active.is_none()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        match self.name.as_deref() {
            Some(name) => check_len("name", name.trim(), MAX_CATEGORY_NAME_LEN),
            None => Ok(()),
        }
    }

    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            category.name = name.to_string();
        }
        if let Some(description) = &self.description {
            category.description = description.trim().to_string();
        }
        if let Some(color) = &self.color_code {
            category.color_code = color.trim().to_string();
        }
        if let Some(active) = self.is_active {
            category.is_active = active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_name: String,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: String,
    #[serde(with = "timestamp")]
    pub expense_date: DateTime<FixedOffset>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<FixedOffset>,
    pub payment_method: PaymentMethod,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub user_name: String,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: String,
    pub expense_date: Option<DateTime<FixedOffset>>,
    pub payment_method: PaymentMethod,
    pub notes: String,
}

impl NewExpense {
    /// Builds an insertable expense from validated data. User name, amount,
    /// currency and description are required; the rest take defaults.
    pub fn from_expense_data(data: &ExpenseData, category_id: Option<i64>) -> ValidationResult<Self> {
        let mut missing = Vec::new();
        if data.user_name().is_none() {
            missing.push("user_name");
        }
        if data.amount().is_none() {
            missing.push("amount");
        }
        if data.currency().is_none() {
            missing.push("currency");
        }
        if data.description().is_none() {
            missing.push("description");
        }
        match (data.user_name(), data.amount(), data.currency(), data.description()) {
            (Some(user), Some(amount), Some(currency), Some(description)) => Ok(NewExpense {
                user_name: user.to_string(),
                category_id,
                amount,
                currency,
                description: description.to_string(),
                expense_date: data.expense_date(),
                payment_method: data.payment_method().unwrap_or_default(),
                notes: data.notes().unwrap_or_default().to_string(),
            }),
            _ => Err(ValidationError::MissingField(missing)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub user_name: Option<String>,
    pub category_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub description: Option<String>,
    pub expense_date: Option<DateTime<FixedOffset>>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl ExpenseUpdate {
    /// Every field present in `data` becomes a change.
    pub fn from_expense_data(data: &ExpenseData, category_id: Option<i64>) -> Self {
        ExpenseUpdate {
            user_name: data.user_name().map(str::to_string),
            category_id,
            amount: data.amount(),
            currency: data.currency(),
            description: data.description().map(str::to_string),
            expense_date: data.expense_date(),
            payment_method: data.payment_method(),
            notes: data.notes().map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ExpenseUpdate::default()
    }

    pub fn apply(&self, expense: &mut Expense) -> ValidationResult<()> {
        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                return Err(ValidationError::InvalidAmount(amount));
            }
            expense.amount = amount;
        }
        if let Some(user) = &self.user_name {
            expense.user_name = user.clone();
        }
        if self.category_id.is_some() {
            expense.category_id = self.category_id;
        }
        if let Some(currency) = self.currency {
            expense.currency = currency;
        }
        if let Some(description) = &self.description {
            expense.description = description.clone();
        }
        if let Some(date) = self.expense_date {
            expense.expense_date = date;
        }
        if let Some(method) = self.payment_method {
            expense.payment_method = method;
        }
        if let Some(notes) = &self.notes {
            expense.notes = notes.clone();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub user_name: Option<String>,
    pub category_id: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub user_name: Option<String>,
    pub expense_count: usize,
    pub totals: Vec<CurrencyTotal>,
}
