// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfidenceLevel;
use crate::error::{ValidationError, ValidationResult, check_len, trimmed};
use crate::models::{Currency, PaymentMethod};
use crate::utils::{parse_timestamp, timestamp};
use crate::vocab::parse_optional;

pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_NOTES_LEN: usize = 1000;

/// Expense fields as extracted, before validation. Vocabulary values and the
/// timestamp are still plain strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExpenseDraft {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub category_name: Option<String>,
    pub payment_method: Option<String>,
    pub expense_date: Option<String>,
    pub notes: Option<String>,
    pub user_name: Option<String>,
    pub confidence: Option<String>,
}

/// Validated expense details. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseDraft")]
pub struct ExpenseData {
    amount: Option<Decimal>,
    currency: Option<Currency>,
    description: Option<String>,
    category_name: Option<String>,
    payment_method: Option<PaymentMethod>,
    #[serde(with = "timestamp::option")]
    expense_date: Option<DateTime<FixedOffset>>,
    notes: Option<String>,
    user_name: Option<String>,
    confidence: ConfidenceLevel,
}

impl TryFrom<ExpenseDraft> for ExpenseData {
    type Error = ValidationError;

    fn try_from(draft: ExpenseDraft) -> ValidationResult<Self> {
        if let Some(amount) = draft.amount {
            if amount <= Decimal::ZERO {
                return Err(ValidationError::InvalidAmount(amount));
            }
        }
        let currency = parse_optional::<Currency>(draft.currency)?;

        let description = trimmed(draft.description);
        if let Some(d) = &description {
            check_len("description", d, MAX_DESCRIPTION_LEN)?;
        }

        let payment_method = parse_optional::<PaymentMethod>(draft.payment_method)?;

        let expense_date = match trimmed(draft.expense_date) {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        let notes = trimmed(draft.notes);
        if let Some(n) = &notes {
            check_len("notes", n, MAX_NOTES_LEN)?;
        }

        let confidence = parse_optional::<ConfidenceLevel>(draft.confidence)?.unwrap_or_default();

        Ok(ExpenseData {
            amount: draft.amount,
            currency,
            description,
            category_name: trimmed(draft.category_name),
            payment_method,
            expense_date,
            notes,
            user_name: trimmed(draft.user_name),
            confidence,
        })
    }
}

impl ExpenseData {
    /// Validates a JSON record of extracted fields.
    pub fn from_record(record: serde_json::Value) -> ValidationResult<Self> {
        let draft: ExpenseDraft = serde_json::from_value(record)?;
        Self::try_from(draft)
    }

    pub fn to_record(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category_name.as_deref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn expense_date(&self) -> Option<DateTime<FixedOffset>> {
        self.expense_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    /// Copy with absent user, currency or category taken from the given
    /// fallbacks. Fields already present are never replaced.
    pub fn fill_missing(
        &self,
        user_name: Option<&str>,
        currency: Option<Currency>,
        category_name: Option<&str>,
    ) -> ExpenseData {
        let fallback = |v: Option<&str>| trimmed(v.map(str::to_string));
        let mut filled = self.clone();
        if filled.user_name.is_none() {
            filled.user_name = fallback(user_name);
        }
        if filled.currency.is_none() {
            filled.currency = currency;
        }
        if filled.category_name.is_none() {
            filled.category_name = fallback(category_name);
        }
        filled
    }
}
