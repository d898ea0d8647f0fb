// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Validation errors raised while turning loosely-typed records into value objects.
//!
//! Every error is local to one value object. Nothing here is retried or
//! recovered; the orchestrator decides how a failure is shown to the user.

use rust_decimal::Decimal;
use thiserror::Error;

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("amount must be greater than 0, got {0}")]
    InvalidAmount(Decimal),

    #[error("invalid {kind} value '{value}' (expected one of: {expected})")]
    InvalidEnumValue {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("{field} must be between 0 and 1, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{list} entry {index} is malformed: {reason}")]
    MalformedListEntry {
        list: &'static str,
        index: usize,
        reason: String,
    },

    #[error("clarification is required but no questions were provided")]
    InconsistentClarificationState,

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("{field} exceeds {max} characters ({len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("invalid timestamp '{0}', expected ISO-8601 such as 2024-01-01T12:00:00")]
    InvalidTimestamp(String),

    #[error("payload does not match action {action}: {reason}")]
    PayloadMismatch { action: &'static str, reason: String },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingField(Vec<&'static str>),
}

impl ValidationError {
    /// Stable machine-readable code, used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount(_) => "invalid_amount",
            ValidationError::InvalidEnumValue { .. } => "invalid_enum_value",
            ValidationError::OutOfRange { .. } => "out_of_range",
            ValidationError::MalformedListEntry { .. } => "malformed_list_entry",
            ValidationError::InconsistentClarificationState => "inconsistent_clarification_state",
            ValidationError::EmptyMessage => "empty_message",
            ValidationError::TooLong { .. } => "too_long",
            ValidationError::InvalidTimestamp(_) => "invalid_timestamp",
            ValidationError::PayloadMismatch { .. } => "payload_mismatch",
            ValidationError::MalformedRecord(_) => "malformed_record",
            ValidationError::MissingField(_) => "missing_field",
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::MalformedRecord(err.to_string())
    }
}

/// Checks a character cap without truncating.
pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    Ok(())
}

/// Trims a free-text field; whitespace-only input counts as not provided.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
