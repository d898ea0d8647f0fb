// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Structured assistant output: the value objects extracted from a request,
//! the response envelope for one turn, and the per-session conversation context.

pub mod classification;
pub mod context;
pub mod expense;
pub mod response;

pub use classification::{AlternativeCategory, ClassificationDraft, ClassificationResult};
pub use context::{ChatMessage, ConversationContext, Role};
pub use expense::{ExpenseData, ExpenseDraft};
pub use response::{AssistantResponse, ErrorResponse, ResponseData, ResponseDraft};

use crate::vocab::closed_vocabulary;

closed_vocabulary! {
    /// What the assistant decided to do with the user's input.
    pub enum ActionType {
        CreateExpense => "create_expense",
        ListExpenses => "list_expenses",
        UpdateExpense => "update_expense",
        DeleteExpense => "delete_expense",
        CreateCategory => "create_category",
        ListCategories => "list_categories",
        UpdateCategory => "update_category",
        DeleteCategory => "delete_category",
        ClassifyExpense => "classify_expense",
        GetSummary => "get_summary",
        Help => "help",
        Unclear => "unclear",
    }
}

closed_vocabulary! {
    /// Coarse certainty, separate from any numeric score.
    pub enum ConfidenceLevel {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::Medium
    }
}
