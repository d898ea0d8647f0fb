// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ActionType, AssistantResponse, ExpenseData, ExpenseDraft};
use crate::error::{ValidationError, ValidationResult, trimmed};
use crate::models::Currency;
use crate::vocab::{closed_vocabulary, parse_optional};

/// History is a sliding window over the most recent messages.
pub const MAX_HISTORY: usize = 10;
pub const DEFAULT_RECENT_MESSAGES: usize = 5;

const HISTORY: &str = "conversation_history";
const DEFAULT_CURRENCY_KEY: &str = "default_currency";

closed_vocabulary! {
    pub enum Role {
        User => "user",
        Assistant => "assistant",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A context record as received; history entries are still raw JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextDraft {
    pub user_name: Option<String>,
    pub last_expense_data: Option<ExpenseDraft>,
    pub last_action: Option<String>,
    pub conversation_history: Vec<Value>,
    pub user_preferences: BTreeMap<String, Value>,
}

/// Per-session conversation state. In memory only; one instance per conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContextDraft")]
pub struct ConversationContext {
    pub user_name: Option<String>,
    pub last_expense_data: Option<ExpenseData>,
    pub last_action: Option<ActionType>,
    conversation_history: Vec<ChatMessage>,
    pub user_preferences: BTreeMap<String, Value>,
}

fn malformed(index: usize, reason: &str) -> ValidationError {
    ValidationError::MalformedListEntry {
        list: HISTORY,
        index,
        reason: reason.to_string(),
    }
}

fn parse_history(entries: Vec<Value>) -> ValidationResult<Vec<ChatMessage>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let map = entry
                .as_object()
                .ok_or_else(|| malformed(index, "expected a mapping"))?;
            let (Some(role), Some(content)) = (map.get("role"), map.get("content")) else {
                return Err(malformed(index, "must have \"role\" and \"content\""));
            };
            let (Some(role), Some(content)) = (role.as_str(), content.as_str()) else {
                return Err(malformed(index, "\"role\" and \"content\" must be strings"));
            };
            let role = role
                .parse::<Role>()
                .map_err(|_| malformed(index, "role must be either \"user\" or \"assistant\""))?;
            Ok(ChatMessage {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

impl TryFrom<ContextDraft> for ConversationContext {
    type Error = ValidationError;

    fn try_from(draft: ContextDraft) -> ValidationResult<Self> {
        let mut context = ConversationContext {
            user_name: trimmed(draft.user_name),
            last_expense_data: draft
                .last_expense_data
                .map(ExpenseData::try_from)
                .transpose()?,
            last_action: parse_optional::<ActionType>(draft.last_action)?,
            conversation_history: Vec::new(),
            user_preferences: draft.user_preferences,
        };
        context.set_history(draft.conversation_history)?;
        Ok(context)
    }
}

impl ConversationContext {
    pub fn new(user_name: Option<&str>) -> Self {
        ConversationContext {
            user_name: trimmed(user_name.map(str::to_string)),
            ..Default::default()
        }
    }

    pub fn from_record(record: Value) -> ValidationResult<Self> {
        let draft: ContextDraft = serde_json::from_value(record)?;
        Self::try_from(draft)
    }

    /// Appends a message, dropping the oldest entries beyond `MAX_HISTORY`.
    pub fn add_message(&mut self, role: Role, content: &str) {
        self.conversation_history.push(ChatMessage {
            role,
            content: content.to_string(),
        });
        let len = self.conversation_history.len();
        if len > MAX_HISTORY {
            self.conversation_history.drain(..len - MAX_HISTORY);
        }
    }

    /// The last `count` messages in order, or all of them if there are fewer.
    pub fn get_recent_messages(&self, count: usize) -> &[ChatMessage] {
        let start = self.conversation_history.len().saturating_sub(count);
        &self.conversation_history[start..]
    }

    /// The last `DEFAULT_RECENT_MESSAGES` messages.
    pub fn recent_messages(&self) -> &[ChatMessage] {
        self.get_recent_messages(DEFAULT_RECENT_MESSAGES)
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.conversation_history
    }

    /// Replaces the history from raw entries. Any malformed entry rejects the
    /// whole list and leaves the current history untouched.
    pub fn set_history(&mut self, entries: Vec<Value>) -> ValidationResult<()> {
        let mut history = parse_history(entries)?;
        let len = history.len();
        if len > MAX_HISTORY {
            history.drain(..len - MAX_HISTORY);
        }
        self.conversation_history = history;
        Ok(())
    }

    /// Records what a finished turn did.
    pub fn remember(&mut self, response: &AssistantResponse) {
        self.last_action = Some(response.action());
        if let Some(data) = response.expense_data() {
            self.last_expense_data = Some(data.clone());
            if self.user_name.is_none() {
                self.user_name = data.user_name().map(str::to_string);
            }
        }
    }

    pub fn preference(&self, key: &str) -> Option<&Value> {
        self.user_preferences.get(key)
    }

    pub fn set_preference(&mut self, key: &str, value: Value) {
        self.user_preferences.insert(key.to_string(), value);
    }

    /// The "default_currency" preference, if set to a supported currency.
    pub fn default_currency(&self) -> Option<Currency> {
        self.preference(DEFAULT_CURRENCY_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.trim().parse().ok())
    }

    pub fn set_default_currency(&mut self, currency: Currency) {
        self.set_preference(DEFAULT_CURRENCY_KEY, Value::from(currency.as_str()));
    }
}
