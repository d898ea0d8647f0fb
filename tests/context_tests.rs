// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use expenses_agent::assistant::{ActionType, AssistantResponse, ConversationContext, ExpenseData, Role};
use expenses_agent::error::ValidationError;
use expenses_agent::models::Currency;
use serde_json::json;

#[test]
fn history_keeps_last_ten_in_order() {
    let mut ctx = ConversationContext::new(Some("ana"));
    for i in 0..12 {
        ctx.add_message(Role::User, &format!("msg {}", i));
    }
    let contents: Vec<&str> = ctx.history().iter().map(|m| m.content.as_str()).collect();
    let expected: Vec<String> = (2..12).map(|i| format!("msg {}", i)).collect();
    assert_eq!(contents, expected);

    let recent: Vec<&str> = ctx.recent_messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(recent, ["msg 7", "msg 8", "msg 9", "msg 10", "msg 11"]);
}

#[test]
fn recent_messages_returns_what_exists() {
    let mut ctx = ConversationContext::default();
    assert!(ctx.get_recent_messages(5).is_empty());

    ctx.add_message(Role::User, "a");
    ctx.add_message(Role::Assistant, "b");
    ctx.add_message(Role::User, "c");
    let recent: Vec<&str> = ctx
        .get_recent_messages(5)
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(recent, ["a", "b", "c"]);

    let last_two: Vec<&str> = ctx
        .get_recent_messages(2)
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(last_two, ["b", "c"]);
    assert!(ctx.get_recent_messages(0).is_empty());
}

#[test]
fn malformed_history_entry_rejects_whole_list() {
    let mut ctx = ConversationContext::default();
    ctx.add_message(Role::User, "keep me");

    let err = ctx
        .set_history(vec![
            json!({ "role": "user", "content": "hi" }),
            json!({ "role": "system", "content": "nope" }),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        ValidationError::MalformedListEntry {
            list: "conversation_history",
            index: 1,
            ..
        }
    ));
    assert_eq!(ctx.history().len(), 1);
    assert_eq!(ctx.history()[0].content, "keep me");

    assert!(ctx.set_history(vec![json!({ "role": "user" })]).is_err());
    assert!(ctx.set_history(vec![json!(["user", "hi"])]).is_err());
}

#[test]
fn assigned_history_is_bounded() {
    let entries: Vec<_> = (0..15)
        .map(|i| json!({ "role": "assistant", "content": i.to_string(), "extra": true }))
        .collect();
    let ctx = ConversationContext::from_record(json!({
        "user_name": "ana",
        "conversation_history": entries
    }))
    .unwrap();
    assert_eq!(ctx.history().len(), 10);
    assert_eq!(ctx.history()[0].content, "5");
    assert_eq!(ctx.user_name.as_deref(), Some("ana"));
}

#[test]
fn remember_tracks_last_action_and_expense() {
    let mut ctx = ConversationContext::default();
    let data = ExpenseData::from_record(json!({ "amount": "4.20", "user_name": "bob" })).unwrap();
    let response = AssistantResponse::new(ActionType::CreateExpense, true, "done")
        .unwrap()
        .with_expense_data(data.clone());
    ctx.remember(&response);
    assert_eq!(ctx.last_action, Some(ActionType::CreateExpense));
    assert_eq!(ctx.last_expense_data, Some(data));
    assert_eq!(ctx.user_name.as_deref(), Some("bob"));
}

#[test]
fn default_currency_preference() {
    let mut ctx = ConversationContext::default();
    assert_eq!(ctx.default_currency(), None);
    ctx.set_default_currency(Currency::Jpy);
    assert_eq!(ctx.default_currency(), Some(Currency::Jpy));
    assert_eq!(ctx.preference("default_currency"), Some(&json!("JPY")));

    ctx.set_preference("default_currency", json!("doubloons"));
    assert_eq!(ctx.default_currency(), None);
}
