// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use expenses_agent::assistant::{
    ActionType, AssistantResponse, ConfidenceLevel, ErrorResponse, ResponseData, ResponseDraft,
};
use expenses_agent::error::ValidationError;
use serde_json::json;

#[test]
fn clarification_without_questions_is_inconsistent() {
    let err = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": false,
        "message": "Need more info",
        "requires_clarification": true,
        "clarification_questions": []
    }))
    .unwrap_err();
    assert_eq!(err, ValidationError::InconsistentClarificationState);
}

#[test]
fn clarification_state_is_checked_before_fields() {
    let err = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": "no",
        "message": "Need more info",
        "expense_data": { "amount": "abc" },
        "requires_clarification": true,
        "clarification_questions": []
    }))
    .unwrap_err();
    assert_eq!(err, ValidationError::InconsistentClarificationState);

    let err = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": false,
        "message": "Need more info",
        "requires_clarification": true
    }))
    .unwrap_err();
    assert_eq!(err, ValidationError::InconsistentClarificationState);
}

#[test]
fn questions_force_clarification_on() {
    let response = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": false,
        "message": "Which category?",
        "requires_clarification": false,
        "clarification_questions": ["What category?"]
    }))
    .unwrap();
    assert!(response.requires_clarification());
    assert_eq!(response.clarification_questions(), &["What category?".to_string()]);
}

#[test]
fn blank_questions_are_dropped_after_reconcile() {
    let mut draft = ResponseDraft::new(ActionType::Unclear, false, "Hmm?");
    draft.clarification_questions = vec!["  ".into(), " What now? ".into()];
    let response = AssistantResponse::try_from(draft).unwrap();
    assert!(response.requires_clarification());
    assert_eq!(response.clarification_questions(), &["What now?".to_string()]);
}

#[test]
fn message_is_trimmed_and_bounded() {
    let response = AssistantResponse::new(ActionType::Help, true, "  hi there  ").unwrap();
    assert_eq!(response.message(), "hi there");

    assert_eq!(
        AssistantResponse::new(ActionType::Help, true, "   ").unwrap_err(),
        ValidationError::EmptyMessage
    );
    assert!(matches!(
        AssistantResponse::new(ActionType::Help, true, &"m".repeat(2001)).unwrap_err(),
        ValidationError::TooLong { field: "message", .. }
    ));
    assert!(AssistantResponse::new(ActionType::Help, true, &"m".repeat(2000)).is_ok());
}

#[test]
fn unknown_action_is_rejected() {
    let err = AssistantResponse::from_record(json!({
        "action": "book_flight",
        "success": true,
        "message": "ok"
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ValidationError::InvalidEnumValue { kind: "ActionType", .. }
    ));
}

#[test]
fn nested_records_are_validated() {
    let err = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": true,
        "message": "ok",
        "expense_data": { "amount": "-3" }
    }))
    .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidAmount(_)));

    let err = AssistantResponse::from_record(json!({
        "action": "classify_expense",
        "success": true,
        "message": "ok",
        "classification_result": { "confidence": "high", "confidence_score": 2.0 }
    }))
    .unwrap_err();
    assert!(matches!(err, ValidationError::OutOfRange { .. }));
}

#[test]
fn confidence_defaults_to_medium() {
    let response = AssistantResponse::from_record(json!({
        "action": "help",
        "success": true,
        "message": "Here you go"
    }))
    .unwrap();
    assert_eq!(response.confidence(), ConfidenceLevel::Medium);
}

#[test]
fn payload_shape_follows_action() {
    let response = AssistantResponse::from_record(json!({
        "action": "delete_expense",
        "success": true,
        "message": "Deleting",
        "data": { "id": 7 }
    }))
    .unwrap();
    assert_eq!(response.data(), Some(&ResponseData::Reference { id: 7 }));

    let response = AssistantResponse::from_record(json!({
        "action": "create_category",
        "success": true,
        "message": "Adding",
        "data": { "name": "Pets", "description": "Vet and food", "color_code": "#AA00AA" }
    }))
    .unwrap();
    assert!(matches!(response.data(), Some(ResponseData::NewCategory(n)) if n.is_active));

    let err = AssistantResponse::from_record(json!({
        "action": "classify_expense",
        "success": true,
        "message": "ok",
        "data": { "id": 1 }
    }))
    .unwrap_err();
    assert!(matches!(err, ValidationError::PayloadMismatch { action: "classify_expense", .. }));

    let err = AssistantResponse::from_record(json!({
        "action": "delete_category",
        "success": true,
        "message": "ok",
        "data": { "name": "Food" }
    }))
    .unwrap_err();
    assert!(matches!(err, ValidationError::PayloadMismatch { .. }));
}

#[test]
fn with_data_rejects_payloads_for_other_actions() {
    let response = AssistantResponse::new(ActionType::Help, true, "ok").unwrap();
    assert!(response.with_data(ResponseData::Reference { id: 1 }).is_err());
}

#[test]
fn validation_errors_become_clarifications() {
    let err = ValidationError::InvalidAmount("-5".parse().unwrap());
    let response = AssistantResponse::from_validation_error(ActionType::CreateExpense, &err);
    assert!(!response.success());
    assert!(response.requires_clarification());
    assert_eq!(response.confidence(), ConfidenceLevel::Low);
    assert_eq!(response.clarification_questions().len(), 1);
    assert!(response.clarification_questions()[0].contains("greater than zero"));

    let err = ValidationError::MissingField(vec!["user_name", "currency"]);
    let response = AssistantResponse::from_validation_error(ActionType::CreateExpense, &err);
    assert_eq!(
        response.clarification_questions(),
        &["Could you tell me the user name and currency?".to_string()]
    );
}

#[test]
fn response_record_round_trips() {
    let response = AssistantResponse::from_record(json!({
        "action": "create_expense",
        "success": true,
        "message": "Recorded",
        "confidence": "high",
        "expense_data": { "amount": "9.99", "currency": "USD", "description": "Coffee" },
        "classification_result": {
            "category_name": "Food",
            "confidence": "high",
            "confidence_score": 0.9,
            "alternative_categories": [{ "name": "Travel", "score": 0.2 }]
        }
    }))
    .unwrap();
    let back = AssistantResponse::from_record(response.to_record().unwrap()).unwrap();
    assert_eq!(back, response);
}

#[test]
fn error_response_requires_a_message() {
    assert_eq!(
        ErrorResponse::new("storage", "  ").unwrap_err(),
        ValidationError::EmptyMessage
    );
    let err = ErrorResponse::new("storage", "disk full")
        .unwrap()
        .with_code("E_DISK")
        .with_suggestions(vec!["Free some space".into(), " ".into()])
        .with_retry_possible(false);
    assert_eq!(err.error_code(), Some("E_DISK"));
    assert_eq!(err.suggestions(), &["Free some space".to_string()]);
    assert!(!err.retry_possible());

    let from_validation = ErrorResponse::from_validation_error(&ValidationError::EmptyMessage);
    assert_eq!(from_validation.error_type(), "validation_error");
    assert_eq!(from_validation.error_code(), Some("empty_message"));
}
