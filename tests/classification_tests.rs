// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use expenses_agent::assistant::{AlternativeCategory, ClassificationResult, ConfidenceLevel};
use expenses_agent::error::ValidationError;
use serde_json::json;

fn record(score: f64) -> serde_json::Value {
    json!({ "category_name": "Food", "confidence": "high", "confidence_score": score })
}

#[test]
fn score_boundaries_are_inclusive() {
    for score in [0.0, 0.5, 1.0] {
        let result = ClassificationResult::from_record(record(score)).unwrap();
        assert_eq!(result.confidence_score(), score);
    }
}

#[test]
fn scores_outside_unit_range_are_rejected() {
    for score in [-0.01, 1.01, 42.0] {
        let err = ClassificationResult::from_record(record(score)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "confidence_score",
                ..
            }
        ));
    }
    assert!(ClassificationResult::new(ConfidenceLevel::Low, f64::NAN).is_err());
}

#[test]
fn alternatives_missing_keys_reject_the_whole_list() {
    let err = ClassificationResult::from_record(json!({
        "confidence": "medium",
        "confidence_score": 0.6,
        "alternative_categories": [
            { "name": "Travel", "score": 0.3 },
            { "name": "Fuel" }
        ]
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ValidationError::MalformedListEntry {
            list: "alternative_categories",
            index: 1,
            ..
        }
    ));
}

#[test]
fn alternatives_must_be_mappings_with_typed_values() {
    for bad in [json!("Travel"), json!({ "name": 3, "score": 0.1 }), json!({ "name": "Travel", "score": "high" })] {
        let err = ClassificationResult::from_record(json!({
            "confidence": "low",
            "confidence_score": 0.1,
            "alternative_categories": [bad]
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedListEntry { index: 0, .. }));
    }
}

#[test]
fn alternative_scores_are_range_checked() {
    let err = ClassificationResult::from_record(json!({
        "confidence": "low",
        "confidence_score": 0.1,
        "alternative_categories": [{ "name": "Travel", "score": 1.5 }]
    }))
    .unwrap_err();
    assert!(matches!(err, ValidationError::MalformedListEntry { .. }));

    let built = ClassificationResult::new(ConfidenceLevel::Low, 0.1)
        .unwrap()
        .with_alternatives(vec![AlternativeCategory {
            name: "Travel".into(),
            score: -0.2,
        }]);
    assert!(built.is_err());
}

#[test]
fn extra_keys_in_alternatives_are_ignored() {
    let result = ClassificationResult::from_record(json!({
        "confidence": "medium",
        "confidence_score": 0.6,
        "alternative_categories": [{ "name": "Travel", "score": 0.3, "why": "taxi" }]
    }))
    .unwrap();
    assert_eq!(
        result.alternative_categories(),
        &[AlternativeCategory {
            name: "Travel".into(),
            score: 0.3
        }]
    );
}

#[test]
fn missing_confidence_is_a_malformed_record() {
    let err = ClassificationResult::from_record(json!({ "confidence_score": 0.3 })).unwrap_err();
    assert!(matches!(err, ValidationError::MalformedRecord(_)));
}
