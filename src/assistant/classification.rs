// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ConfidenceLevel;
use crate::error::{ValidationError, ValidationResult, trimmed};

const ALTERNATIVES: &str = "alternative_categories";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCategory {
    pub name: String,
    pub score: f64,
}

/// A category prediction as received. Alternatives stay as raw JSON until
/// every entry has been checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassificationDraft {
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub confidence: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub alternative_categories: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClassificationDraft")]
pub struct ClassificationResult {
    category_name: Option<String>,
    category_id: Option<i64>,
    confidence: ConfidenceLevel,
    confidence_score: f64,
    reasoning: Option<String>,
    alternative_categories: Vec<AlternativeCategory>,
}

fn in_unit_range(score: f64) -> bool {
    (0.0..=1.0).contains(&score)
}

fn check_score(score: f64) -> ValidationResult<f64> {
    if in_unit_range(score) {
        Ok(score)
    } else {
        Err(ValidationError::OutOfRange {
            field: "confidence_score",
            value: score,
        })
    }
}

fn malformed(index: usize, reason: impl Into<String>) -> ValidationError {
    ValidationError::MalformedListEntry {
        list: ALTERNATIVES,
        index,
        reason: reason.into(),
    }
}

/// All-or-nothing: one bad entry rejects the whole list.
fn parse_alternatives(entries: Vec<Value>) -> ValidationResult<Vec<AlternativeCategory>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let map = entry
                .as_object()
                .ok_or_else(|| malformed(index, "expected a mapping"))?;
            let (Some(name), Some(score)) = (map.get("name"), map.get("score")) else {
                return Err(malformed(index, "must have \"name\" and \"score\" keys"));
            };
            let name = name
                .as_str()
                .ok_or_else(|| malformed(index, "\"name\" must be a string"))?;
            let score = score
                .as_f64()
                .ok_or_else(|| malformed(index, "\"score\" must be a number"))?;
            if !in_unit_range(score) {
                return Err(malformed(index, format!("score {} is not between 0 and 1", score)));
            }
            Ok(AlternativeCategory {
                name: name.to_string(),
                score,
            })
        })
        .collect()
}

fn check_alternatives(alternatives: &[AlternativeCategory]) -> ValidationResult<()> {
    for (index, alt) in alternatives.iter().enumerate() {
        if !in_unit_range(alt.score) {
            return Err(malformed(
                index,
                format!("score {} is not between 0 and 1", alt.score),
            ));
        }
    }
    Ok(())
}

impl TryFrom<ClassificationDraft> for ClassificationResult {
    type Error = ValidationError;

    fn try_from(draft: ClassificationDraft) -> ValidationResult<Self> {
        let confidence = draft.confidence.trim().parse::<ConfidenceLevel>()?;
        let confidence_score = check_score(draft.confidence_score)?;
        let alternative_categories = parse_alternatives(draft.alternative_categories)?;
        Ok(ClassificationResult {
            category_name: trimmed(draft.category_name),
            category_id: draft.category_id,
            confidence,
            confidence_score,
            reasoning: trimmed(draft.reasoning),
            alternative_categories,
        })
    }
}

impl ClassificationResult {
    pub fn new(confidence: ConfidenceLevel, confidence_score: f64) -> ValidationResult<Self> {
        Ok(ClassificationResult {
            category_name: None,
            category_id: None,
            confidence,
            confidence_score: check_score(confidence_score)?,
            reasoning: None,
            alternative_categories: Vec::new(),
        })
    }

    pub fn from_record(record: Value) -> ValidationResult<Self> {
        let draft: ClassificationDraft = serde_json::from_value(record)?;
        Self::try_from(draft)
    }

    pub fn with_category(mut self, id: Option<i64>, name: &str) -> Self {
        self.category_id = id;
        self.category_name = trimmed(Some(name.to_string()));
        self
    }

    pub fn with_reasoning(mut self, reasoning: &str) -> Self {
        self.reasoning = trimmed(Some(reasoning.to_string()));
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<AlternativeCategory>) -> ValidationResult<Self> {
        check_alternatives(&alternatives)?;
        self.alternative_categories = alternatives;
        Ok(self)
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category_name.as_deref()
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    pub fn alternative_categories(&self) -> &[AlternativeCategory] {
        &self.alternative_categories
    }
}
