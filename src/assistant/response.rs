// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The response envelope for one assistant turn.
//!
//! Construction is two-phase. `ResponseDraft::reconcile` settles the
//! clarification flag against the raw question list, then the field pass
//! validates and normalizes each field into an immutable `AssistantResponse`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ActionType, ClassificationDraft, ClassificationResult, ConfidenceLevel, ExpenseData,
    ExpenseDraft,
};
use crate::error::{ValidationError, ValidationResult, check_len};
use crate::models::{Category, CategoryUpdate, Expense, ExpenseSummary, NewCategory};
use crate::utils::clip;
use crate::vocab::parse_optional;

pub const MAX_MESSAGE_LEN: usize = 2000;

const FALLBACK_QUESTION: &str = "Could you rephrase what you would like me to do?";

/// Targets an existing category and carries the fields to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub id: i64,
    #[serde(flatten)]
    pub changes: CategoryUpdate,
}

/// Action-specific payload. Which variants are allowed depends on the action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Expense(Expense),
    Expenses(Vec<Expense>),
    Category(Category),
    Categories(Vec<Category>),
    NewCategory(NewCategory),
    CategoryPatch(CategoryPatch),
    Reference { id: i64 },
    Summary(ExpenseSummary),
    Help { commands: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Expense,
    Expenses,
    Category,
    Categories,
    NewCategory,
    CategoryPatch,
    Reference,
    Summary,
    Help,
}

#[derive(Deserialize)]
struct ReferencePayload {
    id: i64,
}

#[derive(Deserialize)]
struct HelpPayload {
    commands: Vec<String>,
}

impl Shape {
    /// Allowed shapes per action, most specific first.
    fn for_action(action: ActionType) -> &'static [Shape] {
        match action {
            ActionType::CreateExpense => &[Shape::Expense],
            ActionType::ListExpenses => &[Shape::Expenses],
            ActionType::UpdateExpense => &[Shape::Expense, Shape::Reference],
            ActionType::DeleteExpense => &[Shape::Reference],
            ActionType::CreateCategory => &[Shape::Category, Shape::NewCategory],
            ActionType::ListCategories => &[Shape::Categories],
            ActionType::UpdateCategory => &[Shape::Category, Shape::CategoryPatch],
            ActionType::DeleteCategory => &[Shape::Reference],
            ActionType::GetSummary => &[Shape::Summary],
            ActionType::Help => &[Shape::Help],
            ActionType::ClassifyExpense | ActionType::Unclear => &[],
        }
    }

    fn parse(self, value: Value) -> serde_json::Result<ResponseData> {
        use serde_json::from_value;
        Ok(match self {
            Shape::Expense => ResponseData::Expense(from_value(value)?),
            Shape::Expenses => ResponseData::Expenses(from_value(value)?),
            Shape::Category => ResponseData::Category(from_value(value)?),
            Shape::Categories => ResponseData::Categories(from_value(value)?),
            Shape::NewCategory => ResponseData::NewCategory(from_value(value)?),
            Shape::CategoryPatch => ResponseData::CategoryPatch(from_value(value)?),
            Shape::Reference => {
                let r: ReferencePayload = from_value(value)?;
                ResponseData::Reference { id: r.id }
            }
            Shape::Summary => ResponseData::Summary(from_value(value)?),
            Shape::Help => {
                let h: HelpPayload = from_value(value)?;
                ResponseData::Help {
                    commands: h.commands,
                }
            }
        })
    }
}

impl ResponseData {
    fn shape(&self) -> Shape {
        match self {
            ResponseData::Expense(_) => Shape::Expense,
            ResponseData::Expenses(_) => Shape::Expenses,
            ResponseData::Category(_) => Shape::Category,
            ResponseData::Categories(_) => Shape::Categories,
            ResponseData::NewCategory(_) => Shape::NewCategory,
            ResponseData::CategoryPatch(_) => Shape::CategoryPatch,
            ResponseData::Reference { .. } => Shape::Reference,
            ResponseData::Summary(_) => Shape::Summary,
            ResponseData::Help { .. } => Shape::Help,
        }
    }

    pub fn fits(&self, action: ActionType) -> bool {
        Shape::for_action(action).contains(&self.shape())
    }

    /// Reads a raw payload in the shape the action expects. `null` is no payload.
    pub fn from_value(action: ActionType, value: Value) -> ValidationResult<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let shapes = Shape::for_action(action);
        if shapes.is_empty() {
            return Err(ValidationError::PayloadMismatch {
                action: action.as_str(),
                reason: "this action carries no payload".to_string(),
            });
        }
        let mut reason = String::new();
        for shape in shapes {
            match shape.parse(value.clone()) {
                Ok(data) => return Ok(Some(data)),
                Err(err) => reason = err.to_string(),
            }
        }
        Err(ValidationError::PayloadMismatch {
            action: action.as_str(),
            reason,
        })
    }

    /// The id this payload points at, if any.
    pub fn target_id(&self) -> Option<i64> {
        match self {
            ResponseData::Expense(e) => Some(e.id),
            ResponseData::Category(c) => Some(c.id),
            ResponseData::CategoryPatch(p) => Some(p.id),
            ResponseData::Reference { id } => Some(*id),
            _ => None,
        }
    }
}

/// A response as received, before any validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseDraft {
    pub action: String,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub expense_data: Option<ExpenseDraft>,
    #[serde(default)]
    pub classification_result: Option<ClassificationDraft>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub requires_clarification: bool,
    #[serde(default)]
    pub clarification_questions: Vec<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseDraft {
    pub fn new(action: ActionType, success: bool, message: &str) -> Self {
        ResponseDraft {
            action: action.as_str().to_string(),
            success,
            message: message.to_string(),
            expense_data: None,
            classification_result: None,
            confidence: None,
            requires_clarification: false,
            clarification_questions: Vec::new(),
            data: None,
        }
    }

    /// Consistency pass over the raw question list (before trimming).
    /// Requesting clarification without questions fails; any questions force
    /// the flag on, even when the caller said `false`.
    pub fn reconcile(mut self) -> ValidationResult<Self> {
        if self.requires_clarification && self.clarification_questions.is_empty() {
            return Err(ValidationError::InconsistentClarificationState);
        }
        if !self.clarification_questions.is_empty() {
            self.requires_clarification = true;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResponseDraft")]
pub struct AssistantResponse {
    action: ActionType,
    success: bool,
    message: String,
    expense_data: Option<ExpenseData>,
    classification_result: Option<ClassificationResult>,
    confidence: ConfidenceLevel,
    requires_clarification: bool,
    clarification_questions: Vec<String>,
    data: Option<ResponseData>,
}

fn check_clarification_fields(record: &Value) -> ValidationResult<()> {
    let requested = matches!(record.get("requires_clarification"), Some(Value::Bool(true)));
    let no_questions = match record.get("clarification_questions") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    };
    if requested && no_questions {
        return Err(ValidationError::InconsistentClarificationState);
    }
    Ok(())
}

fn validate_message(raw: &str) -> ValidationResult<String> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    check_len("message", message, MAX_MESSAGE_LEN)?;
    Ok(message.to_string())
}

fn clean_questions(questions: Vec<String>) -> Vec<String> {
    questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

impl TryFrom<ResponseDraft> for AssistantResponse {
    type Error = ValidationError;

    fn try_from(draft: ResponseDraft) -> ValidationResult<Self> {
        let draft = draft.reconcile()?;

        let action = draft.action.trim().parse::<ActionType>()?;
        let message = validate_message(&draft.message)?;
        let expense_data = draft
            .expense_data
            .map(ExpenseData::try_from)
            .transpose()?;
        let classification_result = draft
            .classification_result
            .map(ClassificationResult::try_from)
            .transpose()?;
        let confidence = parse_optional::<ConfidenceLevel>(draft.confidence)?.unwrap_or_default();
        let clarification_questions = clean_questions(draft.clarification_questions);
        let data = match draft.data {
            Some(value) => ResponseData::from_value(action, value)?,
            None => None,
        };

        Ok(AssistantResponse {
            action,
            success: draft.success,
            message,
            expense_data,
            classification_result,
            confidence,
            requires_clarification: draft.requires_clarification,
            clarification_questions,
            data,
        })
    }
}

fn vocabulary_label(kind: &str) -> &str {
    match kind {
        "Currency" => "currency",
        "PaymentMethod" => "payment method",
        "ActionType" => "action",
        "ConfidenceLevel" => "confidence level",
        "Role" => "role",
        other => other,
    }
}

/// The follow-up question that would resolve `err`.
pub fn clarifying_question(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidAmount(_) => {
            "How much did you spend? The amount must be greater than zero.".to_string()
        }
        ValidationError::InvalidEnumValue {
            kind,
            value,
            expected,
        } => format!(
            "I didn't recognise '{}' as a {}. Which of these did you mean: {}?",
            value,
            vocabulary_label(kind),
            expected
        ),
        ValidationError::OutOfRange { .. } | ValidationError::MalformedListEntry { .. } => {
            "Which category should this expense go in?".to_string()
        }
        ValidationError::TooLong { field, max, .. } => {
            format!("Could you shorten the {} to at most {} characters?", field, max)
        }
        ValidationError::InvalidTimestamp(raw) => format!(
            "When did this happen? I couldn't read '{}' as a date (try YYYY-MM-DD).",
            raw
        ),
        ValidationError::MissingField(fields) => format!(
            "Could you tell me the {}?",
            fields.join(" and ").replace('_', " ")
        ),
        ValidationError::EmptyMessage
        | ValidationError::InconsistentClarificationState
        | ValidationError::PayloadMismatch { .. }
        | ValidationError::MalformedRecord(_) => FALLBACK_QUESTION.to_string(),
    }
}

impl AssistantResponse {
    pub fn new(action: ActionType, success: bool, message: &str) -> ValidationResult<Self> {
        Self::try_from(ResponseDraft::new(action, success, message))
    }

    /// Validates a JSON record, typically the structured output of a model.
    /// The clarification fields are checked on the raw record first, so an
    /// inconsistent record is reported as such even when other fields are bad.
    pub fn from_record(record: Value) -> ValidationResult<Self> {
        check_clarification_fields(&record)?;
        let draft: ResponseDraft = serde_json::from_value(record)?;
        Self::try_from(draft)
    }

    pub fn to_record(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn clarification(
        action: ActionType,
        message: &str,
        questions: Vec<String>,
    ) -> ValidationResult<Self> {
        let mut draft = ResponseDraft::new(action, false, message);
        draft.requires_clarification = true;
        draft.clarification_questions = questions;
        draft.confidence = Some(ConfidenceLevel::Low.as_str().to_string());
        Self::try_from(draft)
    }

    /// Turns a validation failure into a request for the missing information.
    pub fn from_validation_error(action: ActionType, err: &ValidationError) -> Self {
        AssistantResponse {
            action,
            success: false,
            message: "I need a bit more information before I can do that.".to_string(),
            expense_data: None,
            classification_result: None,
            confidence: ConfidenceLevel::Low,
            requires_clarification: true,
            clarification_questions: vec![clarifying_question(err)],
            data: None,
        }
    }

    /// An unsuccessful turn that needs no follow-up from the user.
    pub fn failure(action: ActionType, detail: &str) -> Self {
        let message = format!("Sorry, I couldn't complete that: {}", detail.trim());
        AssistantResponse {
            action,
            success: false,
            message: clip(message.trim(), MAX_MESSAGE_LEN),
            expense_data: None,
            classification_result: None,
            confidence: ConfidenceLevel::Low,
            requires_clarification: false,
            clarification_questions: Vec::new(),
            data: None,
        }
    }

    pub fn with_expense_data(mut self, expense_data: ExpenseData) -> Self {
        self.expense_data = Some(expense_data);
        self
    }

    pub fn with_classification(mut self, classification: ClassificationResult) -> Self {
        self.classification_result = Some(classification);
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidenceLevel) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_data(mut self, data: ResponseData) -> ValidationResult<Self> {
        if !data.fits(self.action) {
            return Err(ValidationError::PayloadMismatch {
                action: self.action.as_str(),
                reason: "payload shape is not allowed for this action".to_string(),
            });
        }
        self.data = Some(data);
        Ok(self)
    }

    pub fn action(&self) -> ActionType {
        self.action
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expense_data(&self) -> Option<&ExpenseData> {
        self.expense_data.as_ref()
    }

    pub fn classification_result(&self) -> Option<&ClassificationResult> {
        self.classification_result.as_ref()
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    pub fn requires_clarification(&self) -> bool {
        self.requires_clarification
    }

    pub fn clarification_questions(&self) -> &[String] {
        &self.clarification_questions
    }

    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }
}

/// Structured description of a failure, for callers that want codes rather
/// than a conversational reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    error_type: String,
    error_message: String,
    error_code: Option<String>,
    suggestions: Vec<String>,
    retry_possible: bool,
}

impl ErrorResponse {
    pub fn new(error_type: &str, error_message: &str) -> ValidationResult<Self> {
        let error_message = error_message.trim();
        if error_message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(ErrorResponse {
            error_type: error_type.trim().to_string(),
            error_message: error_message.to_string(),
            error_code: None,
            suggestions: Vec::new(),
            retry_possible: true,
        })
    }

    pub fn from_validation_error(err: &ValidationError) -> Self {
        ErrorResponse {
            error_type: "validation_error".to_string(),
            error_message: err.to_string(),
            error_code: Some(err.code().to_string()),
            suggestions: vec![clarifying_question(err)],
            retry_possible: true,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = clean_questions(suggestions);
        self
    }

    pub fn with_retry_possible(mut self, retry_possible: bool) -> Self {
        self.retry_possible = retry_possible;
        self
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn retry_possible(&self) -> bool {
        self.retry_possible
    }
}
