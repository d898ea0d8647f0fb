// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Executes one assistant turn: validate the proposed response, carry out its
//! action against storage, and record the exchange in the conversation context.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::Value;
use tracing::{info, warn};

use crate::assistant::response::CategoryPatch;
use crate::assistant::{
    ActionType, AssistantResponse, ClassificationResult, ConversationContext, ExpenseData,
    ResponseData, Role,
};
use crate::classifier::Classifier;
use crate::error::ValidationError;
use crate::models::{
    CategoryUpdate, ExpenseFilter, ExpenseUpdate, MAX_CATEGORY_NAME_LEN, NewCategory, NewExpense,
};
use crate::utils::clip;
use crate::repo::{CategoryRepository, ExpenseRepository};

const HELP_COMMANDS: &[&str] = &[
    "create_expense: record a new expense",
    "list_expenses: show recorded expenses",
    "update_expense: change an expense by id",
    "delete_expense: remove an expense by id",
    "create_category: add a category",
    "list_categories: show active categories",
    "update_category: change a category by id",
    "delete_category: remove a category by id",
    "classify_expense: suggest a category for a description",
    "get_summary: totals per currency",
];

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

pub struct Orchestrator<'a> {
    categories: CategoryRepository<'a>,
    expenses: ExpenseRepository<'a>,
    classifier: Classifier<'a>,
    context: ConversationContext,
}

impl<'a> Orchestrator<'a> {
    pub fn new(conn: &'a Connection, context: ConversationContext) -> Self {
        Orchestrator {
            categories: CategoryRepository::new(conn),
            expenses: ExpenseRepository::new(conn),
            classifier: Classifier::new(conn),
            context,
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn into_context(self) -> ConversationContext {
        self.context
    }

    /// Handles the user's `input` together with the structured response
    /// proposed for it. Invalid proposals come back as clarification requests.
    pub fn handle_turn(&mut self, input: &str, proposed: Value) -> AssistantResponse {
        self.context.add_message(Role::User, input);
        let action_hint = proposed
            .get("action")
            .and_then(Value::as_str)
            .and_then(|s| s.trim().parse::<ActionType>().ok())
            .unwrap_or(ActionType::Unclear);

        let response = match AssistantResponse::from_record(proposed) {
            Ok(validated) => self.execute(validated),
            Err(err) => {
                warn!(%err, action = %action_hint, "proposed response failed validation");
                AssistantResponse::from_validation_error(action_hint, &err)
            }
        };

        self.context.add_message(Role::Assistant, response.message());
        self.context.remember(&response);
        info!(
            action = %response.action(),
            success = response.success(),
            clarification = response.requires_clarification(),
            "turn handled"
        );
        response
    }

    /// Carries out a validated response. Responses that already ask for
    /// clarification are returned unchanged.
    pub fn execute(&self, response: AssistantResponse) -> AssistantResponse {
        if response.requires_clarification() {
            return response;
        }
        let action = response.action();
        match self.dispatch(&response) {
            Ok(out) => out,
            Err(err) => match err.downcast_ref::<ValidationError>() {
                Some(v) => AssistantResponse::from_validation_error(action, v),
                None => {
                    warn!(%action, error = %format!("{:#}", err), "action failed");
                    AssistantResponse::failure(action, &format!("{:#}", err))
                }
            },
        }
    }

    fn dispatch(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        match response.action() {
            ActionType::CreateExpense => self.create_expense(response),
            ActionType::ListExpenses => self.list_expenses(response),
            ActionType::UpdateExpense => self.update_expense(response),
            ActionType::DeleteExpense => self.delete_expense(response),
            ActionType::CreateCategory => self.create_category(response),
            ActionType::ListCategories => self.list_categories(),
            ActionType::UpdateCategory => self.update_category(response),
            ActionType::DeleteCategory => self.delete_category(response),
            ActionType::ClassifyExpense => self.classify_expense(response),
            ActionType::GetSummary => self.summary(response),
            ActionType::Help => self.help(),
            ActionType::Unclear => Ok(AssistantResponse::clarification(
                ActionType::Unclear,
                response.message(),
                vec!["Could you tell me what you would like to do?".to_string()],
            )?),
        }
    }

    fn ask(&self, action: ActionType, message: &str, question: &str) -> Result<AssistantResponse> {
        Ok(AssistantResponse::clarification(
            action,
            message,
            vec![question.to_string()],
        )?)
    }

    fn user_for(&self, response: &AssistantResponse) -> Option<String> {
        response
            .expense_data()
            .and_then(ExpenseData::user_name)
            .or(self.context.user_name.as_deref())
            .map(str::to_string)
    }

    /// Picks a category id: an existing named category first, then the
    /// proposed classification, then the classifier's own guess.
    fn resolve_category(
        &self,
        data: &ExpenseData,
        proposed: Option<&ClassificationResult>,
    ) -> Result<(Option<i64>, Option<ClassificationResult>)> {
        if let Some(name) = data.category_name() {
            if let Some(category) = self.categories.get_by_name(name)? {
                return Ok((Some(category.id), proposed.cloned()));
            }
            warn!(name, "named category does not exist, classifying instead");
        }
        if let Some(result) = proposed {
            if let Some(id) = result.category_id() {
                if self.categories.get_by_id(id)?.is_some() {
                    return Ok((Some(id), Some(result.clone())));
                }
            }
            if let Some(name) = result.category_name() {
                if let Some(category) = self.categories.get_by_name(name)? {
                    return Ok((Some(category.id), Some(result.clone())));
                }
            }
        }
        match data.description() {
            Some(description) => {
                let result = self.classifier.classify(description)?;
                Ok((result.category_id(), Some(result)))
            }
            None => Ok((None, proposed.cloned())),
        }
    }

    fn create_expense(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::CreateExpense;
        let Some(data) = response.expense_data() else {
            return self.ask(
                action,
                "I can record that once I know the details.",
                "What did you buy and how much did it cost?",
            );
        };
        let data = data.fill_missing(
            self.context.user_name.as_deref(),
            self.context.default_currency(),
            None,
        );
        let (category_id, classification) =
            self.resolve_category(&data, response.classification_result())?;
        let new = NewExpense::from_expense_data(&data, category_id)?;
        let expense = self.expenses.create(&new)?;

        let message = format!(
            "Recorded {} {} for '{}'.",
            expense.amount, expense.currency, expense.description
        );
        let mut out = AssistantResponse::new(action, true, &message)?
            .with_confidence(response.confidence())
            .with_expense_data(data)
            .with_data(ResponseData::Expense(expense))?;
        if let Some(c) = classification {
            out = out.with_classification(c);
        }
        Ok(out)
    }

    fn list_expenses(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let category_id = match response.expense_data().and_then(ExpenseData::category_name) {
            Some(name) => self.categories.get_by_name(name)?.map(|c| c.id),
            None => None,
        };
        let expenses = self.expenses.list(&ExpenseFilter {
            user_name: self.user_for(response),
            category_id,
            limit: None,
        })?;
        let message = format!("Found {}.", plural(expenses.len(), "expense"));
        Ok(AssistantResponse::new(ActionType::ListExpenses, true, &message)?
            .with_data(ResponseData::Expenses(expenses))?)
    }

    fn update_expense(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::UpdateExpense;
        let Some(id) = response.data().and_then(ResponseData::target_id) else {
            return self.ask(
                action,
                "Which expense should I update?",
                "What is the id of the expense you want to change?",
            );
        };
        let Some(data) = response.expense_data() else {
            return self.ask(action, "What should I change?", "Which details of the expense are different?");
        };
        let category_id = match data.category_name() {
            Some(name) => match self.categories.get_by_name(name)? {
                Some(category) => Some(category.id),
                None => {
                    return self.ask(
                        action,
                        &format!("I couldn't find a category named '{}'.", clip(name, MAX_CATEGORY_NAME_LEN)),
                        "Which existing category should this expense go in?",
                    );
                }
            },
            None => None,
        };
        let changes = ExpenseUpdate::from_expense_data(data, category_id);
        if changes.is_empty() {
            return self.ask(action, "What should I change?", "Which details of the expense are different?");
        }
        match self.expenses.update(id, &changes)? {
            Some(expense) => Ok(AssistantResponse::new(action, true, &format!("Updated expense {}.", id))?
                .with_expense_data(data.clone())
                .with_data(ResponseData::Expense(expense))?),
            None => Ok(AssistantResponse::new(
                action,
                false,
                &format!("Expense {} was not found.", id),
            )?),
        }
    }

    fn delete_expense(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::DeleteExpense;
        let Some(id) = response.data().and_then(ResponseData::target_id) else {
            return self.ask(
                action,
                "Which expense should I delete?",
                "What is the id of the expense you want to remove?",
            );
        };
        if self.expenses.delete(id)? {
            Ok(AssistantResponse::new(action, true, &format!("Deleted expense {}.", id))?
                .with_data(ResponseData::Reference { id })?)
        } else {
            Ok(AssistantResponse::new(action, false, &format!("Expense {} was not found.", id))?)
        }
    }

    fn create_category(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::CreateCategory;
        let new = match response.data() {
            Some(ResponseData::NewCategory(n)) => n.clone(),
            Some(ResponseData::Category(c)) => NewCategory {
                name: c.name.clone(),
                description: c.description.clone(),
                color_code: c.color_code.clone(),
                is_active: c.is_active,
            },
            _ => {
                return self.ask(
                    action,
                    "I can add a category once I know what it is.",
                    "What should the category be called, how would you describe it, and which color should it use?",
                );
            }
        };
        new.validate()?;
        if let Some(existing) = self.categories.get_by_name(&new.name)? {
            return Ok(AssistantResponse::new(
                action,
                false,
                &format!("Category '{}' already exists.", existing.name),
            )?
            .with_data(ResponseData::Category(existing))?);
        }
        let category = self.categories.create(&new)?;
        Ok(
            AssistantResponse::new(action, true, &format!("Created category '{}'.", category.name))?
                .with_data(ResponseData::Category(category))?,
        )
    }

    fn list_categories(&self) -> Result<AssistantResponse> {
        let categories = self.categories.list(true)?;
        let message = format!("Found {}.", plural(categories.len(), "category"));
        Ok(AssistantResponse::new(ActionType::ListCategories, true, &message)?
            .with_data(ResponseData::Categories(categories))?)
    }

    fn update_category(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::UpdateCategory;
        let (id, changes) = match response.data() {
            Some(ResponseData::CategoryPatch(CategoryPatch { id, changes })) => (*id, changes.clone()),
            Some(ResponseData::Category(c)) => (
                c.id,
                CategoryUpdate {
                    name: Some(c.name.clone()),
                    description: Some(c.description.clone()),
                    color_code: Some(c.color_code.clone()),
                    is_active: Some(c.is_active),
                },
            ),
            _ => {
                return self.ask(
                    action,
                    "Which category should I update?",
                    "What is the id of the category, and what should change?",
                );
            }
        };
        if changes.is_empty() {
            return self.ask(action, "What should I change?", "Which details of the category are different?");
        }
        changes.validate()?;
        match self.categories.update(id, &changes)? {
            Some(category) => Ok(AssistantResponse::new(
                action,
                true,
                &format!("Updated category '{}'.", category.name),
            )?
            .with_data(ResponseData::Category(category))?),
            None => Ok(AssistantResponse::new(
                action,
                false,
                &format!("Category {} was not found.", id),
            )?),
        }
    }

    fn delete_category(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::DeleteCategory;
        let Some(id) = response.data().and_then(ResponseData::target_id) else {
            return self.ask(
                action,
                "Which category should I delete?",
                "What is the id of the category you want to remove?",
            );
        };
        if self.categories.delete(id)? {
            Ok(AssistantResponse::new(action, true, &format!("Deleted category {}.", id))?
                .with_data(ResponseData::Reference { id })?)
        } else {
            Ok(AssistantResponse::new(action, false, &format!("Category {} was not found.", id))?)
        }
    }

    fn classify_expense(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let action = ActionType::ClassifyExpense;
        let Some(description) = response.expense_data().and_then(ExpenseData::description) else {
            return self.ask(action, "I need a description to classify.", "What was the expense for?");
        };
        let result = self.classifier.classify(description)?;
        let message = match result.category_name() {
            Some(name) => format!(
                "This looks like {} ({:.0}% confident).",
                name,
                result.confidence_score() * 100.0
            ),
            None => "I couldn't match this to a category.".to_string(),
        };
        Ok(AssistantResponse::new(action, true, &message)?
            .with_confidence(result.confidence())
            .with_classification(result))
    }

    fn summary(&self, response: &AssistantResponse) -> Result<AssistantResponse> {
        let user = self.user_for(response);
        let summary = self.expenses.summary(user.as_deref())?;
        let mut message = format!("{} recorded", plural(summary.expense_count, "expense"));
        if !summary.totals.is_empty() {
            let totals: Vec<String> = summary
                .totals
                .iter()
                .map(|t| format!("{} {}", t.total, t.currency))
                .collect();
            message.push_str(&format!(": {}", totals.join(", ")));
        }
        message.push('.');
        Ok(AssistantResponse::new(ActionType::GetSummary, true, &message)?
            .with_data(ResponseData::Summary(summary))?)
    }

    fn help(&self) -> Result<AssistantResponse> {
        let commands = HELP_COMMANDS.iter().map(|s| s.to_string()).collect();
        Ok(AssistantResponse::new(ActionType::Help, true, "Here is what I can do.")?
            .with_data(ResponseData::Help { commands })?)
    }
}
