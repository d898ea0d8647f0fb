// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Rule-based expense classification.
//!
//! User-defined regex rules are tried newest first, then active category names
//! are looked for as whole words in the description. The first hit is the
//! prediction and later hits become alternatives.

use anyhow::Result;
use regex::Regex;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::{debug, warn};

use crate::assistant::{AlternativeCategory, ClassificationResult, ConfidenceLevel};
use crate::repo::CategoryRepository;

pub const RULE_SCORE: f64 = 0.9;
pub const NAME_SCORE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: i64,
    pub pattern: String,
    pub category_id: i64,
    pub category_name: String,
}

struct Candidate {
    category_id: i64,
    name: String,
    score: f64,
    reason: String,
}

pub struct Classifier<'a> {
    conn: &'a Connection,
}

impl<'a> Classifier<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Classifier { conn }
    }

    /// Rules pointing at active categories, newest first.
    pub fn rules(&self) -> Result<Vec<Rule>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.pattern, c.id, c.name FROM rules r
             JOIN categories c ON c.id=r.category_id
             WHERE c.is_active=1
             ORDER BY r.id DESC",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(Rule {
                id: r.get(0)?,
                pattern: r.get(1)?,
                category_id: r.get(2)?,
                category_name: r.get(3)?,
            })
        })?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }

    pub fn add_rule(&self, pattern: &str, category_id: i64) -> Result<i64> {
        let pattern = pattern.trim();
        Regex::new(pattern)
            .map_err(|err| anyhow::anyhow!("Invalid regex pattern '{}': {}", pattern, err))?;
        self.conn.execute(
            "INSERT INTO rules(pattern, category_id) VALUES (?1, ?2)",
            params![pattern, category_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn remove_rule(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM rules WHERE id=?1", params![id])?;
        Ok(n > 0)
    }

    fn candidates(&self, description: &str) -> Result<Vec<Candidate>> {
        let mut found: Vec<Candidate> = Vec::new();
        let mut push = |c: Candidate| {
            if !found.iter().any(|f| f.category_id == c.category_id) {
                found.push(c);
            }
        };

        for rule in self.rules()? {
            match Regex::new(&rule.pattern) {
                Ok(re) if re.is_match(description) => push(Candidate {
                    category_id: rule.category_id,
                    name: rule.category_name,
                    score: RULE_SCORE,
                    reason: format!("matched rule /{}/", rule.pattern),
                }),
                Ok(_) => {}
                Err(err) => warn!(id = rule.id, %err, "skipping invalid rule pattern"),
            }
        }

        for category in CategoryRepository::new(self.conn).list(true)? {
            let word = format!(r"(?i)\b{}\b", regex::escape(&category.name));
            if Regex::new(&word)?.is_match(description) {
                push(Candidate {
                    category_id: category.id,
                    reason: format!("description mentions '{}'", category.name),
                    name: category.name,
                    score: NAME_SCORE,
                });
            }
        }
        Ok(found)
    }

    pub fn classify(&self, description: &str) -> Result<ClassificationResult> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(ClassificationResult::new(ConfidenceLevel::Low, 0.0)?
                .with_reasoning("no description to classify"));
        }

        let mut candidates = self.candidates(description)?.into_iter();
        let Some(best) = candidates.next() else {
            debug!(description, "no category matched");
            return Ok(ClassificationResult::new(ConfidenceLevel::Low, 0.0)?
                .with_reasoning("no rule or category name matched"));
        };

        let confidence = if best.score >= RULE_SCORE {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::Medium
        };
        let alternatives = candidates
            .map(|c| AlternativeCategory {
                name: c.name,
                score: c.score,
            })
            .collect();
        debug!(description, category = %best.name, score = best.score, "classified expense");
        Ok(ClassificationResult::new(confidence, best.score)?
            .with_category(Some(best.category_id), &best.name)
            .with_reasoning(&best.reason)
            .with_alternatives(alternatives)?)
    }
}
