// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::assistant::{AssistantResponse, ConversationContext};
use crate::config::AppConfig;
use crate::models::Currency;
use crate::orchestrator::Orchestrator;
use crate::utils::required_arg;

/// One line of a session file.
#[derive(Debug, Deserialize)]
struct Turn {
    input: String,
    #[serde(default)]
    response: Value,
}

/// Feeds every non-blank line of `reader` through the orchestrator, returning
/// the responses in order together with the final context.
pub fn replay<R: BufRead>(
    conn: &Connection,
    context: ConversationContext,
    reader: R,
) -> Result<(Vec<AssistantResponse>, ConversationContext)> {
    let mut orchestrator = Orchestrator::new(conn, context);
    let mut responses = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let turn: Turn = serde_json::from_str(&line)
            .with_context(|| format!("Line {} is not a session turn", idx + 1))?;
        debug!(line = idx + 1, "replaying turn");
        responses.push(orchestrator.handle_turn(&turn.input, turn.response));
    }
    Ok((responses, orchestrator.into_context()))
}

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    let path = required_arg(m, "file")?.trim();
    let user = m
        .get_one::<String>("user")
        .map(|s| s.as_str())
        .or(cfg.user());
    let currency = match m.get_one::<String>("currency") {
        Some(raw) => Some(raw.trim().to_uppercase().parse::<Currency>()?),
        None => cfg.default_currency()?,
    };

    let mut context = ConversationContext::new(user);
    if let Some(c) = currency {
        context.set_default_currency(c);
    }

    let file = File::open(path).with_context(|| format!("Open {}", path))?;
    let (responses, _) = replay(conn, context, BufReader::new(file))?;
    for (idx, response) in responses.iter().enumerate() {
        println!(
            "{}",
            serde_json::to_string(&json!({ "turn": idx + 1, "response": response.to_record()? }))?
        );
    }
    Ok(())
}
