// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

use crate::assistant::{ActionType, AssistantResponse, ErrorResponse};
use crate::utils::required_arg;

/// Reads a JSON document holding one proposed assistant response.
pub fn read_record(path: &str) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path))
}

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let path = required_arg(m, "file")?.trim();
    let record = read_record(path)?;
    let action = record
        .get("action")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<ActionType>().ok())
        .unwrap_or(ActionType::Unclear);

    match AssistantResponse::from_record(record) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response.to_record()?)?);
            Ok(())
        }
        Err(err) => {
            let report = json!({
                "error": ErrorResponse::from_validation_error(&err),
                "clarification": AssistantResponse::from_validation_error(action, &err).to_record()?,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            bail!("{} failed validation: {}", path, err)
        }
    }
}
