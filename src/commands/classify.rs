// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::classifier::Classifier;
use crate::utils::{maybe_print_json, pretty_table, required_arg};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let description = required_arg(m, "description")?;
    let result = Classifier::new(conn).classify(description)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &result)? {
        return Ok(());
    }

    let mut rows = vec![vec![
        result.category_name().unwrap_or("-").to_string(),
        format!("{:.2}", result.confidence_score()),
        result.confidence().to_string(),
        result.reasoning().unwrap_or_default().to_string(),
    ]];
    for alt in result.alternative_categories() {
        rows.push(vec![
            alt.name.clone(),
            format!("{:.2}", alt.score),
            "alternative".to_string(),
            String::new(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Category", "Score", "Confidence", "Reasoning"], rows)
    );
    Ok(())
}
