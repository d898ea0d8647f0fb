// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::classifier::Classifier;
use crate::utils::{id_for_category, maybe_print_json, parse_id, pretty_table, required_arg};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let classifier = Classifier::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let pattern = required_arg(sub, "pattern")?.trim();
            let category = required_arg(sub, "category")?.trim();
            let cat_id = id_for_category(conn, category)?;
            let id = classifier.add_rule(pattern, cat_id)?;
            println!("Added rule {}: /{}/ -> {}", id, pattern, category);
        }
        Some(("list", sub)) => {
            let rules = classifier.rules()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rules)? {
                let data: Vec<Vec<String>> = rules
                    .into_iter()
                    .map(|r| vec![r.id.to_string(), r.pattern, r.category_name])
                    .collect();
                println!("{}", pretty_table(&["ID", "Pattern", "Category"], data));
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(required_arg(sub, "id")?)?;
            if !classifier.remove_rule(id)? {
                bail!("Rule {} not found", id);
            }
            println!("Removed rule {}", id);
        }
        _ => {}
    }
    Ok(())
}
