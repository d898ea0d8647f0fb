// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{CategoryUpdate, NewCategory};
use crate::repo::CategoryRepository;
use crate::utils::{format_timestamp, maybe_print_json, parse_id, pretty_table, required_arg};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let repo = CategoryRepository::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let mut new = NewCategory::new(
                required_arg(sub, "name")?,
                required_arg(sub, "description")?,
                required_arg(sub, "color")?,
            );
            new.is_active = !sub.get_flag("inactive");
            new.validate()?;
            if repo.get_by_name(&new.name)?.is_some() {
                bail!("Category '{}' already exists", new.name);
            }
            let category = repo.create(&new)?;
            println!("Added category '{}' (id {})", category.name, category.id);
        }
        Some(("list", sub)) => {
            let data = repo.list(!sub.get_flag("all"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows: Vec<Vec<String>> = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.description.clone(),
                            c.color_code.clone(),
                            if c.is_active { "yes" } else { "no" }.to_string(),
                            format_timestamp(&c.created_at),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Category", "Description", "Color", "Active", "Created"],
                        rows
                    )
                );
            }
        }
        Some(("update", sub)) => {
            let id = parse_id(required_arg(sub, "id")?)?;
            let is_active = match sub.get_one::<String>("active") {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<bool>()
                        .with_context(|| format!("Invalid --active '{}' (use true|false)", raw))?,
                ),
                None => None,
            };
            let changes = CategoryUpdate {
                name: sub.get_one::<String>("name").cloned(),
                description: sub.get_one::<String>("description").cloned(),
                color_code: sub.get_one::<String>("color").cloned(),
                is_active,
            };
            if changes.is_empty() {
                bail!("Nothing to update for category {}", id);
            }
            match repo.update(id, &changes)? {
                Some(c) => println!("Updated category '{}'", c.name),
                None => bail!("Category {} not found", id),
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(required_arg(sub, "id")?)?;
            if !repo.delete(id)? {
                bail!("Category {} not found", id);
            }
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
