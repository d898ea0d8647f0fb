// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::{Cursor, Write};

use expenses_agent::assistant::{ActionType, ConversationContext};
use expenses_agent::commands::{categories, expenses, rules, session, validate};
use expenses_agent::config::AppConfig;
use expenses_agent::{cli, db};
use rusqlite::Connection;
use tempfile::NamedTempFile;

fn run(conn: &Connection, cfg: &AppConfig, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["expenses-agent"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("category", sub)) => categories::handle(conn, sub),
        Some(("expense", sub)) => expenses::handle(conn, cfg, sub),
        Some(("rules", sub)) => rules::handle(conn, sub),
        Some(("validate", sub)) => validate::handle(sub),
        Some(("session", sub)) => session::handle(conn, cfg, sub),
        other => panic!("unexpected subcommand {:?}", other.map(|(name, _)| name)),
    }
}

fn cfg() -> AppConfig {
    AppConfig {
        user: Some("ana".into()),
        default_currency: Some("usd".into()),
        ..Default::default()
    }
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

#[test]
fn category_commands_round_trip() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    run(&conn, &cfg, &["category", "add", "Food", "--description", "Meals", "--color", "#FF6B6B"]).unwrap();
    assert!(run(&conn, &cfg, &["category", "add", "Food", "--description", "Again", "--color", "#000"]).is_err());
    run(&conn, &cfg, &["category", "list", "--json"]).unwrap();

    let id: i64 = conn
        .query_row("SELECT id FROM categories WHERE name='Food'", [], |r| r.get(0))
        .unwrap();
    run(&conn, &cfg, &["category", "update", &id.to_string(), "--active", "false"]).unwrap();
    assert_eq!(count(&conn, "SELECT is_active FROM categories WHERE name='Food'"), 0);
    assert!(run(&conn, &cfg, &["category", "update", &id.to_string(), "--active", "maybe"]).is_err());

    run(&conn, &cfg, &["category", "rm", &id.to_string()]).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM categories"), 0);
    assert!(run(&conn, &cfg, &["category", "rm", &id.to_string()]).is_err());
}

#[test]
fn expense_add_classifies_and_uses_config_defaults() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    run(&conn, &cfg, &["category", "add", "Travel", "--description", "Trips", "--color", "#4ECDC4"]).unwrap();
    run(&conn, &cfg, &["rules", "add", "--pattern", "(?i)uber", "--category", "Travel"]).unwrap();

    run(
        &conn,
        &cfg,
        &["expense", "add", "--amount", " 18.40 ", "--description", "Uber downtown", "--date", "2024-05-01"],
    )
    .unwrap();

    let (user, currency, amount, date, category): (String, String, String, String, String) = conn
        .query_row(
            "SELECT e.user_name, e.currency, e.amount, e.expense_date, c.name
             FROM expenses e JOIN categories c ON c.id=e.category_id",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(user, "ana");
    assert_eq!(currency, "USD");
    assert_eq!(amount, "18.40");
    assert_eq!(date, "2024-05-01T00:00:00+00:00");
    assert_eq!(category, "Travel");
}

#[test]
fn expense_add_rejects_invalid_input() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    assert!(run(&conn, &cfg, &["expense", "add", "--amount", "-2", "--description", "Oops"]).is_err());
    assert!(run(&conn, &cfg, &["expense", "add", "--amount", "2", "--description", "x", "--currency", "XYZ"]).is_err());
    assert!(run(&conn, &cfg, &["expense", "add", "--amount", "2", "--description", "x", "--category", "Nope"]).is_err());

    let anonymous = AppConfig::default();
    assert!(run(&conn, &anonymous, &["expense", "add", "--amount", "2", "--description", "x"]).is_err());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM expenses"), 0);
}

#[test]
fn expense_update_and_remove() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    run(&conn, &cfg, &["expense", "add", "--amount", "5", "--description", "Snack"]).unwrap();
    let id = count(&conn, "SELECT id FROM expenses").to_string();

    run(&conn, &cfg, &["expense", "update", &id, "--amount", "6.25", "--method", "Cash"]).unwrap();
    let (amount, method): (String, String) = conn
        .query_row("SELECT amount, payment_method FROM expenses", [], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap();
    assert_eq!(amount, "6.25");
    assert_eq!(method, "Cash");

    assert!(run(&conn, &cfg, &["expense", "update", &id]).is_err());
    run(&conn, &cfg, &["expense", "list", "--jsonl"]).unwrap();
    run(&conn, &cfg, &["expense", "rm", &id]).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM expenses"), 0);
}

#[test]
fn export_writes_csv() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    run(&conn, &cfg, &["expense", "add", "--amount", "9.99", "--description", "Book", "--notes", "gift"]).unwrap();

    let out = NamedTempFile::new().unwrap();
    let path = out.path().to_str().unwrap().to_string();
    run(&conn, &cfg, &["expense", "export", "--format", "CSV", "--out", &path]).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("id,expense_date,user_name,description,amount,currency,category,payment_method,notes")
    );
    let row = lines.next().unwrap();
    assert!(row.contains(",ana,Book,9.99,USD,,Other,gift"), "{}", row);

    assert!(run(&conn, &cfg, &["expense", "export", "--format", "xml", "--out", &path]).is_err());
}

#[test]
fn rules_reject_invalid_patterns() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    run(&conn, &cfg, &["category", "add", "Food", "--description", "Meals", "--color", "#FF6B6B"]).unwrap();
    let err = run(&conn, &cfg, &["rules", "add", "--pattern", "([", "--category", "Food"]).unwrap_err();
    assert!(err.to_string().contains("Invalid regex pattern"));
    assert!(run(&conn, &cfg, &["rules", "add", "--pattern", "x", "--category", "Missing"]).is_err());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM rules"), 0);
}

#[test]
fn validate_reports_invalid_responses() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();

    let mut good = NamedTempFile::new().unwrap();
    write!(good, r#"{{"action": "help", "success": true, "message": " Hi "}}"#).unwrap();
    good.flush().unwrap();
    run(&conn, &cfg, &["validate", "--file", good.path().to_str().unwrap()]).unwrap();

    let mut bad = NamedTempFile::new().unwrap();
    write!(
        bad,
        r#"{{"action": "create_expense", "success": true, "message": "x", "requires_clarification": true}}"#
    )
    .unwrap();
    bad.flush().unwrap();
    let err = run(&conn, &cfg, &["validate", "--file", bad.path().to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("failed validation"));
}

#[test]
fn session_replays_turns_in_order() {
    let conn = db::open_in_memory().unwrap();
    let lines = [
        r#"{"input": "coffee 3", "response": {"action": "create_expense", "success": true, "message": "ok", "expense_data": {"amount": "3", "description": "Coffee"}}}"#,
        "",
        r#"{"input": "totals?", "response": {"action": "get_summary", "success": true, "message": "ok"}}"#,
        r#"{"input": "hmm"}"#,
    ]
    .join("\n");

    let mut ctx = ConversationContext::new(Some("ana"));
    ctx.set_default_currency(expenses_agent::models::Currency::Gbp);
    let (responses, ctx) = session::replay(&conn, ctx, Cursor::new(lines)).unwrap();

    assert_eq!(responses.len(), 3);
    assert!(responses[0].success());
    assert_eq!(responses[1].message(), "1 expense recorded: 3 GBP.");
    assert!(responses[2].requires_clarification());
    assert_eq!(ctx.history().len(), 6);
    assert_eq!(ctx.last_action, Some(ActionType::Unclear));

    let broken = Cursor::new("not json\n");
    assert!(session::replay(&conn, ConversationContext::default(), broken).is_err());
}

#[test]
fn session_command_reads_a_file() {
    let conn = db::open_in_memory().unwrap();
    let cfg = cfg();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"input": "help", "response": {{"action": "help", "success": true, "message": "Sure"}}}}"#
    )
    .unwrap();
    file.flush().unwrap();
    let path = format!("  {}  ", file.path().to_str().unwrap());
    run(&conn, &cfg, &["session", "--file", &path, "--currency", "cad"]).unwrap();
}
