// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{arg, Arg, ArgAction, Command};

fn output_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print JSON").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Print one JSON object per line").action(ArgAction::SetTrue))
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Row id")
}

fn expense_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(
        arg!(--amount <AMOUNT> "Positive amount")
            .required(required)
            .allow_negative_numbers(true),
    )
        .arg(arg!(--description <TEXT> "What the money was spent on").required(required))
        .arg(arg!(--currency <CODE> "Three-letter currency code"))
        .arg(arg!(--category <NAME> "Category name"))
        .arg(arg!(--method <METHOD> "Payment method, e.g. 'Credit Card'"))
        .arg(arg!(--date <DATE> "Expense date (RFC 3339 or YYYY-MM-DD[ HH:MM])"))
        .arg(arg!(--notes <TEXT> "Free-form notes"))
        .arg(arg!(--user <NAME> "Owner of the expense"))
}

pub fn build_cli() -> Command {
    Command::new("expenses-agent")
        .about("Expense tracking with a validated assistant layer")
        .version(clap::crate_version!())
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database and print its location"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(arg!(--description <TEXT>).required(true))
                        .arg(arg!(--color <HEX> "Display color, e.g. #FF6B6B").required(true))
                        .arg(arg!(--inactive "Create the category disabled").action(ArgAction::SetTrue)),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .arg(arg!(--all "Include inactive categories").action(ArgAction::SetTrue)),
                ))
                .subcommand(
                    Command::new("update")
                        .arg(id_arg())
                        .arg(arg!(--name <NAME>))
                        .arg(arg!(--description <TEXT>))
                        .arg(arg!(--color <HEX>))
                        .arg(arg!(--active <BOOL> "true or false")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("expense")
                .about("Manage expenses")
                .subcommand(expense_fields(Command::new("add"), true))
                .subcommand(output_flags(
                    Command::new("list")
                        .arg(arg!(--user <NAME>))
                        .arg(arg!(--category <NAME>))
                        .arg(arg!(--limit <N>)),
                ))
                .subcommand(expense_fields(Command::new("update").arg(id_arg()), false))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("export")
                        .arg(arg!(--format <FMT> "csv|json").required(true))
                        .arg(arg!(--out <PATH>).required(true))
                        .arg(arg!(--user <NAME>)),
                ),
        )
        .subcommand(
            Command::new("rules")
                .about("Manage classification rules")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--pattern <REGEX> "Matched against descriptions").required(true))
                        .arg(arg!(--category <NAME>).required(true)),
                )
                .subcommand(output_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(output_flags(
            Command::new("classify")
                .about("Suggest a category for a description")
                .arg(arg!(--description <TEXT>).required(true)),
        ))
        .subcommand(output_flags(
            Command::new("summary")
                .about("Totals per currency")
                .arg(arg!(--user <NAME>)),
        ))
        .subcommand(
            Command::new("validate")
                .about("Validate an assistant response stored as JSON")
                .arg(arg!(--file <PATH>).required(true)),
        )
        .subcommand(
            Command::new("session")
                .about("Replay a JSON-lines conversation through the assistant")
                .arg(arg!(--file <PATH> "Lines of {\"input\": .., \"response\": {..}}").required(true))
                .arg(arg!(--user <NAME>))
                .arg(arg!(--currency <CODE> "Default currency for the session")),
        )
}
