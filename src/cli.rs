// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Output JSON"))
        .arg(arg!(--jsonl "Output JSON lines").conflicts_with("json"))
}

fn today_arg() -> Arg {
    arg!(--today <DATE> "Reference date YYYY-MM-DD (defaults to the local date)").required(false)
}

pub fn build_cli() -> Command {
    Command::new("finboard")
        .about("Personal finance board: budgets, recurring items, funding and retirement projections")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            arg!(--config <PATH> "Config file (TOML)")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"log-level" <LEVEL> "Log filter, e.g. info or finboard=debug")
                .global(true)
                .required(false)
                .default_value("warn"),
        )
        .arg(
            arg!(--user <EMAIL> "Acting user, checked against the allow-list")
                .required(false)
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(<name> "Category name"))
                        .arg(
                            arg!(--"type" <TYPE> "expense|income|both")
                                .required(false)
                                .default_value("expense"),
                        )
                        .arg(
                            arg!(--cycle <CYCLE> "monthly|bimonthly|quarterly|annual")
                                .required(false)
                                .default_value("monthly"),
                        )
                        .arg(arg!(--icon <ICON>).required(false))
                        .arg(arg!(--color <COLOR>).required(false)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--merchant <MERCHANT>).required(true))
                        .arg(arg!(--"type" <TYPE> "expense|income").required(false).default_value("expense"))
                        .arg(arg!(--currency <CCY>).required(false))
                        .arg(arg!(--"amount-home" <AMOUNT> "Amount in home currency").required(false))
                        .arg(arg!(--category <NAME>).required(false))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--owner <OWNER>).required(false))
                        .arg(
                            arg!(--tag <TAG>)
                                .required(false)
                                .action(ArgAction::Append),
                        )
                        .arg(arg!(--"coverage-start" <DATE>).required(false))
                        .arg(arg!(--"coverage-end" <DATE>).required(false)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(arg!(--from <DATE>).required(false))
                        .arg(arg!(--to <DATE>).required(false))
                        .arg(arg!(--category <NAME>).required(false))
                        .arg(
                            arg!(--limit <N>)
                                .required(false)
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets per category and month")
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--month <MONTH> "YYYY-MM").required(true))
                        .arg(arg!(--category <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT> "Limit for the whole billing cycle").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(arg!(--month <MONTH> "YYYY-MM").required(false)),
                ))
                .subcommand(json_flags(
                    Command::new("status").arg(arg!(--month <MONTH> "YYYY-MM").required(true)),
                ))
                .subcommand(json_flags(
                    Command::new("trend")
                        .arg(arg!(--category <NAME>).required(true))
                        .arg(arg!(--month <MONTH> "Last month shown, YYYY-MM").required(true))
                        .arg(
                            arg!(--months <N>)
                                .required(false)
                                .default_value("6")
                                .value_parser(value_parser!(u32)),
                        ),
                )),
        )
        .subcommand(
            Command::new("recurring")
                .about("Subscriptions and other recurring charges")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--frequency <FREQ> "weekly|biweekly|monthly|quarterly|yearly").required(true))
                        .arg(arg!(--"next-due" <DATE>).required(true))
                        .arg(arg!(--currency <CCY>).required(false))
                        .arg(arg!(--category <NAME>).required(false))
                        .arg(arg!(--merchant <MERCHANT>).required(false)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("pause").arg(arg!(<name>)))
                .subcommand(Command::new("resume").arg(arg!(<name>))),
        )
        .subcommand(
            Command::new("income")
                .about("Income sources posted by the sweep")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--frequency <FREQ>).required(true))
                        .arg(arg!(--"type" <TYPE>).required(false).default_value("salary"))
                        .arg(arg!(--category <NAME>).required(false)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("msi")
                .about("Interest-free installment plans")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT> "Installment amount").required(true))
                        .arg(
                            arg!(--count <N>)
                                .required(true)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(
                            arg!(--paid <N> "Payments already made")
                                .required(false)
                                .default_value("0")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(arg!(--merchant <MERCHANT>).required(false))
                        .arg(arg!(--category <NAME>).required(false)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("sweep")
                .about("Post due recurring items")
                .subcommand(json_flags(Command::new("run").arg(today_arg()))),
        )
        .subcommand(
            Command::new("target")
                .about("The active funding target")
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--delivery <DATE>).required(true))
                        .arg(arg!(--"return" <RATE> "Investment annual return, e.g. 0.095").required(true))
                        .arg(arg!(--paid <AMOUNT>).required(false).default_value("0"))
                        .arg(arg!(--"monthly-payment" <AMOUNT>).required(false))
                        .arg(arg!(--"payment-end" <DATE>).required(false))
                        .arg(arg!(--"lump-sum" <AMOUNT>).required(false))
                        .arg(arg!(--"lump-sum-date" <DATE>).required(false))
                        .arg(arg!(--"sale-proceeds" <AMOUNT>).required(false))
                        .arg(arg!(--"sale-date" <DATE>).required(false))
                        .arg(
                            arg!(--"payoff-debt" <NAME>)
                                .required(false)
                                .action(ArgAction::Append),
                        )
                        .arg(arg!(--appreciation <RATE>).required(false).default_value("0"))
                        .arg(arg!(--"property-value" <AMOUNT>).required(false).default_value("0"))
                        .arg(arg!(--"fixed-transfer" <AMOUNT>).required(false)),
                )
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            Command::new("debt")
                .about("Debts that can be paid off from sale proceeds")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--balance <AMOUNT>).required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(json_flags(
            Command::new("projection")
                .about("Project the funding target month by month")
                .arg(today_arg())
                .arg(arg!(--offline "Skip the price feed; crypto is reported as unavailable")),
        ))
        .subcommand(
            Command::new("retirement")
                .about("AFORE and Infonavit balances")
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--instrument <KIND> "afore|infonavit").required(true))
                        .arg(arg!(--owner <OWNER>).required(true))
                        .arg(arg!(--balance <AMOUNT>).required(true))
                        .arg(arg!(--rate <RATE>).required(false))
                        .arg(
                            arg!(--age <AGE>)
                                .required(false)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(arg!(--usable "Counts toward the funding target"))
                        .arg(arg!(--updated <DATE>).required(false)),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(json_flags(Command::new("project").arg(today_arg()))),
        )
        .subcommand(
            Command::new("holdings")
                .about("Live balance sources")
                .subcommand(
                    Command::new("ledger-add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--note <NOTE>).required(false)),
                )
                .subcommand(
                    Command::new("crypto-add")
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--quantity <QTY>).required(true)),
                )
                .subcommand(json_flags(Command::new("crypto-list")))
                .subcommand(json_flags(
                    Command::new("balances")
                        .arg(arg!(--offline "Skip the price feed")),
                )),
        )
        .subcommand(
            Command::new("insights")
                .about("Generated insights, cached for a day")
                .subcommand(json_flags(
                    Command::new("show")
                        .arg(arg!(--refresh "Regenerate even if the cache is fresh"))
                        .arg(arg!(--offline "Skip the price feed when regenerating")),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Import data")
                .subcommand(
                    Command::new("transactions")
                        .arg(arg!(--path <PATH> "CSV file").required(true)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(arg!(--format <FORMAT> "csv|json").required(true))
                        .arg(arg!(--out <PATH>).required(true)),
                ),
        )
}
