pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pazar",
    about = "Pazar assistant operator CLI",
    long_about = "Inspect configuration, check readiness, and ask the market assistant one-off questions.",
    after_help = "Examples:\n  pazar doctor --json\n  pazar config\n  pazar ask \"Domates nerede?\" --offline"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, model credential readiness, and catalog integrity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Resolve one chat message and print the reply JSON")]
    Ask {
        #[arg(help = "Message to send to the assistant")]
        message: String,
        #[arg(long, help = "Skip the model and answer from the keyword matcher")]
        offline: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Ask { message, offline } => commands::ask::run(&message, offline),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
