pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::catalog::CatalogKind;

#[derive(Debug, Parser)]
#[command(
    name = "procura",
    about = "Procura operator CLI",
    long_about = "Inspect Procura configuration, readiness, agent tools, and reference catalogs.",
    after_help = "Examples:\n  procura doctor --json\n  procura config\n  procura tools\n  procura catalog suppliers --search epoxy"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, reference catalogs, and llm endpoint readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Call the llm endpoint's model listing instead of only checking config")]
        probe: bool,
    },
    #[command(about = "Print the tool definitions offered to the model as JSON")]
    Tools,
    #[command(about = "List reference catalog entries as JSON summaries")]
    Catalog {
        #[arg(value_enum)]
        kind: CatalogKind,
        #[arg(long, help = "Case-insensitive keyword filter")]
        search: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json, probe } => commands::doctor::run(json, probe),
        Command::Tools => commands::tools::run(),
        Command::Catalog { kind, search } => commands::catalog::run(kind, search.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
