pub mod args;
pub mod commands;

pub use args::MigrateArgs;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "twin-migrate")]
#[command(version = crate::VERSION)]
#[command(about = "Publish digital twin models and rebind existing twins to the new version")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: dry-run a batch to see how many twins each model will move, then migrate for real."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Upload a model batch and migrate twins of each predecessor version",
        long_about = "Migrate uploads every model found under PATH in one registry call, then, for each model \
`ns;N`, queries all twins bound to `ns;N-1` and patches them to the new model. Models migrate concurrently; \
per-model failures are reported without stopping the others.",
        after_help = "Examples:\n    twin-migrate migrate ./models --endpoint https://my-instance.api.weu.digitaltwins.azure.net\n    twin-migrate migrate room.json --dry-run --format json"
    )]
    Migrate(MigrateArgs),
}

/// Exit status for a finished pipeline, including per-model failures.
pub const EXIT_COMPLETED: u8 = 0;
/// Config invalid, publish rejected, or another fatal error.
pub const EXIT_FATAL: u8 = 1;
/// No model file could be loaded.
pub const EXIT_NO_MODELS: u8 = 2;

pub async fn run(args: Args) -> crate::Result<ExitCode> {
    match args.command {
        Command::Migrate(migrate_args) => commands::migrate(migrate_args).await,
    }
}
