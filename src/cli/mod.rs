pub mod args;
pub mod commands;

pub use args::{LayersArgs, RunArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "laminate")]
#[command(version = crate::VERSION)]
#[command(about = "Layered fix pipeline for component-based UI source files")]
#[command(help_template = HELP_TEMPLATE)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Run the fix pipeline over source files",
        long_about = "Run corrects the requested layer set against the dependency table, then presses each layer onto every input file, validating and rolling back stages that corrupt the code.",
        after_help = "Examples:\n    laminate run src/App.jsx --layers 1,2,3\n    laminate run src/**/*.jsx --dry-run --json"
    )]
    Run(RunArgs),
    #[command(
        about = "List the available fix layers",
        after_help = "Example:\n    laminate layers"
    )]
    Layers(LayersArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Run(run_args) => commands::run(run_args).await,
        Command::Layers(layers_args) => commands::layers(layers_args).await,
    }
}
