//! Gantry CLI entrypoint.

use clap::Parser;

mod bus;
mod commands;
mod git;
mod handlers;

use commands::Commands;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about = "Gantry CI command-line interface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => handlers::validate(config.as_deref()).await?,
        Commands::Jobs { config } => handlers::jobs(config.as_deref()).await?,
        Commands::Resolve { job, config } => handlers::resolve(&job, config.as_deref()).await?,
        Commands::Dispatch {
            trigger,
            files,
            workspace,
            config,
        } => handlers::dispatch(trigger.into(), files, workspace, config.as_deref()).await?,
    }

    Ok(())
}
