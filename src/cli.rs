use clap::{Args, Parser, Subcommand};

use curation_ai::error::AppError;

use crate::batch::{run_route_batch, RouteBatchArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Curation Routing Orchestrator",
    about = "Run the candidate-routing workflow service or drive it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run routing workflows against local data
    Route {
        #[command(subcommand)]
        command: RouteCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RouteCommand {
    /// Route a JSON file of analyzed candidates and print the outcome
    Batch(RouteBatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Route {
            command: RouteCommand::Batch(args),
        } => run_route_batch(args).await,
    }
}
