use clap::{Args, Parser, Subcommand};
use kariah::error::AppError;

use crate::demo::{run_demo, run_provider_test, ProviderTestArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "kariah-api",
    about = "Mosque administration service: kariah membership, khairat claims, payment providers",
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
    /// Walk through a membership application, a khairat claim, and provider checks in memory
    Demo,
    /// Payment provider utilities
    Providers {
        #[command(subcommand)]
        command: ProvidersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProvidersCommand {
    /// Check credentials against the live (or sandbox) gateway without saving them
    Test(ProviderTestArgs),
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
        Command::Demo => run_demo().await,
        Command::Providers {
            command: ProvidersCommand::Test(args),
        } => run_provider_test(args).await,
    }
}
