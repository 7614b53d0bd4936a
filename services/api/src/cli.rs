use crate::commands::{run_create_account, run_export_issues, CreateAccountArgs, ExportIssuesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use water_connect::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "water-connect-api",
    about = "Run the WaterConnect service and its maintenance commands",
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
    /// Write open issue reports as CSV from the configured snapshot
    ExportIssues(ExportIssuesArgs),
    /// Register an account, optionally with staff or superuser rights
    CreateAccount(CreateAccountArgs),
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
        Command::ExportIssues(args) => run_export_issues(args),
        Command::CreateAccount(args) => run_create_account(args),
    }
}
