use crate::commands::{
    run_add, run_delete, run_expiring, run_init, run_list, run_overview, run_remind, AddArgs,
    DeleteArgs, ExpiringArgs, OverviewArgs, RemindArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use expiry_reminder::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Document Expiry Reminder",
    about = "Track document expiry dates and send reminder emails",
    version
)]
struct Cli {
    /// SQLite registry file (overrides EXPIRY_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Create or migrate the document registry
    Init,
    /// Register an uploaded document
    Add(AddArgs),
    /// List every registered document with its expiry status
    List(OverviewArgs),
    /// Delete a document by id
    ///
    /// Works even when listing fails on an unreadable expiry date: the error
    /// names the offending document id, which can be passed here directly.
    Delete(DeleteArgs),
    /// List documents expiring within a number of days (expired ones included)
    Expiring(ExpiringArgs),
    /// Show all, expired, and approaching-expiry documents
    Overview(OverviewArgs),
    /// Email a reminder for every approaching-expiry document
    Remind(RemindArgs),
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
    let database = cli.database;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, database).await,
        Command::Init => run_init(database),
        Command::Add(args) => run_add(args, database),
        Command::List(args) => run_list(args, database),
        Command::Delete(args) => run_delete(args, database),
        Command::Expiring(args) => run_expiring(args, database),
        Command::Overview(args) => run_overview(args, database),
        Command::Remind(args) => run_remind(args, database),
    }
}
