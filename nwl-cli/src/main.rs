use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod config;

use commands::{
    ConfigCommand, ExportCommand, ImportCommand, LevelCommand, ListCommand, RecordCommand,
    ReorderCommand, ShowCommand, Workspace,
};
use config::Config;
use nwl_core::{GitHubStore, RemoteStore, RepoLocation, Session, SessionError};

#[derive(Parser)]
#[command(name = "nwl")]
#[command(version)]
#[command(about = "Manage the level files of a No Wave List repository", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List level files
    List(ListCommand),

    /// Show a level and its records
    Show(ShowCommand),

    /// Add, change or remove records
    Record(RecordCommand),

    /// Create, edit or delete levels
    Level(LevelCommand),

    /// Reorder records to follow an order list
    Reorder(ReorderCommand),

    /// Print a level file as canonical JSON
    Export(ExportCommand),

    /// Replace a level file from a local JSON file
    Import(ImportCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if e
            .downcast_ref::<SessionError>()
            .is_some_and(SessionError::is_conflict)
        {
            eprintln!("The file changed on the remote since it was loaded. Run the command again to apply it to the latest version.");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("NWL_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path),
        Some(command) => {
            let store = open_store(&config)?;
            let mut session = Session::new(store);
            let workspace = Workspace::new(config.folder.value.clone());

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(execute_command(command, &mut session, &workspace))
        }
        None => {
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}

fn open_store(config: &Config) -> Result<GitHubStore, Box<dyn std::error::Error>> {
    let location = RepoLocation::parse(&config.repo_url.value)?;
    let token = config.token.as_ref().map(|t| t.value.clone());
    tracing::debug!(repo = %location, folder = %config.folder.value, "using repository");
    Ok(GitHubStore::new(
        config.api_base.value.clone(),
        location,
        token,
    )?)
}

async fn execute_command<S: RemoteStore>(
    command: &Commands,
    session: &mut Session<S>,
    workspace: &Workspace,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List(cmd) => cmd.run(session, workspace).await,
        Commands::Show(cmd) => cmd.run(session, workspace).await,
        Commands::Record(cmd) => cmd.run(session, workspace).await,
        Commands::Level(cmd) => cmd.run(session, workspace).await,
        Commands::Reorder(cmd) => cmd.run(session, workspace).await,
        Commands::Export(cmd) => cmd.run(session, workspace).await,
        Commands::Import(cmd) => cmd.run(session, workspace).await,
        Commands::Config(_) => Ok(()),
    }
}
