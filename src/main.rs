use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ledgerdesk::cli::{
    handle_db_command, handle_history_command, handle_report_command, DbCommands, ReportCommands,
};
use ledgerdesk::config::{LedgerPaths, Settings};
use ledgerdesk::storage::Storage;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "LEDGERDESK_LOG";

#[derive(Parser)]
#[command(
    name = "ledgerdesk",
    version,
    about = "User-defined tabular databases with formula reports",
    long_about = "ledgerdesk stores rows in databases with a declared schema, imports \
                  CSV or JSON with validation and duplicate detection, and renders \
                  reports with per-row formulas and aggregate summary rows."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Report management commands
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    let storage = Storage::open(paths.clone(), &settings)?;

    match cli.command {
        Some(Commands::Db(cmd)) => handle_db_command(&storage, &settings, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&storage, cmd)?,
        Some(Commands::History { limit }) => handle_history_command(&storage, limit)?,
        Some(Commands::Init) => {
            println!("Initializing ledgerdesk at: {}", paths.base_dir().display());
            if ledgerdesk::storage::initialize_storage(&paths)? {
                println!("Initialization complete!");
            } else {
                println!("Already initialized; nothing to do.");
            }
            println!();
            println!("Run 'ledgerdesk db create --help' to define your first database.");
        }
        Some(Commands::Config) => {
            println!("ledgerdesk Configuration");
            println!("========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Max rows per database: {}", settings.max_rows);
            println!("  Max columns:           {}", settings.max_columns);
            println!("  Audit enabled:         {}", settings.audit_enabled);
            println!("  Log level:             {}", settings.log_level);
            println!("  Preview rows:          {}", settings.preview_rows);
        }
        None => {
            println!("ledgerdesk - user-defined databases with formula reports");
            println!();
            println!("Run 'ledgerdesk --help' for usage information.");
        }
    }

    Ok(())
}
