use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use trendwatch_core::TrendConfig;
use trendwatch_server::admin::{set_settings, show_settings};
use trendwatch_server::daemon::open_store;
use trendwatch_server::tracing_setup::init_tracing;
use trendwatch_server::{run_daemon, PostInput};

#[derive(Parser)]
#[command(name = "trendwatch")]
#[command(about = "Trending topics for a social post stream")]
struct Cli {
    /// Path to JSON config file (default: ~/.config/trendwatch/config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Override the HTTP bind address
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Override the data directory (holds trendwatch.db)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest posts and serve trends (default)
    Serve {
        /// Read NDJSON posts from this file instead of stdin
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
    },

    /// Inspect or replace the stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings as JSON
    Show,

    /// Replace settings with the contents of a JSON file
    Set {
        /// Settings JSON file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(&cli);

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Option<Commands>, config: TrendConfig) -> Result<()> {
    match command.unwrap_or(Commands::Serve { input: None }) {
        Commands::Serve { input } => {
            let input = input.map_or(PostInput::Stdin, PostInput::File);
            let runtime = tokio::runtime::Runtime::new()?;
            let result = runtime.block_on(run_daemon(config, input));
            // A stdin read parked on the blocking pool must not hold the exit.
            runtime.shutdown_timeout(Duration::from_secs(1));
            result
        }
        Commands::Settings { action } => {
            let store = open_store(&config)?;
            match action {
                SettingsAction::Show => println!("{}", show_settings(&store)?),
                SettingsAction::Set { file } => {
                    set_settings(&store, &file)?;
                    println!("Settings saved; the service applies them on its next refresh.");
                }
            }
            Ok(())
        }
    }
}

/// Load configuration from file, then apply command-line overrides
fn load_config(cli: &Cli) -> TrendConfig {
    // Priority: --config > ~/.config/trendwatch/config.json > defaults
    let path = cli.config.clone().or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("trendwatch").join("config.json"))
            .filter(|path| path.exists())
    });

    let mut config = match path {
        Some(ref path) => match TrendConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
        None => TrendConfig::default(),
    };

    if let Some(ref bind) = cli.bind {
        config.bind_addr = bind.clone();
    }
    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    config
}
