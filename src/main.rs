use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use modsync::{Config, Result};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Steam Workshop mod synchronizer for dedicated Arma 3 servers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: <config_dir>/modsync/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the tracked roster against the workshop
    Update {
        /// Steam account (overrides the configured one)
        #[arg(long)]
        account: Option<String>,

        /// Steam password (overrides the configured one)
        #[arg(long)]
        secret: Option<String>,
    },

    /// Import mods from a launcher preset document
    Import {
        /// Preset HTML file
        file: PathBuf,
    },

    /// Show the tracked roster and last known statuses
    List,

    /// Print the server launch mod-line
    Modline {
        /// Path prefix for each mod folder
        #[arg(short, long, default_value = "mods")]
        prefix: String,
    },

    /// Remove every tracked mod from the roster
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Update { account, secret } => {
            modsync::cli::update::run(&config, account, secret).await?;
        }

        Commands::Import { file } => {
            modsync::cli::import::run(&config, &file).await?;
        }

        Commands::List => {
            modsync::cli::list::run(&config)?;
        }

        Commands::Modline { prefix } => {
            modsync::cli::modline::run(&config, &prefix)?;
        }

        Commands::Clear { yes } => {
            modsync::cli::clear::run(&config, yes)?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "modsync", &mut io::stdout());
        }
    }

    Ok(())
}
