//! # Sign Transfer CLI
//!
//! Command-line interface for cloning library document templates between
//! e-signature user accounts.

mod cli;

use clap::{Parser, Subcommand};
use sign_transfer::{ClientConfig, ClientResult};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{handle_config_command, handle_template_command};

#[derive(Parser, Debug)]
#[command(name = "sign-transfer")]
#[command(about = "Clone e-signature library document templates between user accounts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: ./sign-transfer.toml or ~/.sign-transfer/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Library document template operations
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommands {
    /// Clone one template and print the new template ID
    Clone {
        /// Template (library document) ID
        #[arg(value_name = "TEMPLATE_ID")]
        template_id: String,
        /// Account to read the template as (default: transfer.sender)
        #[arg(short, long)]
        sender: Option<String>,
        /// Account to create the copy as (default: transfer.receiver)
        #[arg(short, long)]
        receiver: Option<String>,
        /// Use one session that switches acting user between phases
        #[arg(long)]
        single_session: bool,
    },
    /// Clone several templates; without IDs, every template the sender can list
    BulkClone {
        /// Template IDs to clone
        #[arg(value_name = "TEMPLATE_ID")]
        ids: Vec<String>,
        /// Account to read the templates as (default: transfer.sender)
        #[arg(short, long)]
        sender: Option<String>,
        /// Account to create the copies as (default: transfer.receiver)
        #[arg(short, long)]
        receiver: Option<String>,
        /// Stop at the first failed template
        #[arg(long)]
        fail_fast: bool,
    },
    /// List every template ID visible to an account
    List {
        /// Account to list as
        #[arg(short, long)]
        as_user: Option<String>,
    },
    /// Show a template's metadata and documents
    Get {
        /// Template (library document) ID
        #[arg(value_name = "TEMPLATE_ID")]
        template_id: String,
        /// Account to read the template as
        #[arg(short, long)]
        as_user: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Output path (default: ~/.sign-transfer/config.toml)
        #[arg(short, long)]
        path: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<ExitCode> {
    let config = match cli.config {
        Some(config_path) => ClientConfig::load_with_file(std::path::Path::new(&config_path))?,
        None => ClientConfig::load()?,
    };

    info!(
        base_url = %config.api.api_base_url(),
        "Sign transfer CLI starting"
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Template(template_cmd) => {
            handle_template_command(template_cmd, &config, cancel).await
        }
        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
