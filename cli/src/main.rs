//! SHADE Operator CLI
//!
//! Command-line tools for hidden-limit orders: circuit key setup, commitments,
//! proofs, verification and a local fill run.
//!
//! # Usage
//!
//! ```bash
//! # Generate circuit keys
//! shade setup
//!
//! # Commit to hidden limits (prints the commitment and nonce)
//! shade commit --price 2000 --amount 10
//!
//! # Prove an offer against the limits
//! shade prove --price 2000 --amount 10 --nonce 123456789 \
//!     --offered-price 2100 --offered-amount 50 --output proof.json
//!
//! # Verify the proof and evaluate its predicate data
//! shade verify --proof proof.json
//! shade predicate --proof proof.json
//!
//! # Walk one fill through all steps against an in-memory chain
//! shade fill --price 2000 --amount 10 --offered-price 2100 --offered-amount 50
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::{
    CommitCommand, Context, FillCommand, PredicateCommand, ProveCommand, SetupCommand,
    VerifyCommand,
};
use config::{default_data_dir, ShadeConfig};

/// SHADE hidden-limit orders
#[derive(Parser)]
#[command(name = "shade")]
#[command(author = "SHADE Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hidden-limit order proofs and fill authorization", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, global = true, env = "SHADE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate circuit keys
    Setup(SetupCommand),

    /// Commit to hidden limits
    Commit(CommitCommand),

    /// Generate a proof for an offer
    Prove(ProveCommand),

    /// Verify a proof file
    Verify(VerifyCommand),

    /// Evaluate a proof file's predicate data
    Predicate(PredicateCommand),

    /// Run one fill against an in-memory chain
    Fill(FillCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let mut config = ShadeConfig::resolve(cli.config.as_deref(), &data_dir)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json_logs {
        config.logging.format = "json".to_string();
    }

    logging::init(&config.logging)?;

    let ctx = Context { data_dir, config };
    match cli.command {
        Commands::Setup(cmd) => cmd.execute(&ctx).await,
        Commands::Commit(cmd) => cmd.execute(&ctx).await,
        Commands::Prove(cmd) => cmd.execute(&ctx).await,
        Commands::Verify(cmd) => cmd.execute(&ctx).await,
        Commands::Predicate(cmd) => cmd.execute(&ctx).await,
        Commands::Fill(cmd) => cmd.execute(&ctx).await,
        Commands::Version => {
            println!("shade {}", env!("CARGO_PKG_VERSION"));
            println!("Circuit: {}", shade_zk::CIRCUIT_VERSION);
            println!("Range bits: {}", shade_zk::RANGE_BITS);
            Ok(())
        }
    }
}
