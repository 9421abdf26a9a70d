//! intramom CLI binary.
//!
//! Computes intraday momentum loadings, weights them into the synthetic
//! factor, and backtests the factor.

mod cmd;
mod config;
mod data;

use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::loadings::LoadingsArgs;
use crate::config::Settings;

#[derive(Parser)]
#[command(name = "intramom")]
#[command(about = "Intraday momentum factor research", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute factor loadings m0..m4 and m_normal
    Loadings {
        /// Start date (YYYY-MM-DD); the only date when --end is omitted
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Compute on every trading day instead of month ends only
        #[arg(long)]
        all_days: bool,

        /// Persist tables to the factor database
        #[arg(long)]
        save: bool,

        /// Paired return-days per loading
        #[arg(long, default_value = "20")]
        days: usize,

        /// Securities computed concurrently
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Pause between dates in seconds
        #[arg(long, default_value = "360")]
        cooldown_secs: u64,
    },

    /// Weight stored loadings into the synthetic factor
    Synthesize {
        /// Start date (YYYY-MM-DD); the only date when --end is omitted
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Synthesize every trading day instead of month ends only
        #[arg(long)]
        all_days: bool,

        /// Persist tables to the factor database
        #[arg(long)]
        save: bool,
    },

    /// Run the monthly rebalanced backtest
    Backtest {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intramom=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    tracing::debug!(?settings, "settings loaded");

    match cli.command {
        Commands::Loadings {
            start,
            end,
            all_days,
            save,
            days,
            workers,
            cooldown_secs,
        } => {
            let args = LoadingsArgs {
                start,
                end,
                all_days,
                save,
                days,
                workers,
                cooldown_secs,
            };
            cmd::loadings::run_loadings(&settings, args).await?;
        }
        Commands::Synthesize {
            start,
            end,
            all_days,
            save,
        } => {
            cmd::synthesize::run_synthesize(&settings, &start, end.as_deref(), all_days, save)?;
        }
        Commands::Backtest { start, end, format } => {
            cmd::backtest::run_backtest(&settings, &start, &end, &format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_loadings_defaults() {
        let cli = Cli::parse_from(["intramom", "loadings", "--start", "2024-01-31"]);
        let Commands::Loadings {
            end,
            all_days,
            save,
            days,
            workers,
            cooldown_secs,
            ..
        } = cli.command
        else {
            panic!("expected loadings");
        };
        assert!(end.is_none());
        assert!(!all_days);
        assert!(!save);
        assert_eq!(days, 20);
        assert_eq!(workers, 4);
        assert_eq!(cooldown_secs, 360);
    }
}
