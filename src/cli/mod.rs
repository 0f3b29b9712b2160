//! CLI module for Adscout
//!
//! Provides commands:
//! - `run`: search keywords and stream job events
//! - `init-db`: create the database schema
//! - `metrics`: aggregate run statistics
//! - `runs`: list recent run records
//! - `events`: show the event journal
//! - `ads`: list stored results or show one by id

use clap::{Parser, Subcommand};

pub mod data;
pub mod run;

/// Adscout CLI
#[derive(Parser, Debug)]
#[command(name = "adscout")]
#[command(about = "Keyword-driven ad library scouting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search keywords and print job events as they arrive
    Run {
        /// Keyword to search (repeatable, order and duplicates kept)
        #[arg(short, long = "keyword", required = true)]
        keywords: Vec<String>,
        /// Country code; defaults to orchestrator.default_country
        #[arg(short, long)]
        country: Option<String>,
    },
    /// Create the database and its tables
    InitDb,
    /// Show aggregate run metrics
    Metrics,
    /// List recent run records
    Runs {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the most recent journaled bus events
    Events {
        /// Maximum number of events to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// List stored results
    Ads {
        /// Show a single result by unique id
        #[arg(long)]
        id: Option<String>,
        /// Only results from this domain
        #[arg(long)]
        domain: Option<String>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run { keywords, country }) => run::run(keywords, country).await,
        Some(Commands::InitDb) => data::init_db().await,
        Some(Commands::Metrics) => data::metrics().await,
        Some(Commands::Runs { limit }) => data::runs(limit).await,
        Some(Commands::Events { limit }) => data::events(limit).await,
        Some(Commands::Ads { id, domain }) => data::ads(id, domain).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_keywords() {
        let cli = Cli::try_parse_from(["adscout", "run", "-k", "k1", "-k", "k2", "-k", "k1", "--country", "BR"])
            .unwrap();
        match cli.command {
            Some(Commands::Run { keywords, country }) => {
                assert_eq!(keywords, vec!["k1", "k2", "k1"]);
                assert_eq!(country.as_deref(), Some("BR"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_keyword() {
        assert!(Cli::try_parse_from(["adscout", "run"]).is_err());
    }

    #[test]
    fn test_parse_ads_filters() {
        let cli = Cli::try_parse_from(["adscout", "ads", "--domain", "k1.example.com"]).unwrap();
        match cli.command {
            Some(Commands::Ads { id, domain }) => {
                assert!(id.is_none());
                assert_eq!(domain.as_deref(), Some("k1.example.com"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["adscout", "events"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Events { limit: 50 })));
    }

    #[test]
    fn test_runs_default_limit() {
        let cli = Cli::try_parse_from(["adscout", "runs"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Runs { limit: 20 })));
    }
}
