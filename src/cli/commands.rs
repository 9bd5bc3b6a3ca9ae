//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::NegotiationConfig;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "bargain")]
#[command(about = "Bargain - two-party price negotiation over TCP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen for one buyer and negotiate as the seller
    Seller {
        #[command(flatten)]
        common: CommonArgs,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Lowest acceptable price
        #[arg(short, long)]
        floor: Option<u64>,
    },

    /// Connect to a seller and negotiate as the buyer
    Buyer {
        #[command(flatten)]
        common: CommonArgs,

        /// Seller address (host:port)
        #[arg(short = 'c', long)]
        connect: Option<String>,

        /// Highest acceptable price
        #[arg(short, long)]
        budget: Option<u64>,
    },

    /// Run seller and buyer in one process
    Demo {
        #[command(flatten)]
        common: CommonArgs,

        /// Port for the seller to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Seller's lowest acceptable price
        #[arg(short, long)]
        floor: Option<u64>,

        /// Buyer's highest acceptable price
        #[arg(short, long)]
        budget: Option<u64>,
    },
}

/// Flags shared by every role
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Round limit
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Consult the local Ollama model before the fallback policy
    #[arg(long)]
    pub use_llm: bool,
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Seller { common, .. }
            | Commands::Buyer { common, .. }
            | Commands::Demo { common, .. } => common,
        }
    }

    /// Load the configuration file and apply this command's flags on top
    pub fn resolve_config(&self) -> Result<NegotiationConfig> {
        let common = self.common();
        let mut config = NegotiationConfig::load_or_default(common.config.as_deref())?;

        if let Some(max_rounds) = common.max_rounds {
            config.session.max_rounds = max_rounds;
        }
        if common.use_llm {
            config.reasoning.enabled = true;
        }

        match self {
            Commands::Seller { port, floor, .. } => {
                apply(&mut config.network.port, *port);
                apply(&mut config.seller.floor, *floor);
            }
            Commands::Buyer { budget, .. } => {
                apply(&mut config.buyer.budget, *budget);
            }
            Commands::Demo {
                port,
                floor,
                budget,
                ..
            } => {
                apply(&mut config.network.port, *port);
                apply(&mut config.seller.floor, *floor);
                apply(&mut config.buyer.budget, *budget);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn apply<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seller_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "bargain",
            "seller",
            "--port",
            "7000",
            "--floor",
            "150000",
            "--max-rounds",
            "6",
        ])
        .unwrap();

        let config = cli.command.resolve_config().unwrap();

        assert_eq!(config.network.port, 7000);
        assert_eq!(config.seller.floor, 150_000);
        assert_eq!(config.session.max_rounds, 6);
        assert_eq!(config.buyer.budget, 200_000);
        assert!(!config.reasoning.enabled);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buyer]\nbudget = 180000\n\n[session]\nmax_rounds = 8").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "bargain", "buyer", "--config", &path, "--budget", "190000", "--use-llm",
        ])
        .unwrap();
        let config = cli.command.resolve_config().unwrap();

        assert_eq!(config.buyer.budget, 190_000);
        assert_eq!(config.session.max_rounds, 8);
        assert!(config.reasoning.enabled);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::try_parse_from(["bargain", "demo", "--max-rounds", "0"]).unwrap();
        assert!(cli.command.resolve_config().is_err());
    }
}
