use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::ModelKind;
use pricing_engine::{OptionLeg, OptionType};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "optcalc.yaml";

#[derive(Parser, Debug)]
#[command(name = "optcalc")]
#[command(about = "Option price and strategy P&L matrices over trading time")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file; built-in defaults are used when it is absent
    #[arg(short, long, global = true, env = "OPTCALC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the configured HTTP port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate the configuration file and print the report
    Validate,

    /// Write a configuration file with all defaults
    Init {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },

    /// Print the calculation time and whether the market is open
    MarketStatus,

    /// Print the price range of one option across the candidate rates
    Price {
        #[arg(long = "type", default_value = "call")]
        option_type: OptionType,

        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Time to expiration in years
        #[arg(long)]
        years: f64,

        /// Annualized volatility as a fraction, e.g. 0.25
        #[arg(long)]
        vol: f64,

        #[arg(long)]
        model: Option<ModelKind>,
    },

    /// Print a single-option premium table as JSON
    Table {
        #[arg(long)]
        strike: f64,

        #[arg(long = "type", default_value = "call")]
        option_type: OptionType,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print a strategy P&L table as JSON
    Strategy {
        /// Leg as action:type:strike, e.g. buy:call:150 (repeatable)
        #[arg(long = "leg", required = true)]
        legs: Vec<OptionLeg>,

        #[command(flatten)]
        grid: GridArgs,
    },
}

/// Inputs shared by the table commands
#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    #[arg(long)]
    pub spot: f64,

    /// Annualized volatility as a fraction, e.g. 0.25
    #[arg(long)]
    pub vol: f64,

    /// Expiration day; the option expires at that day's close
    #[arg(long)]
    pub expiration: NaiveDate,

    /// Calculation time (RFC 3339); defaults to the current market instant
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Spacing of the stock-price rows
    #[arg(long, default_value_t = 1.0)]
    pub increment: f64,

    #[arg(long)]
    pub model: Option<ModelKind>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_engine::LegAction;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_with_global_options() {
        let cli = Cli::try_parse_from([
            "optcalc",
            "serve",
            "--port",
            "6001",
            "--config",
            "prod.yaml",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("prod.yaml"));
        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        assert!(matches!(cli.command, Commands::Serve { port: Some(6001) }));
    }

    #[test]
    fn test_price_command() {
        let cli = Cli::try_parse_from([
            "optcalc", "price", "--type", "put", "--spot", "100", "--strike", "95", "--years",
            "0.5", "--vol", "0.2", "--model", "analytic",
        ])
        .unwrap();

        match cli.command {
            Commands::Price {
                option_type,
                strike,
                model,
                ..
            } => {
                assert_eq!(option_type, OptionType::Put);
                assert_eq!(strike, 95.0);
                assert_eq!(model, Some(ModelKind::Analytic));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_strategy_legs() {
        let cli = Cli::try_parse_from([
            "optcalc",
            "strategy",
            "--spot",
            "150",
            "--vol",
            "0.25",
            "--expiration",
            "2025-06-20",
            "--leg",
            "buy:call:150",
            "--leg",
            "sell:call:160",
        ])
        .unwrap();

        match cli.command {
            Commands::Strategy { legs, grid } => {
                assert_eq!(legs.len(), 2);
                assert_eq!(legs[1].action, LegAction::Sell);
                assert_eq!(legs[1].strike, 160.0);
                assert_eq!(grid.increment, 1.0);
                assert_eq!(grid.expiration, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
                assert!(grid.start.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_strategy_requires_a_leg() {
        let result = Cli::try_parse_from([
            "optcalc",
            "strategy",
            "--spot",
            "150",
            "--vol",
            "0.25",
            "--expiration",
            "2025-06-20",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_table_with_start() {
        let cli = Cli::try_parse_from([
            "optcalc",
            "table",
            "--strike",
            "150",
            "--spot",
            "150",
            "--vol",
            "0.3",
            "--expiration",
            "2025-06-13",
            "--start",
            "2025-06-06T14:00:00Z",
            "--increment",
            "2.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Table { option_type, grid, .. } => {
                assert_eq!(option_type, OptionType::Call);
                assert_eq!(grid.increment, 2.5);
                assert_eq!(grid.start.unwrap().to_rfc3339(), "2025-06-06T14:00:00+00:00");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
