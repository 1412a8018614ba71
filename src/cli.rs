//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{BreakdownDimension, YearRange, MAX_YEAR_SPAN};
use crate::purchases::{parse_purchase, Purchase};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SpendScope - how much money does the federal government spend?
///
/// Pick a federal agency and compare its spending across fiscal years,
/// sub-agencies, budget functions, and other agencies, using data from
/// the public USAspending API.
///
/// Examples:
///   spendscope agencies --filter energy
///   spendscope history "Department of Energy"
///   spendscope subagencies 012 --format json
///   spendscope compare NASA "Department of Energy"
///   spendscope breakdown 080 --by object-class
///   spendscope budget 080 --buy clean-water=2 --buy mona-lisa
///   spendscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .spendscope.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// USAspending API root URL
    #[arg(long, value_name = "URL", env = "SPENDSCOPE_API_URL", global = true)]
    pub base_url: Option<String>,

    /// Agency directory source: "api", a CSV URL, or a CSV file path
    #[arg(long, value_name = "SOURCE", env = "SPENDSCOPE_DIRECTORY", global = true)]
    pub directory: Option<String>,

    /// First fiscal year to fetch (default: 2008)
    #[arg(long, value_name = "YEAR", global = true)]
    pub from_year: Option<i32>,

    /// Last fiscal year to fetch (default: 2022)
    #[arg(long, value_name = "YEAR", global = true)]
    pub to_year: Option<i32>,

    /// Fiscal year used for breakdowns and the budget calculator (default: 2021)
    #[arg(long, value_name = "YEAR", global = true)]
    pub breakdown_year: Option<i32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Fetch fiscal years one at a time instead of concurrently
    #[arg(long, global = true)]
    pub sequential: bool,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .spendscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List agencies in the directory
    Agencies {
        /// Only show agencies whose name contains this text
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Yearly spending of one agency
    History {
        /// Agency name (case-insensitive) or CGAC code
        agency: String,
    },

    /// Yearly spending of one agency, split by sub-agency
    Subagencies {
        /// Agency name (case-insensitive) or CGAC code
        agency: String,
    },

    /// Yearly spending of two agencies side by side
    Compare {
        /// First agency
        agency: String,
        /// Agency to compare against
        other: String,
    },

    /// One year of an agency's spending, split by budget function or object class
    Breakdown {
        /// Agency name (case-insensitive) or CGAC code
        agency: String,

        /// Dimension to split spending by
        #[arg(long, value_enum, default_value = "budget-function")]
        by: BreakdownDimension,
    },

    /// What could we pay for with an agency's spending?
    Budget {
        /// Agency name (case-insensitive) or CGAC code
        agency: String,

        /// Item to buy, as ITEM=QTY (repeatable; see `items`)
        #[arg(long = "buy", value_name = "ITEM=QTY", value_parser = parse_purchase)]
        buy: Vec<Purchase>,
    },

    /// List the items the budget calculator knows about
    Items,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (try --help)".to_string());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(format!(
                    "--from-year ({}) must not be after --to-year ({})",
                    from, to
                ));
            }
            if YearRange::new(from, to).is_err() {
                return Err(format!(
                    "--from-year and --to-year may span at most {} fiscal years",
                    MAX_YEAR_SPAN
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(Command::Compare { agency, other }) = &self.command {
            if agency.trim().eq_ignore_ascii_case(other.trim()) {
                return Err(
                    "In order to compare, you have to choose a different agency!".to_string(),
                );
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: Some(Command::History {
                agency: "080".to_string(),
            }),
            config: None,
            base_url: None,
            directory: None,
            from_year: None,
            to_year: None,
            breakdown_year: None,
            timeout: None,
            sequential: false,
            format: None,
            output: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_compare() {
        let args = Args::try_parse_from([
            "spendscope",
            "compare",
            "NASA",
            "Department of Energy",
            "--sequential",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(args.sequential);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(matches!(
            args.command,
            Some(Command::Compare { ref agency, ref other })
                if agency == "NASA" && other == "Department of Energy"
        ));
    }

    #[test]
    fn test_parse_breakdown_dimension() {
        let args =
            Args::try_parse_from(["spendscope", "breakdown", "080", "--by", "object-class"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Breakdown {
                by: BreakdownDimension::ObjectClass,
                ..
            })
        ));

        let args = Args::try_parse_from(["spendscope", "breakdown", "080"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Breakdown {
                by: BreakdownDimension::BudgetFunction,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_budget_purchases() {
        let args = Args::try_parse_from([
            "spendscope",
            "budget",
            "080",
            "--buy",
            "clean-water=2",
            "--buy",
            "wizards",
        ])
        .unwrap();
        match args.command {
            Some(Command::Budget { buy, .. }) => {
                assert_eq!(buy.len(), 2);
                assert_eq!(buy[0].quantity, 2);
                assert_eq!(buy[1].item.key, "wizards");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Args::try_parse_from(["spendscope", "budget", "080", "--buy", "yacht"]).is_err());
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.base_url = Some("api.usaspending.gov".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_year_order() {
        let mut args = make_args();
        args.from_year = Some(2020);
        args.to_year = Some(2010);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_year_span() {
        let mut args = make_args();
        args.from_year = Some(i32::MIN);
        args.to_year = Some(i32::MAX);
        assert!(args.validate().is_err());

        args.from_year = Some(2008);
        args.to_year = Some(2022);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_same_agency() {
        let mut args = make_args();
        args.command = Some(Command::Compare {
            agency: "NASA".to_string(),
            other: "nasa".to_string(),
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
