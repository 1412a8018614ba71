//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.spendscope.toml` files.

use crate::api::{FetchMode, ServiceSettings, DEFAULT_BASE_URL};
use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::models::{YearRange, BREAKDOWN_FISCAL_YEAR, FIRST_FISCAL_YEAR, LAST_FISCAL_YEAR};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".spendscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// USAspending API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Agency directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report file path; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// USAspending API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// First fiscal year fetched for yearly tables.
    #[serde(default = "default_first_year")]
    pub first_year: i32,

    /// Last fiscal year fetched for yearly tables.
    #[serde(default = "default_last_year")]
    pub last_year: i32,

    /// Fiscal year used for breakdowns and the budget calculator.
    #[serde(default = "default_breakdown_year")]
    pub breakdown_year: i32,

    /// Issue yearly requests concurrently or one at a time.
    #[serde(default)]
    pub fetch_mode: FetchMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            first_year: default_first_year(),
            last_year: default_last_year(),
            breakdown_year: default_breakdown_year(),
            fetch_mode: FetchMode::default(),
        }
    }
}

impl ApiConfig {
    /// The configured fiscal year range.
    pub fn year_range(&self) -> Result<YearRange, ApiError> {
        YearRange::new(self.first_year, self.last_year)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Settings for a [`crate::api::SpendingService`].
    pub fn service_settings(&self) -> Result<ServiceSettings, ApiError> {
        Ok(ServiceSettings {
            years: self.year_range()?,
            breakdown_year: self.breakdown_year,
            mode: self.fetch_mode,
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_first_year() -> i32 {
    FIRST_FISCAL_YEAR
}

fn default_last_year() -> i32 {
    LAST_FISCAL_YEAR
}

fn default_breakdown_year() -> i32 {
    BREAKDOWN_FISCAL_YEAR
}

/// Agency directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// `"api"`, a CSV URL, or a CSV file path.
    #[serde(default = "default_directory_source")]
    pub source: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source: default_directory_source(),
        }
    }
}

fn default_directory_source() -> String {
    "api".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.spendscope.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.base_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(first) = args.from_year {
            self.api.first_year = first;
        }
        if let Some(last) = args.to_year {
            self.api.last_year = last;
        }
        if let Some(year) = args.breakdown_year {
            self.api.breakdown_year = year;
        }
        if args.sequential {
            self.api.fetch_mode = FetchMode::Sequential;
        }

        if let Some(ref source) = args.directory {
            self.directory.source = source.clone();
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
