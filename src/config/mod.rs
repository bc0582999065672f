pub mod toml_config;

use self::toml_config::{SourceConfig, SourceType, TomlConfig};
use crate::adapters::file::DEFAULT_FILE_PATTERN;
use crate::adapters::http::DEFAULT_TIMEOUT_SECONDS;
use crate::adapters::{FileBillingSource, HttpBillingSource};
use crate::core::extractor::TableLayout;
use crate::core::report::OutputFormat;
use crate::domain::ports::BillingSource;
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{validate_url, Validate};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::utils::error::ValidationError;
#[cfg(feature = "cli")]
use chrono::NaiveDate;
#[cfg(feature = "cli")]
use clap::{ArgAction, CommandFactory, Parser};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "billing-fetch")]
#[command(about = "Fetches monthly billing amounts from a utility billing history page")]
#[command(
    long_about = "Fetches monthly billing amounts from a utility billing history page.\n\
                  Without --target-year-month the last 12 months are fetched, newest first."
)]
pub struct CliConfig {
    /// Month to fetch (YYYY-MM). Repeat for several months; they are fetched in the given order
    #[arg(
        short = 't',
        long = "target-year-month",
        value_name = "YYYY-MM",
        num_args = 0..=1,
        default_missing_value = "",
        action = ArgAction::Append
    )]
    pub target_year_month: Option<Vec<String>>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read saved billing pages from this directory
    #[arg(long, value_name = "DIR", conflicts_with = "endpoint")]
    pub source_dir: Option<PathBuf>,

    /// Fetch billing pages from this URL; `{year}` is replaced by the year
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Reference date for resolving months (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Raw `--target-year-month` values, `None` when the flag was not given.
    ///
    /// An occurrence without a value parses as `""`; any such occurrence makes
    /// the whole option invalid, even next to valued ones.
    pub fn target_tokens(&self) -> std::result::Result<Option<&[String]>, ValidationError> {
        match &self.target_year_month {
            None => Ok(None),
            Some(values) if values.is_empty() || values.iter().any(|v| v.is_empty()) => {
                Err(ValidationError::EmptyOption)
            }
            Some(values) => Ok(Some(values.as_slice())),
        }
    }

    /// What to print on stderr when a run fails. Usage errors get the usage line.
    pub fn failure_message(err: &BillingError) -> String {
        let mut message = format!("❌ {}", err.user_friendly_message());
        if err.is_usage_error() {
            message.push_str(&format!(
                "\n\n{}\nBy default the last 12 months are fetched, newest first.",
                Self::command().render_usage()
            ));
        }
        message
    }

    /// Merges flags over the config file (if any) over built-in defaults.
    pub fn settings(&self) -> Result<RunSettings> {
        let file_config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        file_config.validate()?;

        let mut settings = RunSettings::from_toml(file_config)?;

        if let Some(directory) = &self.source_dir {
            settings.source = Some(SourceSettings::File {
                directory: directory.clone(),
                file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            });
        } else if let Some(endpoint) = &self.endpoint {
            let (headers, timeout) = match settings.source.take() {
                Some(SourceSettings::Http {
                    headers, timeout, ..
                }) => (headers, timeout),
                _ => (
                    HashMap::new(),
                    Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
                ),
            };
            settings.source = Some(SourceSettings::Http {
                endpoint: endpoint.clone(),
                headers,
                timeout,
            });
        }

        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(output) = &self.output {
            settings.output_path = Some(output.clone());
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSettings {
    File {
        directory: PathBuf,
        file_pattern: String,
    },
    Http {
        endpoint: String,
        headers: HashMap<String, String>,
        timeout: Duration,
    },
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub source: Option<SourceSettings>,
    pub layout: TableLayout,
    pub format: OutputFormat,
    pub output_path: Option<PathBuf>,
}

impl RunSettings {
    pub fn from_toml(config: TomlConfig) -> Result<Self> {
        let source = config.source.map(source_settings).transpose()?;
        let output = config.output.unwrap_or_default();

        Ok(Self {
            source,
            layout: config.table,
            format: output.format.unwrap_or_default(),
            output_path: output.path.map(PathBuf::from),
        })
    }

    pub fn build_source(&self) -> Result<Box<dyn BillingSource>> {
        match &self.source {
            Some(SourceSettings::File {
                directory,
                file_pattern,
            }) => Ok(Box::new(FileBillingSource::with_pattern(
                directory.clone(),
                file_pattern.clone(),
            ))),
            Some(SourceSettings::Http {
                endpoint,
                headers,
                timeout,
            }) => Ok(Box::new(HttpBillingSource::with_options(
                endpoint.clone(),
                headers,
                *timeout,
            )?)),
            None => Err(missing_source()),
        }
    }
}

fn missing_source() -> BillingError {
    BillingError::Config {
        field: "source".to_string(),
        message: "no billing page source; pass --source-dir or --endpoint, \
                  or add a [source] section to the config file"
            .to_string(),
    }
}

fn source_settings(source: SourceConfig) -> Result<SourceSettings> {
    match source.r#type {
        SourceType::File => Ok(SourceSettings::File {
            directory: source.directory.map(PathBuf::from).ok_or_else(missing_source)?,
            file_pattern: source
                .file_pattern
                .unwrap_or_else(|| DEFAULT_FILE_PATTERN.to_string()),
        }),
        SourceType::Http => Ok(SourceSettings::Http {
            endpoint: source.endpoint.ok_or_else(missing_source)?,
            headers: source.headers.unwrap_or_default(),
            timeout: Duration::from_secs(
                source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ),
        }),
    }
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        match &self.source {
            Some(SourceSettings::Http { endpoint, .. }) => {
                validate_url("source.endpoint", endpoint)?
            }
            Some(SourceSettings::File { .. }) => {}
            None => return Err(missing_source()),
        }
        self.layout.validate()
    }
}
