use crate::core::extractor::TableLayout;
use crate::core::report::OutputFormat;
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_placeholder, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub table: TableLayout,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: SourceType,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    pub directory: Option<String>,
    pub file_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub path: Option<String>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BillingError::Config {
            field: "config".to_string(),
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BillingError::Config {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        match self.r#type {
            SourceType::Http => {
                let endpoint = self.endpoint.as_deref().ok_or_else(|| BillingError::Config {
                    field: "source.endpoint".to_string(),
                    message: "required when source.type = \"http\"".to_string(),
                })?;
                validate_url("source.endpoint", endpoint)?;
                if let Some(timeout) = self.timeout_seconds {
                    validate_positive_number("source.timeout_seconds", timeout, 1)?;
                }
            }
            SourceType::File => {
                let directory = self.directory.as_deref().ok_or_else(|| BillingError::Config {
                    field: "source.directory".to_string(),
                    message: "required when source.type = \"file\"".to_string(),
                })?;
                validate_path("source.directory", directory)?;
                if let Some(pattern) = &self.file_pattern {
                    validate_non_empty_string("source.file_pattern", pattern)?;
                    validate_placeholder("source.file_pattern", pattern, "{year}")?;
                }
            }
        }
        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(source) = &self.source {
            source.validate()?;
        }
        self.table.validate()?;
        if let Some(path) = self.output.as_ref().and_then(|o| o.path.as_deref()) {
            validate_path("output.path", path)?;
        }
        Ok(())
    }
}
