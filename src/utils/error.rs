use thiserror::Error;

/// Rejection of a `--target-year-month` value.
///
/// Token variants carry the raw token that failed. `WindowBeforeYearOne`
/// carries the reference date instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The option needs some value")]
    EmptyOption,

    #[error("The option accepts only a pattern YYYY-MM (e.g. 2020-08). The given value: {value}")]
    PatternMismatch { value: String },

    #[error("\"{value}\" is invalid year month")]
    InvalidYearMonth { value: String },

    #[error("The option accepts only this month or the past months. The given value: {value}")]
    FutureMonth { value: String },

    #[error("The default 12 month window from {today} would reach before year 1")]
    WindowBeforeYearOne { today: String },
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invalid target year month: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    Config { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Billing page source error: {message}")]
    Source { message: String },

    #[error("Billing table extraction error: {message}")]
    Extraction { message: String },
}

impl BillingError {
    /// Errors caused by how the tool was invoked rather than by the page.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            BillingError::Validation(_)
                | BillingError::Config { .. }
                | BillingError::InvalidConfigValue { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            BillingError::Validation(_)
            | BillingError::Config { .. }
            | BillingError::InvalidConfigValue { .. } => 1,
            BillingError::Http(_) | BillingError::Source { .. } | BillingError::Io(_) => 2,
            BillingError::Extraction { .. } => 3,
            BillingError::Csv(_) | BillingError::Serialization(_) => 4,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BillingError::Validation(e) => e.to_string(),
            BillingError::Http(e) if e.is_timeout() => {
                "The billing page did not respond in time".to_string()
            }
            BillingError::Http(e) => format!("Could not reach the billing page: {}", e),
            BillingError::Extraction { message } => format!(
                "The billing page did not look as expected ({}). Check the [table] settings",
                message
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
