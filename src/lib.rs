pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{FileBillingSource, FixedClock, HttpBillingSource, SystemClock};
pub use crate::config::{toml_config::TomlConfig, RunSettings, SourceSettings};
pub use crate::core::engine::BillingEngine;
pub use crate::core::extractor::{extract_billing_amount, TableLayout};
pub use crate::core::period::{resolve_target_periods, PeriodResolver};
pub use crate::core::report::{render_report, write_report, OutputFormat};
pub use crate::domain::model::{BillingRecord, Period};
pub use crate::domain::ports::{BillingSource, Clock};
pub use crate::utils::error::{BillingError, Result, ValidationError};
