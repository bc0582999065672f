pub mod engine;
pub mod extractor;
pub mod period;
pub mod report;

pub use crate::domain::model::{BillingRecord, Period};
pub use crate::domain::ports::{BillingSource, Clock};
pub use crate::utils::error::Result;
