use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of "today" for period resolution.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Yields the billing history page for one calendar year.
#[async_trait]
pub trait BillingSource: Send + Sync {
    async fn fetch_year(&self, year: i32) -> Result<String>;

    /// Short label used in log lines.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: BillingSource + ?Sized> BillingSource for Box<S> {
    async fn fetch_year(&self, year: i32) -> Result<String> {
        (**self).fetch_year(year).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
