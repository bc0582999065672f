use crate::core::extractor::{extract_billing_amount, TableLayout};
use crate::domain::model::{BillingRecord, Period};
use crate::domain::ports::BillingSource;
use crate::utils::error::Result;
use std::collections::HashMap;

pub struct BillingEngine<S: BillingSource> {
    source: S,
    layout: TableLayout,
}

impl<S: BillingSource> BillingEngine<S> {
    pub fn new(source: S, layout: TableLayout) -> Self {
        Self { source, layout }
    }

    /// Looks up every period in order. Each year's page is fetched once.
    pub async fn run(&self, periods: &[Period]) -> Result<Vec<BillingRecord>> {
        tracing::info!(
            "Fetching {} billing amount(s) from {}",
            periods.len(),
            self.source.describe()
        );

        let mut pages: HashMap<i32, String> = HashMap::new();
        let mut records = Vec::with_capacity(periods.len());

        for period in periods {
            tracing::info!("Fetching a billing amount on {}", period.short_label());

            if !pages.contains_key(&period.year()) {
                let html = self.source.fetch_year(period.year()).await?;
                tracing::debug!(
                    "Loaded billing page for {} ({} bytes)",
                    period.year(),
                    html.len()
                );
                pages.insert(period.year(), html);
            }
            let html = &pages[&period.year()];

            let amount = extract_billing_amount(html, period, &self.layout)?;
            tracing::info!(
                "The billing amount on {}: {}",
                period.short_label(),
                amount_label(amount)
            );

            records.push(BillingRecord {
                period: *period,
                amount,
            });
        }

        Ok(records)
    }
}

fn amount_label(amount: Option<i64>) -> String {
    amount.map_or_else(|| "none".to_string(), |value| value.to_string())
}
