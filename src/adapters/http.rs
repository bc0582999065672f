use crate::domain::ports::BillingSource;
use crate::utils::error::{BillingError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Fetches billing pages with one plain GET per year.
///
/// `{year}` in the endpoint is replaced by the requested year. Headers are
/// sent as given; nothing is stored between requests.
#[derive(Debug, Clone)]
pub struct HttpBillingSource {
    endpoint: String,
    client: Client,
}

impl HttpBillingSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_options(
            endpoint,
            &HashMap::new(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    pub fn with_options(
        endpoint: impl Into<String>,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(build_headers(headers)?)
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn url_for(&self, year: i32) -> String {
        self.endpoint.replace("{year}", &year.to_string())
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let invalid = |reason: String| BillingError::InvalidConfigValue {
            field: format!("source.headers.{}", name),
            value: value.clone(),
            reason,
        };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(format!("Invalid header name: {}", e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| invalid(format!("Invalid header value: {}", e)))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl BillingSource for HttpBillingSource {
    async fn fetch_year(&self, year: i32) -> Result<String> {
        let url = self.url_for(year);
        tracing::debug!("Making request to: {}", url);

        let response = self.client.get(&url).send().await?;
        tracing::debug!("Response status: {}", response.status());

        if !response.status().is_success() {
            return Err(BillingError::Source {
                message: format!("{} returned {}", url, response.status()),
            });
        }

        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
