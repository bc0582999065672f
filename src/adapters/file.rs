use crate::domain::ports::BillingSource;
use crate::utils::error::{BillingError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

pub const DEFAULT_FILE_PATTERN: &str = "billing_{year}.html";

/// Reads saved billing history pages, one file per year.
#[derive(Debug, Clone)]
pub struct FileBillingSource {
    directory: PathBuf,
    file_pattern: String,
}

impl FileBillingSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_pattern(directory, DEFAULT_FILE_PATTERN)
    }

    pub fn with_pattern(directory: impl Into<PathBuf>, file_pattern: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_pattern: file_pattern.into(),
        }
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.directory
            .join(self.file_pattern.replace("{year}", &year.to_string()))
    }
}

#[async_trait]
impl BillingSource for FileBillingSource {
    async fn fetch_year(&self, year: i32) -> Result<String> {
        let path = self.path_for(year);
        tracing::debug!("Reading billing page {}", path.display());

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BillingError::Source {
                message: format!("cannot read {}: {}", path.display(), e),
            })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.directory.display())
    }
}
