//! Dashboard summary fetch.

use serde_json::Value;

use crate::domain::error::ApiError;
use crate::http::classifier::ClassifyOptions;
use crate::http::transport::HttpTransport;
use crate::services::{data_field, ServiceDeps};

/// Aggregate figures for the landing view.
pub struct DashboardService<T> {
    deps: ServiceDeps<T>,
}

impl<T: HttpTransport> DashboardService<T> {
    /// Service over the shared dependencies.
    #[must_use]
    pub fn new(deps: ServiceDeps<T>) -> Self {
        Self { deps }
    }

    /// Fetch the dashboard summary payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy after surfacing it.
    pub async fn fetch_summary(&self) -> Result<Value, ApiError> {
        let result = self
            .deps
            .client
            .get("dashboard/get-dashboard-data", Vec::new())
            .await;

        match result {
            Ok(body) => Ok(data_field(&body)?.clone()),
            Err(error) => {
                self.deps
                    .classifier
                    .handle(&error, &ClassifyOptions::for_context("dashboard"));
                Err(error)
            }
        }
    }
}
