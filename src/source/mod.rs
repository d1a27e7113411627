//! Upstream report sources
//!
//! Handlers only see [`ReportSource`]; the GA4 client is one implementation
//! and tests substitute their own.

pub mod credentials;
pub mod error;
pub mod ga4;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::GoogleConfig;
use crate::report::Report;

pub use credentials::{CredentialSource, ServiceAccountAuth, ServiceAccountKey, TokenSource};
pub use error::{SourceError, SourceResult};
pub use ga4::Ga4Client;

#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Run a single report query
    async fn run_report(&self, query: &ReportQuery) -> SourceResult<Report>;
}

/// Build the production GA4 source from configuration
///
/// Credentials are not touched here; they load on the first report.
pub fn from_config(google: &GoogleConfig) -> SourceResult<Arc<dyn ReportSource>> {
    let auth = ServiceAccountAuth::new(google.credential_source())?;
    let client = Ga4Client::new(&google.api_base_url, Arc::new(auth))?;
    Ok(Arc::new(client))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new("30daysAgo", "today")
    }
}

/// What to ask GA4 for
///
/// The aggregator reads metrics and dimensions by position, so the defaults
/// must stay in this order: active users, page views, country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub property_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
}

impl ReportQuery {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            date_ranges: vec![DateRange::default()],
            metrics: vec!["activeUsers".to_string(), "screenPageViews".to_string()],
            dimensions: vec!["country".to_string()],
        }
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_ranges = vec![range];
        self
    }

    /// Property id without any `properties/` prefix
    pub fn property(&self) -> &str {
        self.property_id
            .strip_prefix("properties/")
            .unwrap_or(&self.property_id)
    }

    /// JSON body for the `runReport` call
    pub fn to_request_body(&self) -> Value {
        json!({
            "dateRanges": self.date_ranges,
            "metrics": self.metrics.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
            "dimensions": self.dimensions.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        })
    }
}
