//! GA4 Data API client

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{
    credentials::TokenSource,
    error::{SourceError, SourceResult},
    ReportQuery, ReportSource,
};
use crate::report::Report;

pub const DEFAULT_API_BASE: &str = "https://analyticsdata.googleapis.com";

/// Calls `properties/{id}:runReport` with a bearer token
pub struct Ga4Client {
    api_base: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl Ga4Client {
    pub fn new(api_base: impl Into<String>, tokens: Arc<dyn TokenSource>) -> SourceResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("beacon/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    pub fn report_url(&self, query: &ReportQuery) -> String {
        format!(
            "{}/v1beta/properties/{}:runReport",
            self.api_base,
            query.property()
        )
    }
}

#[async_trait]
impl ReportSource for Ga4Client {
    async fn run_report(&self, query: &ReportQuery) -> SourceResult<Report> {
        let token = self.tokens.access_token().await?;
        let url = self.report_url(query);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&query.to_request_body())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status { status, body });
        }

        let report: Report = serde_json::from_str(&body).map_err(SourceError::Decode)?;
        debug!(
            property = query.property(),
            rows = report.rows.len(),
            row_count = ?report.row_count,
            "Fetched GA4 report"
        );

        Ok(report)
    }
}
