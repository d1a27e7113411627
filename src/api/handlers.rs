use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, Variant};
use crate::report::{aggregate, models::serialize_iso8601, Breakdown, FallbackProfile, Summary};
use crate::source::{ReportQuery, ReportSource};

pub struct AppState {
    pub source: Arc<dyn ReportSource>,
    pub query: ReportQuery,
    pub breakdown: Breakdown,
    pub fallback: FallbackProfile,
}

impl AppState {
    /// State for one variant: the server ranks countries, the function does not
    pub fn for_variant(config: &Config, variant: Variant, source: Arc<dyn ReportSource>) -> Self {
        let (breakdown, fallback) = match variant {
            Variant::Server => (config.report.breakdown(), FallbackProfile::server()),
            Variant::Function => (Breakdown::None, FallbackProfile::function()),
        };

        Self {
            source,
            query: config.report_query(),
            breakdown,
            fallback,
        }
    }

    /// Fetch and aggregate one report, or serve the fallback if anything upstream fails
    pub async fn summarize(&self) -> Summary {
        match self.source.run_report(&self.query).await {
            Ok(report) => aggregate(&report, self.breakdown),
            Err(e) => {
                tracing::error!(error = %e, "GA4 API error, serving fallback analytics");
                self.fallback.summary()
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(serialize_with = "serialize_iso8601")]
    pub timestamp: DateTime<Utc>,
}

/// Analytics summary for the dashboard
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.summarize().await)
}

/// Function-style entry point: every method lands here, only GET is served
pub async fn function_analytics(method: Method, State(state): State<Arc<AppState>>) -> Response {
    if method != Method::GET {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorResponse {
                error: "Method not allowed".to_string(),
            }),
        )
            .into_response();
    }

    Json(state.summarize().await).into_response()
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}
