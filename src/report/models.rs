//! Data models for GA4 reports and the dashboard summary

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Placeholder GA4 itself uses when a dimension has no value
pub const NOT_SET: &str = "(not set)";

/// A single cell of a GA4 report row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportValue {
    #[serde(default)]
    pub value: Option<String>,
}

impl ReportValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}

/// One observation unit of a report
///
/// Metric and dimension positions are fixed by the query that produced the
/// report: metric 0 is active users, metric 1 is page views, dimension 0 is
/// the country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

impl ReportRow {
    /// Build a row from a country and raw metric strings
    pub fn new(country: &str, metrics: &[&str]) -> Self {
        Self {
            dimension_values: vec![ReportValue::new(country)],
            metric_values: metrics.iter().map(|m| ReportValue::new(*m)).collect(),
        }
    }

    /// Raw metric string at `index`, if present
    pub fn metric(&self, index: usize) -> Option<&str> {
        self.metric_values
            .get(index)
            .and_then(|v| v.value.as_deref())
    }

    /// Grouping key (dimension 0), `(not set)` when missing
    pub fn group_key(&self) -> &str {
        self.dimension_values
            .first()
            .and_then(|v| v.value.as_deref())
            .unwrap_or(NOT_SET)
    }
}

/// Raw `runReport` response
///
/// GA4 omits `rows` entirely for an empty report, so a missing key
/// deserializes to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub rows: Vec<ReportRow>,

    /// Total rows matching the query, as reported upstream
    #[serde(default)]
    pub row_count: Option<u64>,
}

impl Report {
    pub fn from_rows(rows: Vec<ReportRow>) -> Self {
        Self {
            rows,
            row_count: None,
        }
    }
}

/// One entry of the ranked country breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryVisitors {
    pub country: String,
    pub visitors: u64,
}

impl CountryVisitors {
    pub fn new(country: impl Into<String>, visitors: u64) -> Self {
        Self {
            country: country.into(),
            visitors,
        }
    }
}

/// Client-facing aggregate served to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub visitors: u64,
    pub page_views: u64,
    pub countries: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_countries: Option<Vec<CountryVisitors>>,
    #[serde(serialize_with = "serialize_iso8601")]
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "is_false")]
    pub fallback: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Render timestamps the way browsers print `Date#toISOString`
pub fn iso8601(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize_iso8601<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&iso8601(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn report_without_rows_deserializes_empty() {
        let report: Report = serde_json::from_value(json!({
            "kind": "analyticsData#runReport",
            "metadata": { "currencyCode": "USD" }
        }))
        .unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.row_count, None);
    }

    #[test]
    fn report_rows_deserialize_from_ga4_shape() {
        let report: Report = serde_json::from_value(json!({
            "rows": [
                {
                    "dimensionValues": [{ "value": "India" }],
                    "metricValues": [{ "value": "10" }, { "value": "100" }]
                },
                {
                    "dimensionValues": [{}],
                    "metricValues": [{ "value": "5" }]
                }
            ],
            "rowCount": 2
        }))
        .unwrap();

        assert_eq!(report.row_count, Some(2));
        assert_eq!(report.rows[0].group_key(), "India");
        assert_eq!(report.rows[0].metric(1), Some("100"));
        assert_eq!(report.rows[1].group_key(), NOT_SET);
        assert_eq!(report.rows[1].metric(1), None);
    }

    #[test]
    fn summary_serializes_dashboard_shape() {
        let summary = Summary {
            visitors: 18,
            page_views: 180,
            countries: 2,
            top_countries: None,
            last_updated: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            fallback: false,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "visitors": 18,
                "pageViews": 180,
                "countries": 2,
                "lastUpdated": "2024-03-01T12:30:00.000Z"
            })
        );
    }

    #[test]
    fn fallback_summary_carries_flag_and_breakdown() {
        let summary = Summary {
            visitors: 1,
            page_views: 2,
            countries: 1,
            top_countries: Some(vec![CountryVisitors::new("India", 1)]),
            last_updated: Utc::now(),
            fallback: true,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["fallback"], json!(true));
        assert_eq!(
            value["topCountries"],
            json!([{ "country": "India", "visitors": 1 }])
        );
    }
}
