//! GA4 report aggregation
//!
//! The aggregator is a pure function of the report plus the current time.
//! Fallback numbers live beside it but never flow through it.

pub mod aggregator;
pub mod fallback;
pub mod models;

pub use aggregator::{aggregate, parse_count, Breakdown, TOP_COUNTRIES_LIMIT};
pub use fallback::FallbackProfile;
pub use models::{CountryVisitors, Report, ReportRow, ReportValue, Summary};
