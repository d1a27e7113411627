//! Report aggregation
//!
//! Turns a raw GA4 report into the dashboard [`Summary`]. Bad cell values
//! never abort aggregation; they count as zero.

use chrono::Utc;
use std::collections::{HashMap, HashSet};

use crate::report::models::{CountryVisitors, Report, Summary};

/// Number of entries the dashboard chart shows
pub const TOP_COUNTRIES_LIMIT: usize = 5;

const VISITORS: usize = 0;
const PAGE_VIEWS: usize = 1;

/// Which ranked breakdown, if any, to attach to a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    /// Totals only
    None,
    /// One entry per report row, so a country spread over several rows
    /// appears several times
    TopRows(usize),
    /// Visitors merged per country before ranking
    TopCountries(usize),
}

/// Aggregate a report into a summary stamped with the current time
pub fn aggregate(report: &Report, breakdown: Breakdown) -> Summary {
    let mut visitors: u64 = 0;
    let mut page_views: u64 = 0;
    let mut seen: HashSet<&str> = HashSet::new();

    for row in &report.rows {
        visitors = visitors.saturating_add(parse_count(row.metric(VISITORS)));
        page_views = page_views.saturating_add(parse_count(row.metric(PAGE_VIEWS)));
        seen.insert(row.group_key());
    }

    let top_countries = match breakdown {
        Breakdown::None => None,
        Breakdown::TopRows(limit) => Some(rank(per_row(report), limit)),
        Breakdown::TopCountries(limit) => Some(rank(per_country(report), limit)),
    };

    Summary {
        visitors,
        page_views,
        countries: seen.len() as u64,
        top_countries,
        last_updated: Utc::now(),
        fallback: false,
    }
}

fn per_row(report: &Report) -> Vec<CountryVisitors> {
    report
        .rows
        .iter()
        .map(|row| CountryVisitors::new(row.group_key(), parse_count(row.metric(VISITORS))))
        .collect()
}

fn per_country(report: &Report) -> Vec<CountryVisitors> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<CountryVisitors> = Vec::new();

    for row in &report.rows {
        let country = row.group_key();
        let visitors = parse_count(row.metric(VISITORS));
        match index.get(country) {
            Some(&i) => merged[i].visitors = merged[i].visitors.saturating_add(visitors),
            None => {
                index.insert(country, merged.len());
                merged.push(CountryVisitors::new(country, visitors));
            }
        }
    }

    merged
}

// `sort_by` is stable, so ties keep report order.
fn rank(mut entries: Vec<CountryVisitors>, limit: usize) -> Vec<CountryVisitors> {
    entries.sort_by(|a, b| b.visitors.cmp(&a.visitors));
    entries.truncate(limit);
    entries
}

/// Parse a metric cell with integer-prefix semantics
///
/// Leading whitespace is skipped and the leading run of digits is used, so
/// `"12abc"` is 12 and `"3.7"` is 3. Missing, empty and non-numeric values
/// are 0. Negative values clamp to 0 and overflow saturates.
pub fn parse_count(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };

    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: u64 = 0;
    let mut any_digit = false;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        any_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(byte - b'0'));
    }

    if negative || !any_digit {
        0
    } else {
        value
    }
}
