//! Substitute summaries served when the upstream report fails

use chrono::Utc;
use rand::Rng;

use crate::report::models::{CountryVisitors, Summary};

/// Sample numbers returned in place of a real report
///
/// Totals get a random jitter in `[0, jitter)` so the dashboard does not
/// look frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackProfile {
    pub visitors: u64,
    pub visitors_jitter: u64,
    pub page_views: u64,
    pub page_views_jitter: u64,
    pub countries: u64,
    pub top_countries: Option<Vec<CountryVisitors>>,
}

impl FallbackProfile {
    /// Profile served by the long-running server
    pub fn server() -> Self {
        Self {
            visitors: 18_750,
            visitors_jitter: 1_000,
            page_views: 32_400,
            page_views_jitter: 2_000,
            countries: 52,
            top_countries: Some(vec![
                CountryVisitors::new("India", 8437),
                CountryVisitors::new("United States", 4687),
                CountryVisitors::new("United Kingdom", 2812),
                CountryVisitors::new("Germany", 1125),
                CountryVisitors::new("Canada", 937),
            ]),
        }
    }

    /// Profile served by the function endpoint
    pub fn function() -> Self {
        Self {
            visitors: 25_430,
            visitors_jitter: 500,
            page_views: 45_670,
            page_views_jitter: 1_000,
            countries: 52,
            top_countries: None,
        }
    }

    pub fn summary(&self) -> Summary {
        self.summary_with(&mut rand::rng())
    }

    pub fn summary_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Summary {
        Summary {
            visitors: self
                .visitors
                .saturating_add(jitter(rng, self.visitors_jitter)),
            page_views: self
                .page_views
                .saturating_add(jitter(rng, self.page_views_jitter)),
            countries: self.countries,
            top_countries: self.top_countries.clone(),
            last_updated: Utc::now(),
            fallback: true,
        }
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    if bound == 0 {
        0
    } else {
        rng.random_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_fallback_stays_within_jitter_bounds() {
        let profile = FallbackProfile::server();
        for _ in 0..200 {
            let summary = profile.summary();
            assert!(summary.fallback);
            assert!((18_750..19_750).contains(&summary.visitors));
            assert!((32_400..34_400).contains(&summary.page_views));
            assert_eq!(summary.countries, 52);
            assert_eq!(summary.top_countries.as_ref().map(Vec::len), Some(5));
        }
    }

    #[test]
    fn function_fallback_has_no_breakdown() {
        let summary = FallbackProfile::function().summary();

        assert!(summary.fallback);
        assert!((25_430..25_930).contains(&summary.visitors));
        assert!((45_670..46_670).contains(&summary.page_views));
        assert_eq!(summary.top_countries, None);
    }

    #[test]
    fn zero_jitter_is_exact() {
        let profile = FallbackProfile {
            visitors: 1,
            visitors_jitter: 0,
            page_views: 2,
            page_views_jitter: 0,
            countries: 3,
            top_countries: None,
        };

        let summary = profile.summary();
        assert_eq!((summary.visitors, summary.page_views), (1, 2));
    }

    #[test]
    fn large_profile_saturates_instead_of_overflowing() {
        let profile = FallbackProfile {
            visitors: u64::MAX - 1,
            visitors_jitter: 1_000,
            page_views: u64::MAX,
            page_views_jitter: 1_000,
            countries: 1,
            top_countries: None,
        };

        for _ in 0..50 {
            let summary = profile.summary();
            assert!(summary.visitors >= u64::MAX - 1);
            assert_eq!(summary.page_views, u64::MAX);
        }
    }
}
