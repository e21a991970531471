//! Monthly digest of a daily series

use crate::core::point::PricePoint;

/// Admits the first point of every calendar month in a single forward pass.
///
/// Only the last admitted `(year, month)` key is remembered. Input is expected
/// in date order; a month that reappears after a different month is admitted
/// again.
#[derive(Debug, Clone, Default)]
pub struct MonthlyDownsampler {
    last_month: Option<(i32, u32)>,
}

impl MonthlyDownsampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `point` opens a month and belongs in the digest.
    pub fn admit(&mut self, point: &PricePoint) -> bool {
        let key = point.month_key();
        if self.last_month == Some(key) {
            return false;
        }
        self.last_month = Some(key);
        true
    }

    /// Digest of `points` using a fresh cursor.
    pub fn downsample(points: &[PricePoint]) -> Vec<PricePoint> {
        let mut sampler = Self::new();
        points
            .iter()
            .filter(|p| sampler.admit(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, NaiveDate};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn point(y: i32, m: u32, d: u32, value: i64) -> PricePoint {
        PricePoint::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            "XYZ",
            Decimal::new(value, 2),
            "USD",
        )
    }

    #[test]
    fn test_first_point_of_each_month() {
        let series = vec![
            point(2020, 1, 15, 100),
            point(2020, 2, 3, 200),
            point(2020, 3, 2, 300),
            point(2020, 3, 3, 301),
        ];

        let monthly = MonthlyDownsampler::downsample(&series);
        assert_eq!(monthly.len(), 3);
        assert_eq!(monthly[2], series[2]);
        assert_eq!(monthly[0], series[0]);
    }

    #[test]
    fn test_same_month_in_different_years() {
        let series = vec![point(2020, 1, 2, 1), point(2021, 1, 4, 2)];
        assert_eq!(MonthlyDownsampler::downsample(&series).len(), 2);
    }

    #[test]
    fn test_empty_series() {
        assert!(MonthlyDownsampler::downsample(&[]).is_empty());
    }

    #[test]
    fn test_revisited_month_is_admitted_again() {
        let series = vec![
            point(2020, 1, 2, 1),
            point(2020, 2, 3, 2),
            point(2020, 1, 20, 3),
        ];
        let monthly = MonthlyDownsampler::downsample(&series);
        assert_eq!(monthly.len(), 3);
        assert_eq!(monthly[2].value(), Decimal::new(3, 2));
    }

    #[test]
    fn test_independent_cursors() {
        let mut full = MonthlyDownsampler::new();
        let mut derived = MonthlyDownsampler::new();
        let jan = point(2020, 1, 2, 1);
        let feb = point(2020, 2, 3, 2);

        assert!(full.admit(&jan));
        assert!(full.admit(&feb));
        // The derived series had no January point; its cursor is unaffected.
        assert!(derived.admit(&feb));
        assert!(!derived.admit(&point(2020, 2, 4, 3)));
    }

    fn arb_sorted_series() -> impl Strategy<Value = Vec<PricePoint>> {
        prop::collection::vec(0i64..20, 0..200).prop_map(|gaps| {
            let mut date = NaiveDate::from_ymd_opt(2019, 12, 25).unwrap();
            gaps.into_iter()
                .enumerate()
                .map(|(i, gap)| {
                    date += Duration::days(gap);
                    PricePoint::new(date, "XYZ", Decimal::from(i as i64), "USD")
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn digest_has_one_first_point_per_month(series in arb_sorted_series()) {
            let monthly = MonthlyDownsampler::downsample(&series);

            let months: HashSet<_> = series.iter().map(|p| p.month_key()).collect();
            prop_assert_eq!(monthly.len(), months.len());

            for m in &monthly {
                let first = series
                    .iter()
                    .find(|p| p.month_key() == m.month_key())
                    .unwrap();
                prop_assert_eq!(first, m);
            }

            let mut cursor = series.iter();
            for m in &monthly {
                prop_assert!(cursor.any(|p| p == m));
            }
            let ordered = monthly.windows(2).all(|w| {
                (w[0].date().year(), w[0].date().month()) < (w[1].date().year(), w[1].date().month())
            });
            prop_assert!(ordered);
        }
    }
}
