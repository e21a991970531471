//! Re-expressing a series in another currency

use crate::core::normalize::RateNormalizer;
use crate::core::point::{PricePoint, ValueKind};
use crate::core::rates::RateTable;
use tracing::debug;

/// Multiplies each point by the rate of the same date.
///
/// Dates without a rate produce no point; there is no interpolation or
/// nearest-date fallback.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyCrossJoiner<'a> {
    table: &'a RateTable,
    target: &'a str,
    normalizer: RateNormalizer,
}

impl<'a> CurrencyCrossJoiner<'a> {
    pub fn new(table: &'a RateTable, target: &'a str) -> Self {
        Self {
            table,
            target,
            normalizer: RateNormalizer::new(),
        }
    }

    pub fn join_point(&self, point: &PricePoint) -> Option<PricePoint> {
        let rate = self.table.get(&point.date())?;
        let Some(value) = point.value().checked_mul(rate) else {
            debug!(
                "Conversion overflow for {} on {}, skipping",
                point.symbol(),
                point.date()
            );
            return None;
        };
        let value = self.normalizer.round(value, ValueKind::Price);
        Some(point.converted(value, self.target))
    }

    pub fn join(&self, series: &[PricePoint]) -> Vec<PricePoint> {
        let joined: Vec<PricePoint> = series.iter().filter_map(|p| self.join_point(p)).collect();
        debug!(
            "Converted {} of {} points into {}",
            joined.len(),
            series.len(),
            self.target
        );
        joined
    }
}
