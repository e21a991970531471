//! Fixed-precision rounding of values

use crate::core::point::{PricePoint, ValueKind};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds values to the precision of their [`ValueKind`].
///
/// Ties are rounded half away from zero on the exact decimal value:
/// `0.125` becomes `0.13` and `-0.125` becomes `-0.13`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateNormalizer;

impl RateNormalizer {
    const STRATEGY: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

    pub fn new() -> Self {
        Self
    }

    pub fn round(&self, value: Decimal, kind: ValueKind) -> Decimal {
        value.round_dp_with_strategy(kind.precision(), Self::STRATEGY)
    }

    /// Replaces `point` with one carrying the rounded value.
    pub fn normalize(&self, point: &PricePoint, kind: ValueKind) -> PricePoint {
        point.with_value(self.round(point.value(), kind))
    }

    pub fn normalize_all(&self, points: &[PricePoint], kind: ValueKind) -> Vec<PricePoint> {
        points.iter().map(|p| self.normalize(p, kind)).collect()
    }
}
