//! Turning adapter rows into price points

use crate::core::error::SkipRow;
use crate::core::point::PricePoint;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::debug;

/// Maps one raw row of an adapter's payload to a price point.
///
/// Implementations apply the divisor before constructing the point, so a
/// point's value is always per one unit of the instrument.
pub trait RecordParser<R> {
    fn parse(&self, row: R) -> Result<PricePoint, SkipRow>;
}

/// Points parsed from one payload, plus how many rows were dropped.
#[derive(Debug, Default, Clone)]
pub struct ParsedSeries {
    pub points: Vec<PricePoint>,
    pub skipped: usize,
}

/// Runs `parser` over every row, keeping source order and dropping malformed rows.
pub fn parse_rows<R, P, I>(parser: &P, rows: I) -> ParsedSeries
where
    P: RecordParser<R>,
    I: IntoIterator<Item = R>,
{
    let mut series = ParsedSeries::default();
    for (index, row) in rows.into_iter().enumerate() {
        match parser.parse(row) {
            Ok(point) => series.points.push(point),
            Err(reason) => {
                debug!("Skipping row {}: {}", index, reason);
                series.skipped += 1;
            }
        }
    }
    series
}

/// Parses a numeric string, accepting `,` as the decimal separator and
/// scientific notation.
pub fn parse_decimal(raw: &str) -> Result<Decimal, SkipRow> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(SkipRow::MissingField("value"));
    }
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| SkipRow::InvalidValue(raw.to_string()))
}

/// Divides `value` by the quantity the source quotes it for.
pub fn scale(value: Decimal, divisor: NonZeroU32) -> Result<Decimal, SkipRow> {
    if divisor.get() == 1 {
        return Ok(value);
    }
    value
        .checked_div(Decimal::from(divisor.get()))
        .ok_or_else(|| SkipRow::InvalidValue(value.to_string()))
}

/// Parser for `(date, value)` text rows shared by the tabular sources.
#[derive(Debug, Clone)]
pub struct TextRecordParser {
    symbol: String,
    currency: String,
    date_format: String,
    divisor: NonZeroU32,
}

impl TextRecordParser {
    pub fn new(symbol: &str, currency: &str, date_format: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            date_format: date_format.to_string(),
            divisor: NonZeroU32::MIN,
        }
    }

    pub fn with_divisor(mut self, divisor: NonZeroU32) -> Self {
        self.divisor = divisor;
        self
    }

    pub fn divisor(&self) -> NonZeroU32 {
        self.divisor
    }
}

impl RecordParser<(&str, &str)> for TextRecordParser {
    fn parse(&self, (date, value): (&str, &str)) -> Result<PricePoint, SkipRow> {
        let date = date.trim();
        let value = value.trim();
        if date.is_empty() && value.is_empty() {
            return Err(SkipRow::Blank);
        }
        if date.is_empty() {
            return Err(SkipRow::MissingField("date"));
        }

        let date = NaiveDate::parse_from_str(date, &self.date_format)
            .map_err(|_| SkipRow::InvalidDate(date.to_string()))?;
        let value = scale(parse_decimal(value)?, self.divisor)?;

        Ok(PricePoint::new(date, &self.symbol, value, &self.currency))
    }
}
