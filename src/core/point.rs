//! Price points and instrument descriptors

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Semantic category of a value. Decides rounding precision and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Rate,
    Price,
}

impl ValueKind {
    /// Number of decimal digits a value of this kind is rounded to.
    pub fn precision(&self) -> u32 {
        match self {
            ValueKind::Rate => 7,
            ValueKind::Price => 2,
        }
    }
}

/// One instrument's value on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePoint {
    date: NaiveDate,
    symbol: String,
    value: Decimal,
    currency: String,
}

impl PricePoint {
    pub fn new(
        date: NaiveDate,
        symbol: impl Into<String>,
        value: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            value,
            currency: currency.into(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Calendar month key used by the monthly digest.
    pub fn month_key(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }

    /// Returns a copy of this point carrying a different value.
    pub fn with_value(&self, value: Decimal) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    /// Returns a copy of this point re-expressed in another currency.
    pub fn converted(&self, value: Decimal, currency: &str) -> Self {
        Self {
            date: self.date,
            symbol: self.symbol.clone(),
            value,
            currency: currency.to_string(),
        }
    }
}

/// Builds the directive symbol for a source ticker.
///
/// Dividend-adjusted series get a trailing `d`, then every `-` becomes `_`
/// so the symbol stays a single ledger commodity token.
pub fn output_symbol(ticker: &str, dividend_adjusted: bool) -> String {
    let mut symbol = ticker.to_string();
    if dividend_adjusted {
        symbol.push('d');
    }
    symbol.replace('-', "_")
}

/// A unit of work for one run: what to ask the source for and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Identifier the source is queried with (currency code, ticker, ISIN).
    pub id: String,
    /// Symbol written into every directive.
    pub symbol: String,
    /// Base name of the output files.
    pub file_stem: String,
    pub dividend_adjusted: bool,
    /// Target currency of an additional cross-joined series.
    pub convert_to: Option<String>,
}

impl Instrument {
    pub fn new(id: &str, symbol: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            file_stem: symbol.to_string(),
            dividend_adjusted: false,
            convert_to: None,
        }
    }

    /// A ticker-backed instrument; symbol and stem follow [`output_symbol`].
    pub fn ticker(ticker: &str, dividend_adjusted: bool) -> Self {
        let symbol = output_symbol(ticker, dividend_adjusted);
        Self {
            id: ticker.to_string(),
            file_stem: symbol.clone(),
            symbol,
            dividend_adjusted,
            convert_to: None,
        }
    }

    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    pub fn with_conversion(mut self, target: Option<String>) -> Self {
        self.convert_to = target;
        self
    }

    /// File stem of the cross-joined series into `target`.
    pub fn converted_stem(&self, target: &str) -> String {
        format!("{}{}", self.file_stem, target)
    }
}
