use crate::core::config::{PseConfig, PseStock};
use crate::core::error::SkipRow;
use crate::core::parser::{ParsedSeries, RecordParser, parse_decimal, parse_rows};
use crate::core::point::{Instrument, PricePoint, ValueKind};
use crate::core::source::SeriesSource;
use crate::providers::util::{fetch_text, http_client};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct PseResponse {
    data: PseData,
}

#[derive(Debug, Deserialize)]
struct PseData {
    additional: PseAdditional,
    #[serde(default)]
    value: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PseAdditional {
    currency: String,
}

/// Parses `[epoch_millis, price]` chart rows; dates are taken in UTC.
pub struct PseRowParser {
    symbol: String,
    currency: String,
}

impl PseRowParser {
    pub fn new(symbol: &str, currency: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
        }
    }
}

impl RecordParser<&Value> for PseRowParser {
    fn parse(&self, row: &Value) -> Result<PricePoint, SkipRow> {
        let pair = row
            .as_array()
            .ok_or_else(|| SkipRow::InvalidValue(row.to_string()))?;
        let millis = pair
            .first()
            .and_then(Value::as_i64)
            .ok_or(SkipRow::MissingField("timestamp"))?;
        let date = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| SkipRow::InvalidDate(millis.to_string()))?
            .date_naive();
        let value = match pair.get(1) {
            Some(Value::Number(n)) => parse_decimal(&n.to_string())?,
            Some(Value::String(s)) => parse_decimal(s)?,
            _ => return Err(SkipRow::MissingField("price")),
        };

        Ok(PricePoint::new(date, &self.symbol, value, &self.currency))
    }
}

/// Parses a PSE instrument-chart JSON payload.
pub fn parse_payload(instrument: &Instrument, payload: &str) -> Result<ParsedSeries> {
    let response: PseResponse = serde_json::from_str(payload).with_context(|| {
        format!("Failed to parse PSE response for ISIN: {}", instrument.id)
    })?;
    let parser = PseRowParser::new(&instrument.symbol, &response.data.additional.currency);
    Ok(parse_rows(&parser, response.data.value.iter()))
}

/// Price history from the Prague Stock Exchange chart API.
pub struct PseProvider {
    base_url: String,
}

impl PseProvider {
    const API_KEY: &'static str = "PSE";

    pub fn new(config: &PseConfig) -> Self {
        PseProvider {
            base_url: config.base_url.clone(),
        }
    }

    /// Instruments are queried by ISIN and written under the configured name.
    pub fn instrument(stock: &PseStock) -> Instrument {
        Instrument::new(&stock.isin, &stock.name)
    }
}

#[async_trait]
impl SeriesSource for PseProvider {
    fn name(&self) -> &'static str {
        "pse"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Price
    }

    #[instrument(name = "PseFetch", skip(self, instrument), fields(isin = %instrument.id))]
    async fn fetch_series(&self, instrument: &Instrument) -> Result<ParsedSeries> {
        let client = http_client()?;
        let url = format!(
            "{}/api/instrument-chart?isin={}&range=_MAX",
            self.base_url, instrument.id
        );
        debug!("Requesting price data from {}", url);

        let payload = fetch_text(
            || client.get(&url).header("X-API-Key", Self::API_KEY),
            &format!("ISIN: {}", instrument.id),
        )
        .await?;

        let series = parse_payload(instrument, &payload)?;
        if series.points.is_empty() {
            return Err(anyhow!("No data for ISIN: {}", instrument.id));
        }
        Ok(series)
    }
}
