use crate::core::config::StooqConfig;
use crate::core::parser::{ParsedSeries, TextRecordParser, parse_rows};
use crate::core::point::{Instrument, ValueKind};
use crate::core::source::SeriesSource;
use crate::providers::util::{fetch_text, http_client};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// Parses a Stooq daily CSV payload using its `Date` and `Close` columns.
pub fn parse_payload(
    instrument: &Instrument,
    currency: &str,
    payload: impl AsRef<[u8]>,
) -> Result<ParsedSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(payload.as_ref());

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers for {}", instrument.id))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (Some(date_col), Some(close_col)) = (column("Date"), column("Close")) else {
        return Err(anyhow!(
            "Unexpected response for ticker: {}. Headers: '{}'",
            instrument.id,
            headers.iter().collect::<Vec<_>>().join(",")
        ));
    };

    let parser = TextRecordParser::new(&instrument.symbol, currency, "%Y-%m-%d");
    let mut unreadable = 0;
    let mut records = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("Skipping unreadable CSV record for {}: {}", instrument.id, e);
                unreadable += 1;
            }
        }
    }
    let rows = records.iter().map(|record| {
        (
            record.get(date_col).unwrap_or(""),
            record.get(close_col).unwrap_or(""),
        )
    });

    let mut series = parse_rows(&parser, rows);
    series.skipped += unreadable;
    Ok(series)
}

/// Daily closing prices from stooq.com.
pub struct StooqProvider {
    base_url: String,
    suffix: String,
    currency: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl StooqProvider {
    pub fn new(config: &StooqConfig, end_date: NaiveDate) -> Self {
        StooqProvider {
            base_url: config.base_url.clone(),
            suffix: config.suffix.clone(),
            currency: config.currency.clone(),
            start_date: config.start_date,
            end_date,
        }
    }

    /// Instruments of one configured ticker: the plain series, plus the
    /// dividend-adjusted one when requested.
    pub fn instruments(config: &StooqConfig, ticker: &str) -> Vec<Instrument> {
        let convert_to = config
            .converted
            .iter()
            .any(|t| t == ticker)
            .then(|| config.convert_to.clone())
            .flatten();

        let mut instruments = vec![Instrument::ticker(ticker, false).with_conversion(convert_to.clone())];
        if config.dividend_adjusted.iter().any(|t| t == ticker) {
            instruments.push(Instrument::ticker(ticker, true).with_conversion(convert_to));
        }
        instruments
    }

    fn url(&self, instrument: &Instrument) -> String {
        // Splits are always skipped; the second flag toggles dividend adjustment.
        let div_flag = if instrument.dividend_adjusted { '0' } else { '1' };
        format!(
            "{}?s={}{}&f={}&t={}&i=d&o=1{}00000",
            self.base_url,
            instrument.id,
            self.suffix,
            self.start_date.format("%Y%m%d"),
            self.end_date.format("%Y%m%d"),
            div_flag
        )
    }
}

#[async_trait]
impl SeriesSource for StooqProvider {
    fn name(&self) -> &'static str {
        "stooq"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Price
    }

    #[instrument(name = "StooqFetch", skip(self, instrument), fields(symbol = %instrument.symbol))]
    async fn fetch_series(&self, instrument: &Instrument) -> Result<ParsedSeries> {
        let client = http_client()?;
        let url = self.url(instrument);
        debug!("Requesting price data from {}", url);

        let payload = fetch_text(
            || client.get(&url),
            &format!("ticker: {}", instrument.id),
        )
        .await?;

        if payload.trim().is_empty() || payload.trim().eq_ignore_ascii_case("no data") {
            return Err(anyhow!("No data for ticker: {}", instrument.id));
        }

        let series = parse_payload(instrument, &self.currency, &payload)?;
        if series.points.is_empty() {
            return Err(anyhow!("No data for ticker: {}", instrument.id));
        }
        Ok(series)
    }
}
