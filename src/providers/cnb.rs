use crate::core::config::CnbConfig;
use crate::core::parser::{ParsedSeries, TextRecordParser, parse_rows};
use crate::core::point::{Instrument, ValueKind};
use crate::core::source::SeriesSource;
use crate::providers::util::{fetch_text, http_client};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::num::NonZeroU32;
use tracing::{debug, instrument};

/// Currency every CNB rate is quoted in.
pub const CNB_CURRENCY: &str = "CZK";

const QUANTITY_LABEL: &str = "Množství:";

/// First field of the column header row following the metadata line.
const DATE_COLUMN: &str = "Datum";

/// Extracts the quoted quantity from the metadata line, e.g.
/// `Měna: HUF|Množství: 100`. Defaults to 1.
pub fn parse_quantity(header: &str) -> NonZeroU32 {
    header
        .find(QUANTITY_LABEL)
        .map(|at| header[at + QUANTITY_LABEL.len()..].trim_start())
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<NonZeroU32>().ok()
        })
        .unwrap_or(NonZeroU32::MIN)
}

/// Parses a CNB text payload: a metadata line and the column header row,
/// followed by `DD.MM.YYYY|rate` rows.
pub fn parse_payload(instrument: &Instrument, payload: &str) -> ParsedSeries {
    let mut lines = payload.trim().lines().peekable();
    let Some(header) = lines.next() else {
        return ParsedSeries::default();
    };

    let parser = TextRecordParser::new(&instrument.symbol, CNB_CURRENCY, "%d.%m.%Y")
        .with_divisor(parse_quantity(header));
    debug!(
        "Parsing {} with divisor {}",
        instrument.id,
        parser.divisor()
    );

    lines.next_if(|line| line.split('|').next().map(str::trim) == Some(DATE_COLUMN));

    let rows = lines.map(|line| {
        let mut parts = line.split('|');
        (parts.next().unwrap_or(""), parts.next().unwrap_or(""))
    });
    parse_rows(&parser, rows)
}

/// Czech National Bank daily exchange rates of one currency against CZK.
pub struct CnbProvider {
    base_url: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl CnbProvider {
    pub fn new(config: &CnbConfig, end_date: NaiveDate) -> Self {
        CnbProvider {
            base_url: config.base_url.clone(),
            start_date: config.start_date,
            end_date,
        }
    }

    /// Rate instruments are written as `<CODE>CZK` with the code as symbol.
    pub fn instrument(code: &str) -> Instrument {
        Instrument::new(code, code).with_file_stem(format!("{code}{CNB_CURRENCY}"))
    }
}

#[async_trait]
impl SeriesSource for CnbProvider {
    fn name(&self) -> &'static str {
        "cnb"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Rate
    }

    #[instrument(name = "CnbFetch", skip(self, instrument), fields(currency = %instrument.id))]
    async fn fetch_series(&self, instrument: &Instrument) -> Result<ParsedSeries> {
        let client = http_client()?;
        let url = format!(
            "{}?od={}&do={}&mena={}&format=txt",
            self.base_url,
            self.start_date.format("%d.%m.%Y"),
            self.end_date.format("%d.%m.%Y"),
            instrument.id
        );
        debug!("Requesting rates from {}", url);

        let payload = fetch_text(
            || client.get(&url),
            &format!("currency: {}", instrument.id),
        )
        .await?;

        let series = parse_payload(instrument, &payload);
        if series.points.is_empty() {
            return Err(anyhow!("No data for currency: {}", instrument.id));
        }
        Ok(series)
    }
}
