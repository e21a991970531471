//! One instrument's run from parsed points to ledger files

use crate::core::cross::CurrencyCrossJoiner;
use crate::core::error::PipelineError;
use crate::core::ledger::{LedgerWriter, SeriesCounts};
use crate::core::normalize::RateNormalizer;
use crate::core::point::{Instrument, PricePoint, ValueKind};
use crate::core::rates::RateTable;
use tracing::{info, warn};

/// Rate table and target currency of an instrument's converted series.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    pub table: &'a RateTable,
    pub target: &'a str,
}

/// Outcome of one destination pair.
#[derive(Debug)]
pub struct OutputReport {
    pub stem: String,
    pub result: Result<SeriesCounts, PipelineError>,
}

/// Everything written for one instrument.
#[derive(Debug)]
pub struct InstrumentReport {
    pub symbol: String,
    pub skipped_rows: usize,
    pub outputs: Vec<OutputReport>,
}

impl InstrumentReport {
    pub fn is_ok(&self) -> bool {
        self.outputs.iter().all(|o| o.result.is_ok())
    }
}

/// Normalizes, digests and writes series through one [`LedgerWriter`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    writer: LedgerWriter,
    normalizer: RateNormalizer,
}

impl Pipeline {
    pub fn new(writer: LedgerWriter) -> Self {
        Self {
            writer,
            normalizer: RateNormalizer::new(),
        }
    }

    /// Writes the full and monthly files of `instrument`, then the converted
    /// pair when `conversion` is given. A failing pair does not stop the other.
    pub fn run(
        &self,
        instrument: &Instrument,
        points: &[PricePoint],
        kind: ValueKind,
        skipped_rows: usize,
        conversion: Option<Conversion<'_>>,
    ) -> InstrumentReport {
        warn_if_unordered(instrument, points);

        let normalized = self.normalizer.normalize_all(points, kind);
        let mut outputs = vec![OutputReport {
            stem: instrument.file_stem.clone(),
            result: self
                .writer
                .write_series(&instrument.file_stem, &normalized, kind),
        }];

        if let Some(conversion) = conversion {
            let joined = CurrencyCrossJoiner::new(conversion.table, conversion.target).join(&normalized);
            let stem = instrument.converted_stem(conversion.target);
            let result = self.writer.write_series(&stem, &joined, ValueKind::Price);
            outputs.push(OutputReport { stem, result });
        }

        for output in &outputs {
            match &output.result {
                Ok(counts) => info!(
                    "{}: {} entries saved ({} monthly)",
                    output.stem, counts.full, counts.monthly
                ),
                Err(e) => warn!("{}: {}", output.stem, e),
            }
        }

        InstrumentReport {
            symbol: instrument.symbol.clone(),
            skipped_rows,
            outputs,
        }
    }
}

/// Input order is not corrected; a regression only gets reported since the
/// monthly digest may then repeat a month.
fn warn_if_unordered(instrument: &Instrument, points: &[PricePoint]) {
    if let Some(pair) = points.windows(2).find(|w| w[1].date() < w[0].date()) {
        warn!(
            "{}: dates out of order ({} after {}), monthly digest may repeat months",
            instrument.symbol,
            pair[1].date(),
            pair[0].date()
        );
    }
}
