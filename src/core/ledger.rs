//! Ledger price directive rendering and output files

use crate::core::downsample::MonthlyDownsampler;
use crate::core::error::PipelineError;
use crate::core::point::{PricePoint, ValueKind};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Date format of the directive date field.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Renders a value: prices with exactly two decimals, rates without trailing
/// zeros but with at least one fractional digit.
pub fn format_value(value: Decimal, kind: ValueKind) -> String {
    let mut value = value;
    match kind {
        ValueKind::Price => value.rescale(2),
        ValueKind::Rate => {
            value = value.normalize();
            if value.scale() == 0 {
                value.rescale(1);
            }
        }
    }
    value.to_string()
}

/// `P <YYYY/MM/DD> <SYMBOL> <VALUE> <CURRENCY>`
pub fn format_line(point: &PricePoint, kind: ValueKind) -> String {
    format!(
        "P {} {} {} {}",
        point.date().format(DATE_FORMAT),
        point.symbol(),
        format_value(point.value(), kind),
        point.currency()
    )
}

/// Line counts of one written destination pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesCounts {
    pub full: usize,
    pub monthly: usize,
}

/// Writes `<stem>.ledger` and `<stem>-monthly.ledger` into a directory.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    dir: PathBuf,
}

impl LedgerWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn full_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.ledger"))
    }

    pub fn monthly_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}-monthly.ledger"))
    }

    /// Rewrites both files of `stem` from `points`; the monthly file gets the
    /// digest computed by a cursor private to this call.
    pub fn write_series(
        &self,
        stem: &str,
        points: &[PricePoint],
        kind: ValueKind,
    ) -> Result<SeriesCounts, PipelineError> {
        let monthly = MonthlyDownsampler::downsample(points);
        let full_path = self.full_path(stem);
        let monthly_path = self.monthly_path(stem);

        Self::write_file(&full_path, &render(points, kind))?;
        Self::write_file(&monthly_path, &render(&monthly, kind))?;

        let counts = SeriesCounts {
            full: points.len(),
            monthly: monthly.len(),
        };
        debug!(
            "Wrote {} lines to {} and {} lines to {}",
            counts.full,
            full_path.display(),
            counts.monthly,
            monthly_path.display()
        );
        Ok(counts)
    }

    fn write_file(path: &Path, content: &str) -> Result<(), PipelineError> {
        let failure = |source: std::io::Error| PipelineError::WriteFailure {
            path: path.to_path_buf(),
            source,
        };
        let mut out = File::create(path).map(BufWriter::new).map_err(failure)?;
        out.write_all(content.as_bytes()).map_err(failure)?;
        out.flush().map_err(failure)
    }
}

/// Renders `points` as ledger text, one newline-terminated line per point.
pub fn render(points: &[PricePoint], kind: ValueKind) -> String {
    points
        .iter()
        .map(|p| format_line(p, kind) + "\n")
        .collect()
}
