//! Source feed abstractions

use crate::core::parser::ParsedSeries;
use crate::core::point::{Instrument, ValueKind};
use anyhow::Result;
use async_trait::async_trait;

/// A remote feed of daily values for a set of instruments.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Short name used in logs and the run summary.
    fn name(&self) -> &'static str;

    /// Category of every value this source produces.
    fn kind(&self) -> ValueKind;

    /// Downloads and parses the full history of `instrument`.
    ///
    /// Fails when nothing usable came back, so no files get written for it.
    async fn fetch_series(&self, instrument: &Instrument) -> Result<ParsedSeries>;
}
