//! Core business logic abstractions

pub mod config;
pub mod cross;
pub mod downsample;
pub mod error;
pub mod ledger;
pub mod log;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod point;
pub mod rates;
pub mod source;

// Re-export main types for cleaner imports
pub use cross::CurrencyCrossJoiner;
pub use downsample::MonthlyDownsampler;
pub use error::{PipelineError, RateTableError, SkipRow};
pub use ledger::LedgerWriter;
pub use normalize::RateNormalizer;
pub use parser::{ParsedSeries, RecordParser, TextRecordParser};
pub use pipeline::{Conversion, InstrumentReport, Pipeline};
pub use point::{Instrument, PricePoint, ValueKind};
pub use rates::{RateTable, RateTables};
pub use source::SeriesSource;
