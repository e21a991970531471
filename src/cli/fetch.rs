use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::ledger::LedgerWriter;
use crate::core::parser::ParsedSeries;
use crate::core::pipeline::{Conversion, InstrumentReport, Pipeline};
use crate::core::point::Instrument;
use crate::core::rates::RateTables;
use crate::core::source::SeriesSource;
use crate::providers::{CnbProvider, PseProvider, StooqProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{info, warn};

/// Source feeds, processed in declaration order so rate ledgers written by
/// `cnb` are available to later conversions in the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SourceKind {
    Cnb,
    Stooq,
    Pse,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Sources to run; empty means all of them.
    pub sources: Vec<SourceKind>,
    /// Also process discontinued currencies and delisted stocks.
    pub historic: bool,
    /// Restrict the run to instruments with this id or symbol.
    pub ticker: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
}

/// Result of one instrument in a run.
#[derive(Debug)]
pub enum Outcome {
    Written(InstrumentReport),
    Failed(String),
}

#[derive(Debug)]
pub struct RunEntry {
    pub source: &'static str,
    pub instrument: Instrument,
    pub outcome: Outcome,
}

impl RunEntry {
    pub fn is_ok(&self) -> bool {
        matches!(&self.outcome, Outcome::Written(report) if report.is_ok())
    }
}

fn select(ids: &[String], historic_ids: &[String], options: &FetchOptions) -> Vec<String> {
    let mut selected = ids.to_vec();
    if options.historic {
        selected.extend(historic_ids.iter().cloned());
    }
    selected
}

fn matches_filter(instrument: &Instrument, options: &FetchOptions) -> bool {
    options
        .ticker
        .as_ref()
        .is_none_or(|t| *t == instrument.id || *t == instrument.symbol)
}

/// Instruments of one source per config and options.
pub fn instruments_for(kind: SourceKind, config: &AppConfig, options: &FetchOptions) -> Vec<Instrument> {
    let instruments: Vec<Instrument> = match kind {
        SourceKind::Cnb => select(&config.cnb.currencies, &config.cnb.historic_currencies, options)
            .iter()
            .map(|code| CnbProvider::instrument(code))
            .collect(),
        SourceKind::Stooq => select(&config.stooq.tickers, &config.stooq.historic_tickers, options)
            .iter()
            .flat_map(|ticker| StooqProvider::instruments(&config.stooq, ticker))
            .collect(),
        SourceKind::Pse => {
            let mut stocks = config.pse.stocks.clone();
            if options.historic {
                stocks.extend(config.pse.historic_stocks.iter().cloned());
            }
            stocks.iter().map(PseProvider::instrument).collect()
        }
    };

    instruments
        .into_iter()
        .filter(|i| matches_filter(i, options))
        .collect()
}

async fn fetch_all(
    source: &dyn SeriesSource,
    instruments: &[Instrument],
) -> Vec<Result<ParsedSeries>> {
    let pb = ui::new_progress_bar(instruments.len() as u64, true);
    pb.set_message(format!("Fetching {}...", source.name()));

    let futures = instruments.iter().map(|instrument| {
        let pb_clone = pb.clone();
        async move {
            let res = source.fetch_series(instrument).await;
            pb_clone.inc(1);
            res
        }
    });

    let results = join_all(futures).await;
    pb.finish_and_clear();
    results
}

/// Fetches every instrument of `source`, then runs the pipelines one by one.
///
/// Fetch failures skip the instrument; an unusable rate table aborts the run.
pub async fn run_source(
    source: &dyn SeriesSource,
    instruments: Vec<Instrument>,
    pipeline: &Pipeline,
    rate_tables: &mut RateTables,
) -> Result<Vec<RunEntry>> {
    let results = fetch_all(source, &instruments).await;
    let mut entries = Vec::with_capacity(instruments.len());

    for (instrument, result) in instruments.into_iter().zip(results) {
        info!("Processing {}...", instrument.symbol);
        let series = match result {
            Ok(series) => series,
            Err(e) => {
                warn!("Failed to download {}: {:#}", instrument.symbol, e);
                entries.push(RunEntry {
                    source: source.name(),
                    instrument,
                    outcome: Outcome::Failed(format!("{e:#}")),
                });
                continue;
            }
        };

        let table = match (&instrument.convert_to, series.points.first()) {
            (Some(target), Some(first)) => Some(
                rate_tables
                    .get_or_load(first.currency(), target)
                    .with_context(|| format!("Cannot convert {} into {}", instrument.symbol, target))?,
            ),
            _ => None,
        };
        let conversion = table
            .zip(instrument.convert_to.as_deref())
            .map(|(table, target)| Conversion { table, target });

        let report = pipeline.run(
            &instrument,
            &series.points,
            source.kind(),
            series.skipped,
            conversion,
        );
        entries.push(RunEntry {
            source: source.name(),
            instrument,
            outcome: Outcome::Written(report),
        });
    }

    Ok(entries)
}

/// Runs the selected sources and prints a summary of written files.
pub async fn fetch(config: &AppConfig, options: &FetchOptions) -> Result<Vec<RunEntry>> {
    let output_dir = options.output_dir.clone().unwrap_or_else(|| config.output_path());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let rates_dir = config.rates_path(&output_dir);

    let end_date = options
        .end_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let pipeline = Pipeline::new(LedgerWriter::new(&output_dir));
    let mut rate_tables = RateTables::new(rates_dir);

    let mut kinds = if options.sources.is_empty() {
        vec![SourceKind::Cnb, SourceKind::Stooq, SourceKind::Pse]
    } else {
        options.sources.clone()
    };
    kinds.sort();
    kinds.dedup();

    let mut entries = Vec::new();
    for kind in kinds {
        let instruments = instruments_for(kind, config, options);
        if instruments.is_empty() {
            continue;
        }
        let source: Box<dyn SeriesSource> = match kind {
            SourceKind::Cnb => Box::new(CnbProvider::new(&config.cnb, end_date)),
            SourceKind::Stooq => Box::new(StooqProvider::new(&config.stooq, end_date)),
            SourceKind::Pse => Box::new(PseProvider::new(&config.pse)),
        };
        entries.extend(run_source(&*source, instruments, &pipeline, &mut rate_tables).await?);
    }

    if entries.is_empty() {
        warn!("Nothing to fetch, check the configured instruments");
    } else {
        println!("{}", display_as_table(&entries));
    }
    Ok(entries)
}

pub fn display_as_table(entries: &[RunEntry]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Source"),
        ui::header_cell("File"),
        ui::header_cell("Entries"),
        ui::header_cell("Monthly"),
        ui::header_cell("Skipped rows"),
        ui::header_cell("Status"),
    ]);

    for entry in entries {
        match &entry.outcome {
            Outcome::Failed(error) => {
                table.add_row(vec![
                    Cell::new(entry.source),
                    Cell::new(&entry.instrument.file_stem),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::status_cell(false, error),
                ]);
            }
            Outcome::Written(report) => {
                for output in &report.outputs {
                    let row = match &output.result {
                        Ok(counts) => vec![
                            Cell::new(entry.source),
                            Cell::new(&output.stem),
                            ui::count_cell(counts.full),
                            ui::count_cell(counts.monthly),
                            ui::count_cell(report.skipped_rows),
                            ui::status_cell(true, "ok"),
                        ],
                        Err(e) => vec![
                            Cell::new(entry.source),
                            Cell::new(&output.stem),
                            ui::na_cell(true),
                            ui::na_cell(true),
                            ui::count_cell(report.skipped_rows),
                            ui::status_cell(false, &e.to_string()),
                        ],
                    };
                    table.add_row(row);
                }
            }
        }
    }

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    let footer = if failed == 0 {
        ui::style_text(&format!("{} instruments processed", entries.len()), ui::StyleType::Subtle)
    } else {
        ui::style_text(
            &format!("{} of {} instruments failed", failed, entries.len()),
            ui::StyleType::Error,
        )
    };

    format!(
        "{}\n\n{table}\n{footer}",
        ui::style_text("Ledger update", ui::StyleType::Title)
    )
}
