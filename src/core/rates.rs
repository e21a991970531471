//! Exchange-rate tables read back from previously written ledgers

use crate::core::error::RateTableError;
use crate::core::ledger::DATE_FORMAT;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Date-keyed rates of one currency pair. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<NaiveDate, Decimal>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rates(rates: impl IntoIterator<Item = (NaiveDate, Decimal)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Loads a full-resolution ledger file. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self, RateTableError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Rate table {} not found, conversions will be empty",
                    path.display()
                );
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(RateTableError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let table = Self::parse(&content, path)?;
        debug!("Loaded {} rates from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses ledger text. Only `P` directives with at least four fields are
    /// rate records; the symbol field is ignored.
    pub fn parse(content: &str, path: &Path) -> Result<Self, RateTableError> {
        let mut rates = HashMap::new();
        for (index, line) in content.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || fields[0] != "P" {
                continue;
            }

            let invalid = |reason: String| RateTableError::InvalidRecord {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };
            let date = NaiveDate::parse_from_str(fields[1], DATE_FORMAT)
                .map_err(|_| invalid(format!("bad date '{}'", fields[1])))?;
            let rate = Decimal::from_str(fields[3])
                .map_err(|_| invalid(format!("bad rate '{}'", fields[3])))?;

            rates.insert(date, rate);
        }
        Ok(Self { rates })
    }

    pub fn get(&self, date: &NaiveDate) -> Option<Decimal> {
        self.rates.get(date).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Rate tables of one run, loaded on first use and kept until the run ends.
///
/// The table converting `from` into `to` is read from `<dir>/<from><to>.ledger`.
#[derive(Debug)]
pub struct RateTables {
    dir: PathBuf,
    loaded: HashMap<(String, String), RateTable>,
}

impl RateTables {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: HashMap::new(),
        }
    }

    pub fn path_for(&self, from: &str, to: &str) -> PathBuf {
        self.dir.join(format!("{from}{to}.ledger"))
    }

    pub fn get_or_load(&mut self, from: &str, to: &str) -> Result<&RateTable, RateTableError> {
        let key = (from.to_string(), to.to_string());
        if !self.loaded.contains_key(&key) {
            let table = RateTable::load(&self.path_for(from, to))?;
            self.loaded.insert(key.clone(), table);
        }
        Ok(&self.loaded[&key])
    }
}
