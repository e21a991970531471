use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CnbConfig {
    #[serde(default = "CnbConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "CnbConfig::default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub currencies: Vec<String>,
    /// Discontinued currencies, fetched only with `--historic`.
    #[serde(default)]
    pub historic_currencies: Vec<String>,
}

impl CnbConfig {
    fn default_base_url() -> String {
        "https://www.cnb.cz/cs/financni-trhy/devizovy-trh/kurzy-devizoveho-trhu/kurzy-devizoveho-trhu/vybrane.txt".to_string()
    }

    fn default_start_date() -> NaiveDate {
        default_start(2000)
    }
}

impl Default for CnbConfig {
    fn default() -> Self {
        CnbConfig {
            base_url: Self::default_base_url(),
            start_date: Self::default_start_date(),
            currencies: Vec::new(),
            historic_currencies: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StooqConfig {
    #[serde(default = "StooqConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "StooqConfig::default_suffix")]
    pub suffix: String,
    #[serde(default = "StooqConfig::default_currency")]
    pub currency: String,
    #[serde(default = "StooqConfig::default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub historic_tickers: Vec<String>,
    /// Tickers additionally fetched as a dividend-adjusted series.
    #[serde(default)]
    pub dividend_adjusted: Vec<String>,
    /// Target currency of converted series.
    #[serde(default)]
    pub convert_to: Option<String>,
    /// Tickers whose series are also written in `convert_to`.
    #[serde(default)]
    pub converted: Vec<String>,
}

impl StooqConfig {
    fn default_base_url() -> String {
        "https://stooq.com/q/d/l/".to_string()
    }

    fn default_suffix() -> String {
        ".us".to_string()
    }

    fn default_currency() -> String {
        "USD".to_string()
    }

    fn default_start_date() -> NaiveDate {
        default_start(2015)
    }
}

impl Default for StooqConfig {
    fn default() -> Self {
        StooqConfig {
            base_url: Self::default_base_url(),
            suffix: Self::default_suffix(),
            currency: Self::default_currency(),
            start_date: Self::default_start_date(),
            tickers: Vec::new(),
            historic_tickers: Vec::new(),
            dividend_adjusted: Vec::new(),
            convert_to: None,
            converted: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PseStock {
    pub isin: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PseConfig {
    #[serde(default = "PseConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub stocks: Vec<PseStock>,
    #[serde(default)]
    pub historic_stocks: Vec<PseStock>,
}

impl PseConfig {
    fn default_base_url() -> String {
        "https://www.pse.cz".to_string()
    }
}

impl Default for PseConfig {
    fn default() -> Self {
        PseConfig {
            base_url: Self::default_base_url(),
            stocks: Vec::new(),
            historic_stocks: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Directory ledgers are written to. Defaults to the working directory.
    pub output_dir: Option<String>,
    /// Directory rate tables are read from. Defaults to `output_dir`.
    pub rates_dir: Option<String>,
    #[serde(default)]
    pub cnb: CnbConfig,
    #[serde(default)]
    pub stooq: StooqConfig,
    #[serde(default)]
    pub pse: PseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "ledgerfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }

    /// Rate tables directory; falls back to the effective `output_dir`.
    pub fn rates_path(&self, output_dir: &Path) -> PathBuf {
        self.rates_dir
            .as_ref()
            .map_or_else(|| output_dir.to_path_buf(), PathBuf::from)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
