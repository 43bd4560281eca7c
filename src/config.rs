use crate::error::{Error, Result};
use crate::reconcile::TimeModel;
use crate::record::MissingFieldPolicy;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub ocr: OcrSection,
}

fn default_db_path() -> String {
    "deliveries/deliveries.db".to_string()
}

/// Constants consumed only by the aggregator.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateConfig {
    #[serde(default = "default_cost_per_mile")]
    pub cost_per_mile: f64,
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,
}

fn default_cost_per_mile() -> f64 {
    0.65
}

fn default_rolling_window() -> usize {
    6
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            cost_per_mile: default_cost_per_mile(),
            rolling_window: default_rolling_window(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseConfig {
    #[serde(default)]
    pub time_model: TimeModel,
    #[serde(default)]
    pub missing_field: MissingFieldPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    #[default]
    Tesseract,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrSection {
    #[serde(default)]
    pub backend: OcrBackend,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tesseract: TesseractConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_language() -> String {
    "eng".to_string()
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            backend: OcrBackend::default(),
            language: default_language(),
            tesseract: TesseractConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TesseractConfig {
    #[serde(default = "default_tesseract_binary")]
    pub binary: String,
}

fn default_tesseract_binary() -> String {
    "tesseract".to_string()
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: default_tesseract_binary(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub base_url: String,
}

fn default_remote_url() -> String {
    "http://localhost:8884".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            aggregate: AggregateConfig::default(),
            parse: ParseConfig::default(),
            ocr: OcrSection::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "Loading config");
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.aggregate.rolling_window == 0 {
            return Err(Error::config("aggregate.rolling_window must be at least 1"));
        }
        if !self.aggregate.cost_per_mile.is_finite() || self.aggregate.cost_per_mile < 0.0 {
            return Err(Error::config(
                "aggregate.cost_per_mile must be a non-negative number",
            ));
        }
        Ok(())
    }
}
