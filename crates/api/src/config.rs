use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use extract::RiskTaxonomy;
use sources::{FetchSettings, RetrySettings};
use stamp::Stamper;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "fundrisk.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchSettings,
    pub retry: RetrySettings,
    pub semantic: SemanticConfig,
    pub cache: CacheConfig,
    /// JSON taxonomy replacing the built-in fund risk table
    pub taxonomy_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub stamp: StampConfig,
    pub server: ServerConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub state_file: PathBuf,
    pub default_old_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            retry: RetrySettings::default(),
            semantic: SemanticConfig::default(),
            cache: CacheConfig::default(),
            taxonomy_path: None,
            output_dir: PathBuf::from("results"),
            stamp: StampConfig::default(),
            server: ServerConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: semantic::DEFAULT_OLLAMA_URL.to_string(),
            model: semantic::DEFAULT_EMBEDDING_MODEL.to_string(),
            threshold: extract::DEFAULT_SEMANTIC_THRESHOLD,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10000 }
    }
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("stamp_state.json"),
            default_old_text: stamp::DEFAULT_OLD_TEXT.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Read the config file and apply environment overrides.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(code) = lookup("FUNDRISK_ACCESS_CODE").filter(|v| !v.is_empty()) {
            self.fetch.access_code = code;
        }
        if let Some(path) = lookup("FUNDRISK_TAXONOMY").filter(|v| !v.is_empty()) {
            self.taxonomy_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("FUNDRISK_OLLAMA_URL").filter(|v| !v.is_empty()) {
            self.semantic.base_url = url;
            self.semantic.enabled = true;
        }
    }

    pub fn taxonomy(&self) -> Result<RiskTaxonomy> {
        match &self.taxonomy_path {
            Some(path) => RiskTaxonomy::from_file(path)
                .with_context(|| format!("Failed to load taxonomy {}", path.display())),
            None => Ok(RiskTaxonomy::fund_risks()),
        }
    }

    pub fn stamper(&self) -> Stamper {
        Stamper::new(&self.output_dir, &self.stamp.state_file)
            .with_default_old_text(self.stamp.default_old_text.clone())
    }

    /// A bare file name refers to a template in the output folder
    pub fn resolve_template(&self, template: &str) -> PathBuf {
        let path = Path::new(template);
        if path.components().count() == 1 && !path.exists() {
            self.output_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
