//! Ledger configuration.
//!
//! Loaded from a TOML file; a missing file yields the defaults. The default
//! location is the user's config directory (`ledger.toml`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ledger_model::{ModelError, TableKey, TeamRoster};
use ledger_query::{CsvExportOptions, NARROW_NBSP};
use ledger_store::{ChunkPolicy, MAX_BATCH_OPS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("Team roster is empty")]
    EmptyRoster,

    #[error("Page size must be at least 1")]
    ZeroPageSize,

    #[error("Batch size {0} is outside 1..={MAX_BATCH_OPS}")]
    BatchSize(usize),

    #[error("Table {0} is listed twice")]
    DuplicateTable(String),

    #[error("Invalid table key {key:?}")]
    TableKey {
        key: String,
        #[source]
        source: ModelError,
    },

    #[error("CSV delimiter must be a single ASCII character, got {0:?}")]
    Delimiter(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A table known to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub key: String,
    /// Display label; the key is shown when empty.
    #[serde(default)]
    pub label: String,
}

impl TableEntry {
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

/// CSV export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Field delimiter, one ASCII character.
    pub delimiter: String,
    /// Digit group separator; empty disables grouping.
    pub thousands_separator: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            thousands_separator: NARROW_NBSP.to_string(),
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Team names, one contribution slot each, in slot order.
    pub teams: Vec<String>,
    /// Rows per page in `show` and `aggregate`.
    pub page_size: usize,
    /// Largest atomic batch the store accepts.
    pub max_batch_ops: usize,
    /// Store file; defaults to the user's data directory.
    pub store_path: Option<PathBuf>,
    /// Tables merged by `aggregate`, in fold order.
    pub tables: Vec<TableEntry>,
    pub export: ExportSettings,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            teams: (1..=4).map(|n| format!("team-{n}")).collect(),
            page_size: 10,
            max_batch_ops: MAX_BATCH_OPS,
            store_path: None,
            tables: Vec::new(),
            export: ExportSettings::default(),
        }
    }
}

impl LedgerConfig {
    /// Load and validate the config at `path`, or at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        let config = Self::load_from(&path)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), teams = config.teams.len(), "loaded config");
        Ok(config)
    }

    /// Parse `path` without validating; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write this config as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("org", "Ledger", "ledger")
            .map(|dirs| dirs.config_dir().join("ledger.toml"))
            .unwrap_or_else(|| PathBuf::from("ledger.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.teams.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !(1..=MAX_BATCH_OPS).contains(&self.max_batch_ops) {
            return Err(ConfigError::BatchSize(self.max_batch_ops));
        }
        let mut seen = HashSet::new();
        for entry in &self.tables {
            let key = TableKey::new(entry.key.as_str()).map_err(|source| ConfigError::TableKey {
                key: entry.key.clone(),
                source,
            })?;
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateTable(entry.key.trim().to_string()));
            }
        }
        self.delimiter()?;
        Ok(())
    }

    pub fn roster(&self) -> Result<TeamRoster> {
        TeamRoster::new(self.teams.iter().map(String::as_str)).map_err(|_| ConfigError::EmptyRoster)
    }

    /// Keys of the configured tables, in fold order.
    pub fn table_keys(&self) -> Result<Vec<TableKey>> {
        self.tables
            .iter()
            .map(|entry| {
                TableKey::new(entry.key.as_str()).map_err(|source| ConfigError::TableKey {
                    key: entry.key.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Display label of `key`, falling back to the key itself.
    pub fn label_of<'a>(&'a self, key: &'a TableKey) -> &'a str {
        self.tables
            .iter()
            .find(|entry| entry.key.trim() == key.as_str())
            .map_or(key.as_str(), TableEntry::display_label)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("org", "Ledger", "ledger")
                .map(|dirs| dirs.data_dir().join("ledger.json"))
                .unwrap_or_else(|| PathBuf::from("ledger.json"))
        })
    }

    pub fn chunk_policy(&self) -> ChunkPolicy {
        ChunkPolicy::new(self.max_batch_ops)
    }

    pub fn export_options(&self) -> Result<CsvExportOptions> {
        Ok(CsvExportOptions {
            delimiter: self.delimiter()?,
            thousands_separator: self.export.thousands_separator.chars().next(),
        })
    }

    fn delimiter(&self) -> Result<u8> {
        match self.export.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ConfigError::Delimiter(self.export.delimiter.clone())),
        }
    }
}
