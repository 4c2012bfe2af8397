//! Sync configuration
//!
//! Values are resolved in this order, later sources winning:
//! built-in defaults, the optional TOML file, environment variables.
//! Command-line flags are applied on top by the caller.
//!
//! ```toml
//! [remote]
//! url = "https://project.supabase.co"
//! timeout_secs = 60
//!
//! [sync]
//! batch_size = 25
//! key_column = "question_id"
//!
//! [[coercion]]
//! field = "points"
//! to = "integer"
//!
//! [[coercion]]
//! pattern = "^is_"
//! to = "boolean"
//! ```

use crate::coercion::Conversion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tablesync_common::{Result, SyncError};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Rows per insert request when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Primary key column used by update runs when nothing else is configured.
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Timeout for a single remote request in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "tablesync.toml";

/// Remote store connection settings
#[derive(Clone)]
pub struct RemoteConfig {
    /// Base URL of the project, e.g. `https://project.supabase.co`
    pub url: String,
    /// Service key sent as `apikey` and bearer token
    pub service_key: String,
    /// Target schema when it is not the default one
    pub schema: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("schema", &self.schema)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SyncError::config(
                "SUPABASE_URL must be set (environment, .env file, or [remote] url)",
            ));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(SyncError::config(format!(
                "remote url '{}' must start with http:// or https://",
                self.url
            )));
        }
        if self.service_key.trim().is_empty() {
            return Err(SyncError::config(
                "SUPABASE_SERVICE_KEY must be set (environment or .env file)",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(SyncError::config("timeout must be greater than 0 seconds"));
        }
        Ok(())
    }
}

/// Parameters shared by insert and update runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub key_column: String,
    /// Field delimiter; `None` picks one from the source file extension
    pub delimiter: Option<u8>,
    pub coercion: Vec<CoercionRuleConfig>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            delimiter: None,
            coercion: Vec::new(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SyncError::config("batch size must be at least 1"));
        }
        if self.key_column.trim().is_empty() {
            return Err(SyncError::config("key column must not be empty"));
        }
        Ok(())
    }

    /// Delimiter for `source`: the configured one, else tab for `.tsv`, else comma
    pub fn delimiter_for(&self, source: &Path) -> u8 {
        self.delimiter.unwrap_or_else(|| {
            let is_tsv = source
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
            if is_tsv {
                b'\t'
            } else {
                b','
            }
        })
    }
}

/// One `[[coercion]]` entry: a field name or pattern and the target type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoercionRuleConfig {
    /// Exact field name
    #[serde(default)]
    pub field: Option<String>,
    /// Regular expression matched against field names
    #[serde(default)]
    pub pattern: Option<String>,
    pub to: Conversion,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteSection {
    url: Option<String>,
    schema: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SyncSection {
    batch_size: Option<usize>,
    key_column: Option<String>,
    delimiter: Option<String>,
}

/// Contents of a `tablesync.toml` file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    remote: RemoteSection,
    #[serde(default)]
    sync: SyncSection,
    #[serde(default)]
    coercion: Vec<CoercionRuleConfig>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| SyncError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::config(e.to_string()))
    }
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub remote: RemoteConfig,
    pub sync: SyncSettings,
}

impl SyncConfig {
    /// Resolve from the process environment (after loading `.env`) and `file`
    pub fn from_env(file: Option<ConfigFile>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup
    ///
    /// Environment variables:
    /// - `SUPABASE_URL`, `SUPABASE_SERVICE_KEY`: remote connection
    /// - `TABLESYNC_SCHEMA`: target schema
    /// - `TABLESYNC_TIMEOUT_SECS`: request timeout
    /// - `TABLESYNC_BATCH_SIZE`: rows per insert request
    /// - `TABLESYNC_KEY_COLUMN`: primary key column for updates
    /// - `TABLESYNC_DELIMITER`: field delimiter (`,`, `;`, `tab`, ...)
    pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote = RemoteConfig {
            url: env("SUPABASE_URL")
                .or(file.remote.url)
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            service_key: env("SUPABASE_SERVICE_KEY").unwrap_or_default(),
            schema: env("TABLESYNC_SCHEMA").or(file.remote.schema),
            timeout_secs: parse_env(&env, "TABLESYNC_TIMEOUT_SECS")?
                .or(file.remote.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let delimiter = match env("TABLESYNC_DELIMITER").or(file.sync.delimiter) {
            Some(raw) => Some(parse_delimiter(&raw)?),
            None => None,
        };

        let sync = SyncSettings {
            batch_size: parse_env(&env, "TABLESYNC_BATCH_SIZE")?
                .or(file.sync.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            key_column: env("TABLESYNC_KEY_COLUMN")
                .or(file.sync.key_column)
                .unwrap_or_else(|| DEFAULT_KEY_COLUMN.to_string()),
            delimiter,
            coercion: file.coercion,
        };

        Ok(Self { remote, sync })
    }

    pub fn validate(&self) -> Result<()> {
        self.remote.validate()?;
        self.sync.validate()
    }
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SyncError::config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(None),
    }
}

/// Parse a delimiter setting: a single ASCII character, or `tab` / `\t`
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let bytes = raw.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() && bytes[0] != b'"' {
                Ok(bytes[0])
            } else {
                Err(SyncError::config(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    raw
                )))
            }
        },
    }
}
