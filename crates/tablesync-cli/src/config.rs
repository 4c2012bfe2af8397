//! Configuration loading for the CLI
//!
//! Resolves the sync configuration from the optional TOML file and the
//! environment, then applies command-line flags on top.

use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use tablesync_ingest::config::{parse_delimiter, ConfigFile, SyncConfig, DEFAULT_CONFIG_FILE};

/// Settings given as command-line flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub delimiter: Option<String>,
    pub batch_size: Option<usize>,
    pub key_column: Option<String>,
}

/// The config file to read: the explicit one, else `tablesync.toml` if present
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        },
    }
}

pub fn read_config_file(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) if !path.is_file() => Err(CliError::config(format!(
            "config file '{}' does not exist",
            path.display()
        ))),
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config file");
            Ok(ConfigFile::load(path)?)
        },
        None => Ok(ConfigFile::default()),
    }
}

/// Apply flags on top of a resolved configuration
pub fn apply_overrides(mut config: SyncConfig, overrides: &Overrides) -> Result<SyncConfig> {
    if let Some(delimiter) = &overrides.delimiter {
        config.sync.delimiter = Some(parse_delimiter(delimiter)?);
    }
    if let Some(batch_size) = overrides.batch_size {
        config.sync.batch_size = batch_size;
    }
    if let Some(key_column) = &overrides.key_column {
        config.sync.key_column = key_column.clone();
    }
    config.sync.validate()?;
    Ok(config)
}

/// Full resolution: file, `.env` and environment, then flags
///
/// Remote credentials are not checked here; commands that talk to the
/// remote store validate them before connecting.
pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<SyncConfig> {
    let file = read_config_file(locate_config_file(config_path).as_deref())?;
    let config = SyncConfig::from_env(Some(file))?;
    apply_overrides(config, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> SyncConfig {
        SyncConfig::resolve(ConfigFile::default(), |_| None).unwrap()
    }

    #[test]
    fn test_flags_win() {
        let overrides = Overrides {
            delimiter: Some(";".to_string()),
            batch_size: Some(3),
            key_column: Some("exam_id".to_string()),
        };
        let config = apply_overrides(base_config(), &overrides).unwrap();
        assert_eq!(config.sync.delimiter, Some(b';'));
        assert_eq!(config.sync.batch_size, 3);
        assert_eq!(config.sync.key_column, "exam_id");
    }

    #[test]
    fn test_zero_batch_size_flag_rejected() {
        let overrides = Overrides {
            batch_size: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            apply_overrides(base_config(), &overrides),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = read_config_file(Some(Path::new("/nonexistent/tablesync.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\nbatch_size = 7\nkey_column = \"question_id\"").unwrap();

        let parsed = read_config_file(Some(file.path())).unwrap();
        let config = SyncConfig::resolve(parsed, |_| None).unwrap();
        assert_eq!(config.sync.batch_size, 7);
        assert_eq!(config.sync.key_column, "question_id");
    }
}
