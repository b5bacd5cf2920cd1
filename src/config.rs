//! Configuration file support.
//!
//! The config file is TOML and every key is optional:
//!
//! ```toml
//! [format_type]
//! type = "json"
//!
//! [format_strings]
//! bucket_count_string = "{0} concurrent: {1}"
//! ```
//!
//! Missing keys fall back to the built-in report templates.

use crate::report::{OutputFormat, ReportTemplates};
use serde::Deserialize;
use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub format_type: FormatTypeSection,
    pub format_strings: ReportTemplates,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormatTypeSection {
    #[serde(rename = "type")]
    pub kind: Option<OutputFormat>,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config for a run.
    ///
    /// An explicitly given path must exist. Without one, the default path
    /// is used if present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_path(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Output format: the command-line choice wins over the config file.
    pub fn output_format(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.format_type.kind).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.output_format(None), OutputFormat::Text);
    }

    #[test]
    fn test_partial_format_strings() {
        let config = Config::from_toml(
            r#"
            [format_type]
            type = "json"

            [format_strings]
            bucket_count_string = "{0} -> {1}"
            "#,
        )
        .unwrap();

        assert_eq!(config.format_type.kind, Some(OutputFormat::Json));
        assert_eq!(config.format_strings.bucket_count_string, "{0} -> {1}");
        assert_eq!(
            config.format_strings.script_time_string,
            ReportTemplates::default().script_time_string
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config::from_toml("[format_type]\ntype = \"json\"\n").unwrap();
        assert_eq!(config.output_format(None), OutputFormat::Json);
        assert_eq!(
            config.output_format(Some(OutputFormat::Text)),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_invalid_format_type() {
        assert!(Config::from_toml("[format_type]\ntype = \"yaml\"\n").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[format_type]\ntype = \"json\"\n").unwrap();
        file.flush().unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.format_type.kind, Some(OutputFormat::Json));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/qconc.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
