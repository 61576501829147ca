use serde::Deserialize;
use std::path::Path;

use schem2nbt_convert::MIN_DATA_VERSION;

use crate::error::CliError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "schem2nbt.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ConversionSection {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_data_version")]
    pub data_version: i32,
}

fn default_data_version() -> i32 {
    MIN_DATA_VERSION
}

impl Default for ConversionSection {
    fn default() -> Self {
        Self {
            author: None,
            data_version: default_data_version(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        toml::from_str(&contents).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// An explicit path must exist; the default file is optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, CliError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG).is_file() => Self::load(DEFAULT_CONFIG),
            None => Ok(Self::default()),
        }
    }
}
