//! Loading [`GameConfig`] from TOML files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tower_siege_core::{GameConfig, InvalidConfig, MapError};

/// Failure to produce a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or does not match the configuration schema.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// A stat table holds a value outside its allowed range.
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
    /// The map layout cannot be built.
    #[error("invalid map layout")]
    Map(#[from] MapError),
}

/// Reads and validates a configuration file.
///
/// Keys missing from the file keep their default values.
pub fn load(path: &Path) -> Result<GameConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_toml_str(&text)
}

/// Parses and validates configuration text.
pub fn from_toml_str(text: &str) -> Result<GameConfig, ConfigError> {
    let config: GameConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
