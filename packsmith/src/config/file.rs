//! Batch configuration file handling.
//!
//! ```ini
//! [build]
//! regions = AL, AZ, AR
//! output_dir = packs
//! workers = 4
//! verbosity = 1
//!
//! [tools]
//! builder = openmander-build
//! builder_args = --quiet
//! loader = openmander-load
//! ```
//!
//! A missing file yields defaults. Values given on the command line take
//! precedence over the file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::build::{BatchConfig, DEFAULT_VERBOSITY, DEFAULT_WORKERS};
use crate::publisher::DEFAULT_PACKS_DIR;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[build]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Region codes to build.
    pub regions: Vec<String>,
    /// Directory handed to the pack-builder.
    pub output_dir: PathBuf,
    /// Maximum simultaneous builds.
    pub workers: usize,
    /// Verbosity handed to the pack-builder.
    pub verbosity: u8,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_PACKS_DIR),
            workers: DEFAULT_WORKERS,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// Pack-builder program.
    pub builder: Option<String>,
    /// Extra arguments for the pack-builder.
    pub builder_args: Vec<String>,
    /// Map-loader program; packs are only checked for existence when unset.
    pub loader: Option<String>,
    /// Extra arguments for the map-loader.
    pub loader_args: Vec<String>,
}

/// Parsed batch configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchConfigFile {
    pub build: BuildSettings,
    pub tools: ToolSettings,
}

impl BatchConfigFile {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        parse_ini(&ini)
    }

    /// The batch run described by the `[build]` section.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(self.build.regions.clone(), self.build.output_dir.clone())
            .with_workers(self.build.workers)
            .with_verbosity(self.build.verbosity)
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Split a comma- or whitespace-separated region list.
///
/// Codes are upper-cased; the pack-builder expects postal-style codes.
pub fn parse_region_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn parse_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Start from defaults and overlay any values found in the INI.
fn parse_ini(ini: &Ini) -> Result<BatchConfigFile, ConfigFileError> {
    let mut config = BatchConfigFile::default();

    if let Some(section) = ini.section(Some("build")) {
        if let Some(v) = section.get("regions") {
            config.build.regions = parse_region_list(v);
        }
        if let Some(v) = section.get("output_dir") {
            if let Some(dir) = non_empty(v) {
                config.build.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(v) = section.get("workers") {
            config.build.workers = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("build", "workers", v, "must be a positive integer")),
            };
        }
        if let Some(v) = section.get("verbosity") {
            config.build.verbosity = v
                .trim()
                .parse()
                .map_err(|_| invalid("build", "verbosity", v, "must be between 0 and 255"))?;
        }
    }

    if let Some(section) = ini.section(Some("tools")) {
        if let Some(v) = section.get("builder") {
            config.tools.builder = non_empty(v);
        }
        if let Some(v) = section.get("builder_args") {
            config.tools.builder_args = parse_args(v);
        }
        if let Some(v) = section.get("loader") {
            config.tools.loader = non_empty(v);
        }
        if let Some(v) = section.get("loader_args") {
            config.tools.loader_args = parse_args(v);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = BatchConfigFile::load_from(&temp.path().join("batch.ini")).unwrap();
        assert_eq!(config, BatchConfigFile::default());
        assert_eq!(config.build.workers, DEFAULT_WORKERS);
        assert_eq!(config.build.output_dir, PathBuf::from("packs"));
    }

    #[test]
    fn test_load_full_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("batch.ini");
        fs::write(
            &path,
            "[build]\n\
             regions = al, AZ,AR\n\
             output_dir = /data/packs\n\
             workers = 8\n\
             verbosity = 2\n\
             \n\
             [tools]\n\
             builder = openmander-build\n\
             builder_args = --quiet --no-cache\n\
             loader = openmander-load\n",
        )
        .unwrap();

        let config = BatchConfigFile::load_from(&path).unwrap();

        assert_eq!(config.build.regions, vec!["AL", "AZ", "AR"]);
        assert_eq!(config.build.output_dir, PathBuf::from("/data/packs"));
        assert_eq!(config.build.workers, 8);
        assert_eq!(config.build.verbosity, 2);
        assert_eq!(config.tools.builder.as_deref(), Some("openmander-build"));
        assert_eq!(config.tools.builder_args, vec!["--quiet", "--no-cache"]);
        assert_eq!(config.tools.loader.as_deref(), Some("openmander-load"));
        assert!(config.tools.loader_args.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = BatchConfigFile::parse("[build]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "workers"));
        assert!(err.to_string().contains("build.workers"));
    }

    #[test]
    fn test_bad_verbosity_rejected() {
        let err = BatchConfigFile::parse("[build]\nverbosity = loud\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "verbosity"));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = BatchConfigFile::parse("[build]\noutput_dir =\n[tools]\nloader = \n").unwrap();
        assert_eq!(config.build.output_dir, PathBuf::from("packs"));
        assert_eq!(config.tools.loader, None);
    }

    #[test]
    fn test_batch_config() {
        let config =
            BatchConfigFile::parse("[build]\nregions = IL TX\nworkers = 2\nverbosity = 0\n")
                .unwrap()
                .batch_config();
        assert_eq!(config.regions, vec!["IL", "TX"]);
        assert_eq!(config.workers, 2);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_parse_region_list() {
        assert_eq!(parse_region_list("ca, me ,OR  wv"), vec!["CA", "ME", "OR", "WV"]);
        assert!(parse_region_list(" , ").is_empty());
    }
}
