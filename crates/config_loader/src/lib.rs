//! # Config Loader
//!
//! Configuration loading for the daemon and the scanner.
//!
//! Responsibilities:
//! - Parse TOML (or JSON) files into named parameter sections
//! - Apply required keys, defaults, and typed validation
//! - Produce `DaemonConfig` / `ScannerConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, DaemonConfig};
//! use std::path::Path;
//!
//! let sections = ConfigLoader::load_sections(Path::new("/etc/nmead.toml")).unwrap();
//! let config = DaemonConfig::from_sections(&sections).unwrap();
//! println!("GPS on {}", config.gps.port);
//! ```

mod config;
mod params;
mod parser;

pub use config::{DaemonConfig, ScannerConfig, SourceConfig, WriterConfig};
pub use params::parse_bool;
pub use parser::{ConfigFormat, ParamSections, Params};

use contracts::ContractError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load parameter sections from a file
    ///
    /// The format follows the extension (`.toml`, `.conf` or `.json`).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    pub fn load_sections(path: &Path) -> Result<ParamSections, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        let sections = parser::parse(&content, format)?;
        debug!(
            path = %path.display(),
            sections = ?sections.names().collect::<Vec<_>>(),
            "config loaded"
        );
        Ok(sections)
    }

    /// Load and validate the daemon configuration
    pub fn load_daemon(path: &Path) -> Result<DaemonConfig, ContractError> {
        DaemonConfig::from_sections(&Self::load_sections(path)?)
    }

    /// Load and validate the scanner configuration
    pub fn load_scanner(path: &Path) -> Result<ScannerConfig, ContractError> {
        ScannerConfig::from_sections(&Self::load_sections(path)?)
    }

    /// Serialize a validated configuration back to TOML
    pub fn to_toml<T: Serialize>(config: &T) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}
