//! Typed daemon and scanner configuration

use std::path::PathBuf;
use std::time::Duration;

use contracts::ContractError;
use serde::{Serialize, Serializer};

use crate::params::{at_least, bool_or, parsed_or, required, seconds_or};
use crate::parser::{ParamSections, Params};

fn as_seconds<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// One serial instrument (`[gps]` or `[sounder]`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceConfig {
    /// Section name, also used as the worker name
    #[serde(skip)]
    pub name: String,

    pub port: String,

    pub baud: u32,

    /// Headers removed from this source's registry
    pub disable_nmea: Vec<String>,

    pub check_checksums: bool,

    /// Per-read serial timeout
    #[serde(serialize_with = "as_seconds")]
    pub read_timeout: Duration,
}

impl SourceConfig {
    pub fn from_params(section: &str, params: &Params) -> Result<Self, ContractError> {
        let port = required(params, section, "port")?;

        let baud: u32 = parsed_or(params, section, "baud", 4800)?;
        if baud == 0 {
            return Err(ContractError::config_validation(
                format!("{section}.baud"),
                "must be > 0",
            ));
        }

        let disable_nmea: Vec<String> = params
            .get("disable_nmea")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        if let Some(bad) = disable_nmea
            .iter()
            .find(|h| h.len() != 6 || !h.starts_with('$'))
        {
            return Err(ContractError::config_validation(
                format!("{section}.disable_nmea"),
                format!("'{bad}' is not a sentence header like $GPRMB"),
            ));
        }

        Ok(Self {
            name: section.to_string(),
            port,
            baud,
            disable_nmea,
            check_checksums: bool_or(params, section, "check_checksums", false)?,
            read_timeout: seconds_or(params, section, "read_timeout", 0.05)?,
        })
    }
}

/// Shared file writer (`[writer]`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterConfig {
    pub output_file: PathBuf,

    #[serde(serialize_with = "as_seconds")]
    pub interval: Duration,
}

impl WriterConfig {
    pub fn from_params(params: &Params) -> Result<Self, ContractError> {
        Ok(Self {
            output_file: required(params, "writer", "output_file")?.into(),
            interval: seconds_or(params, "writer", "interval", 0.1)?,
        })
    }
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaemonConfig {
    pub gps: SourceConfig,
    pub sounder: SourceConfig,
    pub writer: WriterConfig,
}

impl DaemonConfig {
    pub fn from_sections(sections: &ParamSections) -> Result<Self, ContractError> {
        Ok(Self {
            gps: SourceConfig::from_params("gps", sections.require("gps")?)?,
            sounder: SourceConfig::from_params("sounder", sections.require("sounder")?)?,
            writer: WriterConfig::from_params(sections.require("writer")?)?,
        })
    }

    /// Both sources in start order
    pub fn sources(&self) -> [&SourceConfig; 2] {
        [&self.gps, &self.sounder]
    }
}

/// Scanner configuration (`[scanner]`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannerConfig {
    pub db_file: PathBuf,

    /// Shared file published by the daemon
    pub nmea_file: PathBuf,

    /// Speed (knots) under which recording pauses
    pub minspeed: f64,

    pub pause_on_stop: bool,

    #[serde(serialize_with = "as_seconds")]
    pub polling_interval: Duration,

    pub commit_interval: u64,

    pub log_point_count: bool,

    pub log_point_count_interval: u64,
}

impl ScannerConfig {
    pub fn from_sections(sections: &ParamSections) -> Result<Self, ContractError> {
        Self::from_params(sections.require("scanner")?)
    }

    pub fn from_params(params: &Params) -> Result<Self, ContractError> {
        const S: &str = "scanner";

        let minspeed: f64 = parsed_or(params, S, "minspeed", 0.5)?;
        if !minspeed.is_finite() || minspeed < 0.0 {
            return Err(ContractError::config_validation(
                "scanner.minspeed",
                format!("must be a non-negative number, got {minspeed}"),
            ));
        }

        Ok(Self {
            db_file: required(params, S, "db_file")?.into(),
            nmea_file: required(params, S, "nmea_file")?.into(),
            minspeed,
            pause_on_stop: bool_or(params, S, "pause_on_stop", true)?,
            polling_interval: seconds_or(params, S, "polling_interval", 0.5)?,
            commit_interval: at_least(params, S, "commit_interval", 500, 1)?,
            log_point_count: bool_or(params, S, "log_point_count", true)?,
            log_point_count_interval: at_least(params, S, "log_point_count_interval", 1000, 1)?,
        })
    }

    /// Milestone interval, if milestone logging is on
    pub fn log_interval(&self) -> Option<u64> {
        self.log_point_count.then_some(self.log_point_count_interval)
    }
}
