//! Typed access to section parameters
//!
//! Every accessor reports failures as `ConfigValidation` with a
//! `section.key` path.

use std::str::FromStr;
use std::time::Duration;

use contracts::ContractError;

use crate::parser::Params;

fn path(section: &str, key: &str) -> String {
    format!("{section}.{key}")
}

/// Non-empty value that must be present
pub fn required(params: &Params, section: &str, key: &str) -> Result<String, ContractError> {
    match params.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        Some(_) => Err(ContractError::config_validation(path(section, key), "must not be empty")),
        None => Err(ContractError::config_validation(path(section, key), "required key missing")),
    }
}

/// Parsed value, or `default` when the key is absent
pub fn parsed_or<T>(params: &Params, section: &str, key: &str, default: T) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            ContractError::config_validation(path(section, key), format!("invalid value '{raw}': {e}"))
        }),
    }
}

/// Boolean in any of the accepted spellings
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn bool_or(params: &Params, section: &str, key: &str, default: bool) -> Result<bool, ContractError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => parse_bool(raw).ok_or_else(|| {
            ContractError::config_validation(path(section, key), format!("invalid boolean '{raw}'"))
        }),
    }
}

/// Strictly positive, finite number of seconds
pub fn seconds_or(params: &Params, section: &str, key: &str, default: f64) -> Result<Duration, ContractError> {
    let secs: f64 = parsed_or(params, section, key, default)?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ContractError::config_validation(
            path(section, key),
            format!("must be a positive number of seconds, got {secs}"),
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| {
        ContractError::config_validation(path(section, key), format!("{secs} seconds: {e}"))
    })
}

/// Integer no smaller than `min`
pub fn at_least(params: &Params, section: &str, key: &str, default: u64, min: u64) -> Result<u64, ContractError> {
    let value: u64 = parsed_or(params, section, key, default)?;
    if value < min {
        return Err(ContractError::config_validation(
            path(section, key),
            format!("must be >= {min}, got {value}"),
        ));
    }
    Ok(value)
}
