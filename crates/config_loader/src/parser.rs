//! Configuration file parsing
//!
//! Files are a set of named sections holding flat `key = value` pairs.
//! Every scalar is kept as a string; typing happens later against the
//! section schema. TOML is the primary format, JSON is accepted as well.

use std::collections::{BTreeMap, HashMap};

use contracts::ContractError;

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" | "conf" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Key/value parameters of one section
pub type Params = HashMap<String, String>;

/// All sections of a configuration file, by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSections {
    sections: BTreeMap<String, Params>,
}

impl ParamSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a whole section
    pub fn insert(&mut self, name: impl Into<String>, params: Params) {
        self.sections.insert(name.into(), params);
    }

    pub fn section(&self, name: &str) -> Option<&Params> {
        self.sections.get(name)
    }

    /// Section that must be present
    pub fn require(&self, name: &str) -> Result<&Params, ContractError> {
        self.section(name)
            .ok_or_else(|| ContractError::config_validation(name, "missing section"))
    }

    /// Section names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Parse TOML content
pub fn parse_toml(content: &str) -> Result<ParamSections, ContractError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })?;

    let mut sections = ParamSections::new();
    for (name, value) in table {
        let toml::Value::Table(entries) = value else {
            return Err(ContractError::config_parse(format!(
                "top-level key '{name}' is not a section"
            )));
        };
        let mut params = Params::new();
        for (key, value) in entries {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    return Err(ContractError::config_parse(format!(
                        "[{name}] {key}: expected a scalar value"
                    )));
                }
            };
            params.insert(key, text);
        }
        sections.insert(name, params);
    }
    Ok(sections)
}

/// Parse JSON content (an object of objects)
pub fn parse_json(content: &str) -> Result<ParamSections, ContractError> {
    let root: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut sections = ParamSections::new();
    for (name, value) in root {
        let serde_json::Value::Object(entries) = value else {
            return Err(ContractError::config_parse(format!(
                "top-level key '{name}' is not a section"
            )));
        };
        let mut params = Params::new();
        for (key, value) in entries {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ContractError::config_parse(format!(
                        "[{name}] {key}: expected a scalar value"
                    )));
                }
            };
            params.insert(key, text);
        }
        sections.insert(name, params);
    }
    Ok(sections)
}

/// Parse according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<ParamSections, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_stringified() {
        let content = r#"
[gps]
port = "/dev/ttyUSB0"
baud = 4800
check_checksums = true
read_timeout = 0.05
"#;
        let sections = parse_toml(content).unwrap();
        let gps = sections.section("gps").unwrap();
        assert_eq!(gps["port"], "/dev/ttyUSB0");
        assert_eq!(gps["baud"], "4800");
        assert_eq!(gps["check_checksums"], "true");
        assert_eq!(gps["read_timeout"], "0.05");
    }

    #[test]
    fn test_top_level_scalar_rejected() {
        let err = parse_toml("port = 1\n").unwrap_err();
        assert!(err.to_string().contains("not a section"));
    }

    #[test]
    fn test_nested_values_rejected() {
        assert!(parse_toml("[gps]\nport = [1, 2]\n").is_err());
        assert!(parse_json(r#"{"gps": {"port": {"a": 1}}}"#).is_err());
    }

    #[test]
    fn test_parse_json() {
        let sections = parse_json(r#"{"writer": {"output_file": "/tmp/n.json", "interval": 0.2}}"#)
            .unwrap();
        assert_eq!(sections.section("writer").unwrap()["interval"], "0.2");
        assert_eq!(sections.names().collect::<Vec<_>>(), vec!["writer"]);
    }

    #[test]
    fn test_invalid_toml() {
        let err = parse_toml("[gps\nport=").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
