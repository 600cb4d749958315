//! Readings, the merged snapshot wire form, and its typed projection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{ContractError, Field};

/// Current wall-clock time in seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A value together with its time of arrival.
///
/// Serialized as a 2-element array `[value, timestamp]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct Stamped {
    /// Raw field text as received
    pub value: String,

    /// Time of arrival (seconds since the Unix epoch)
    pub timestamp: f64,
}

impl Stamped {
    pub fn new(value: impl Into<String>, timestamp: f64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }

    /// Parse the value as a finite float; empty, malformed, `NaN` or
    /// infinite text yields `None`
    pub fn as_f64(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

impl From<(String, f64)> for Stamped {
    fn from((value, timestamp): (String, f64)) -> Self {
        Self { value, timestamp }
    }
}

impl From<Stamped> for (String, f64) {
    fn from(s: Stamped) -> Self {
        (s.value, s.timestamp)
    }
}

/// One named field decoded from one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub field: Field,
    pub value: String,
    pub timestamp: f64,
}

impl Reading {
    pub fn new(field: Field, value: impl Into<String>, timestamp: f64) -> Self {
        Self {
            field,
            value: value.into(),
            timestamp,
        }
    }

    /// Split into the snapshot key and its stamped value
    pub fn into_entry(self) -> (Field, Stamped) {
        (self.field, Stamped::new(self.value, self.timestamp))
    }
}

/// The full merged view written to the shared file on every publish.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PublishedState {
    pub fields: BTreeMap<Field, Stamped>,
}

impl PublishedState {
    pub fn new(fields: BTreeMap<Field, Stamped>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: Field) -> Option<&Stamped> {
        self.fields.get(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to the JSON object written to the shared file
    pub fn encode(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::Other(format!("encode error: {e}")))
    }

    /// Parse the shared file body.
    ///
    /// Keys that do not name a known field are skipped. Any syntax error
    /// (typically a body observed mid-update) is a `PublishedDecode` error.
    pub fn decode(bytes: &[u8]) -> Result<Self, ContractError> {
        let raw: HashMap<String, Stamped> =
            serde_json::from_slice(bytes).map_err(|e| ContractError::PublishedDecode {
                message: e.to_string(),
            })?;

        let fields = raw
            .into_iter()
            .filter_map(|(key, value)| key.parse::<Field>().ok().map(|field| (field, value)))
            .collect();

        Ok(Self { fields })
    }
}

/// Typed projection of the fields the scanner works with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryView {
    pub latitude: Option<Stamped>,
    pub north_south: Option<Stamped>,
    pub longitude: Option<Stamped>,
    pub east_west: Option<Stamped>,
    pub speed: Option<Stamped>,
    pub track: Option<Stamped>,
    pub depth_meters: Option<Stamped>,
    pub depth_feet: Option<Stamped>,
    pub depth_fathoms: Option<Stamped>,
}

/// Borrowed position fix fields, see [`TelemetryView::required`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequiredFields<'a> {
    pub latitude: &'a Stamped,
    pub north_south: &'a Stamped,
    pub longitude: &'a Stamped,
    pub east_west: &'a Stamped,
    pub speed: &'a Stamped,
}

impl TelemetryView {
    pub fn from_state(state: &PublishedState) -> Self {
        let take = |field| state.get(field).cloned();
        Self {
            latitude: take(Field::Latitude),
            north_south: take(Field::NorthSouth),
            longitude: take(Field::Longitude),
            east_west: take(Field::EastWest),
            speed: take(Field::Speed),
            track: take(Field::Track),
            depth_meters: take(Field::DepthMeters),
            depth_feet: take(Field::DepthFeet),
            depth_fathoms: take(Field::DepthFathoms),
        }
    }

    /// Whether at least one depth unit has been observed
    pub fn has_depth(&self) -> bool {
        self.depth_meters.is_some() || self.depth_feet.is_some() || self.depth_fathoms.is_some()
    }

    /// Position fix fields, present only once every required field
    /// (including some depth unit) has been observed
    pub fn required(&self) -> Option<RequiredFields<'_>> {
        if !self.has_depth() {
            return None;
        }
        Some(RequiredFields {
            latitude: self.latitude.as_ref()?,
            north_south: self.north_south.as_ref()?,
            longitude: self.longitude.as_ref()?,
            east_west: self.east_west.as_ref()?,
            speed: self.speed.as_ref()?,
        })
    }

    /// Names of the required fields not yet observed
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let checks = [
            (&self.latitude, Field::Latitude),
            (&self.longitude, Field::Longitude),
            (&self.north_south, Field::NorthSouth),
            (&self.east_west, Field::EastWest),
            (&self.speed, Field::Speed),
        ];
        for (value, field) in checks {
            if value.is_none() {
                missing.push(field.as_str());
            }
        }
        if !self.has_depth() {
            missing.push("depth");
        }
        missing
    }
}
