//! PositionRecord - scanner output
//!
//! One durable row per accepted position, tagged with its session.

use chrono::{DateTime, Utc};

/// Session identifier assigned by the position store
pub type SessionId = i64;

/// Accepted position, immutable once written
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    /// Time of arrival of the position fix (seconds since the Unix epoch)
    pub passing_time: f64,

    /// Latitude text with hemisphere appended, e.g. `4807.038N`
    pub latitude: String,

    /// Longitude text with hemisphere appended, e.g. `01131.000E`
    pub longitude: String,

    /// Speed over ground (knots)
    pub speed_knots: f64,

    /// Track made good (degrees), if reported
    pub heading_degrees: Option<f64>,

    /// Resolved depth (meters), if any unit resolved
    pub depth_meters: Option<f64>,

    /// `passing_time` minus the depth reading's time of arrival
    pub depth_time_delta: Option<f64>,

    pub session_id: SessionId,
}

/// Final accounting of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub positions: u64,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}
