//! Depth resolution across sounder units

use contracts::{Stamped, TelemetryView};

pub const FEET_TO_METERS: f64 = 0.3048;
pub const FATHOMS_TO_METERS: f64 = 1.8288;

/// Depth in meters with the arrival time of the reading it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDepth {
    pub meters: f64,
    pub timestamp: f64,
}

/// Pick the depth to record: meters, else feet, else fathoms.
///
/// A reading of exactly zero is treated like a missing one, so a sounder
/// reporting `0.0` meters falls through to the feet value.
pub fn resolve_depth(view: &TelemetryView) -> Option<ResolvedDepth> {
    let candidates = [
        (&view.depth_meters, 1.0),
        (&view.depth_feet, FEET_TO_METERS),
        (&view.depth_fathoms, FATHOMS_TO_METERS),
    ];

    candidates.into_iter().find_map(|(reading, factor)| {
        let reading: &Stamped = reading.as_ref()?;
        let value = reading.as_f64().filter(|v| *v != 0.0)?;
        Some(ResolvedDepth {
            meters: value * factor,
            timestamp: reading.timestamp,
        })
    })
}
