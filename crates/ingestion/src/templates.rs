//! Sentence template registry
//!
//! Maps a 6-character header (`$` + talker + type) to the ordered layout of
//! its comma-separated fields. `None` slots are placeholders whose values
//! are never surfaced.

use std::collections::HashMap;

use contracts::Field;
use tracing::debug;

use Field::*;

/// Built-in layouts. `$GPRMC` carries the NMEA 2.3 mode indicator slot.
const STANDARD: &[(&str, &[Option<Field>])] = &[
    (
        "$GPRMC",
        &[
            Some(GpsTime),
            Some(GpsStatus),
            Some(Latitude),
            Some(NorthSouth),
            Some(Longitude),
            Some(EastWest),
            Some(Speed),
            Some(Track),
            Some(Date),
            None, // magnetic variation
            None, // variation E/W
            None, // mode indicator
        ],
    ),
    (
        "$GPRMB",
        &[
            Some(NavStatus),
            None, // cross-track error
            Some(DirToSteer),
            None, // origin waypoint
            Some(Waypoint),
            Some(WaypointLat),
            Some(WaypointLatNs),
            Some(WaypointLong),
            Some(WaypointLongEw),
            Some(DistToWaypoint),
            Some(BearingToWaypoint),
            Some(ClosingVelocity),
            Some(Arrival),
        ],
    ),
    ("$PGRMZ", &[Some(Altitude), None, None]),
    ("$PGRME", &[Some(HorizontalError), None, None, None, None, None]),
    (
        "$SDDBT",
        &[
            Some(DepthFeet),
            None,
            Some(DepthMeters),
            None,
            Some(DepthFathoms),
            None,
        ],
    ),
    ("$SDMTW", &[Some(Temperature), None]),
];

/// Field layout of one sentence type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTemplate {
    slots: Vec<Option<Field>>,
}

impl SentenceTemplate {
    pub fn new(slots: Vec<Option<Field>>) -> Self {
        Self { slots }
    }

    /// Number of comma-separated values the sentence must carry
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<Field>] {
        &self.slots
    }
}

/// Header -> template registry
#[derive(Debug, Clone, Default)]
pub struct SentenceTemplates {
    templates: HashMap<String, SentenceTemplate>,
}

impl SentenceTemplates {
    /// Registry holding every built-in sentence layout
    pub fn standard() -> Self {
        let templates = STANDARD
            .iter()
            .map(|(header, slots)| (header.to_string(), SentenceTemplate::new(slots.to_vec())))
            .collect();
        Self { templates }
    }

    /// Drop the given headers. Unknown headers are ignored.
    pub fn without<I, S>(mut self, disabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in disabled {
            let header = header.as_ref();
            if self.templates.remove(header).is_some() {
                debug!(header = %header, "sentence disabled");
            } else {
                debug!(header = %header, "disabled sentence not in registry, ignoring");
            }
        }
        self
    }

    pub fn get(&self, header: &str) -> Option<&SentenceTemplate> {
        self.templates.get(header)
    }

    pub fn contains(&self, header: &str) -> bool {
        self.templates.contains_key(header)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered headers, sorted
    pub fn headers(&self) -> Vec<&str> {
        let mut headers: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        headers.sort_unstable();
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let templates = SentenceTemplates::standard();
        assert_eq!(
            templates.headers(),
            vec!["$GPRMB", "$GPRMC", "$PGRME", "$PGRMZ", "$SDDBT", "$SDMTW"]
        );
        assert_eq!(templates.get("$GPRMC").unwrap().arity(), 12);
        assert_eq!(templates.get("$SDDBT").unwrap().arity(), 6);
    }

    #[test]
    fn test_headers_are_six_chars() {
        for header in SentenceTemplates::standard().headers() {
            assert_eq!(header.len(), 6, "{header}");
            assert!(header.starts_with('$'));
        }
    }

    #[test]
    fn test_without_removes_only_listed() {
        let templates = SentenceTemplates::standard().without("$GPRMB $PGRME $XXXXX".split_whitespace());
        assert!(!templates.contains("$GPRMB"));
        assert!(!templates.contains("$PGRME"));
        assert!(templates.contains("$GPRMC"));
        assert_eq!(templates.len(), 4);
    }

    #[test]
    fn test_each_field_appears_once() {
        let templates = SentenceTemplates::standard();
        let mut seen = std::collections::HashSet::new();
        for header in templates.headers() {
            for field in templates.get(header).unwrap().slots().iter().flatten() {
                assert!(seen.insert(*field), "{field} appears twice");
            }
        }
        assert_eq!(seen.len(), Field::ALL.len());
    }
}
