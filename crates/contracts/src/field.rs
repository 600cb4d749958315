//! Field - named telemetry values carried by NMEA sentences
//!
//! Closed set of every field the template registry can produce. The wire
//! name is what appears as a key in the published file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! define_fields {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Telemetry field identifier
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Field {
            $($variant),+
        }

        impl Field {
            /// Every known field, in declaration order
            pub const ALL: &'static [Field] = &[$(Field::$variant),+];

            /// Wire name used in templates and in the published file
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Field::$variant => $wire),+
                }
            }
        }

        impl FromStr for Field {
            type Err = UnknownField;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Field::$variant),)+
                    _ => Err(UnknownField(s.to_string())),
                }
            }
        }
    };
}

define_fields! {
    // $GPRMC
    GpsTime => "gptime",
    GpsStatus => "gpstatus",
    Latitude => "latitude",
    NorthSouth => "NS",
    Longitude => "longitude",
    EastWest => "EW",
    Speed => "speed",
    Track => "track",
    Date => "date",
    // $GPRMB
    NavStatus => "navstatus",
    DirToSteer => "dir_to_steer",
    Waypoint => "wpt",
    WaypointLat => "wptlat",
    WaypointLatNs => "wptlat_NS",
    WaypointLong => "wptlong",
    WaypointLongEw => "wptlong_EW",
    DistToWaypoint => "dist_wpt",
    BearingToWaypoint => "brg_wpt",
    ClosingVelocity => "cv_wpt",
    Arrival => "arrival",
    // $PGRMZ / $PGRME
    Altitude => "altitude",
    HorizontalError => "ehperror",
    // $SDDBT / $SDMTW
    DepthFeet => "depthf",
    DepthMeters => "depthm",
    DepthFathoms => "depthF",
    Temperature => "temperature",
}

/// Key that does not name a known field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_wire_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>(), Ok(*field));
        }
    }

    #[test]
    fn test_wire_names_are_unique() {
        let names: HashSet<_> = Field::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn test_depth_units_are_case_sensitive() {
        assert_eq!("depthf".parse::<Field>(), Ok(Field::DepthFeet));
        assert_eq!("depthF".parse::<Field>(), Ok(Field::DepthFathoms));
        assert!("DEPTHM".parse::<Field>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Field::NorthSouth).unwrap();
        assert_eq!(json, "\"NS\"");
        let parsed: Field = serde_json::from_str("\"EW\"").unwrap();
        assert_eq!(parsed, Field::EastWest);
    }
}
