//! The closed enumeration of referential entity kinds.

use std::fmt;

/// An entity kind known to the referential.
///
/// Each kind owns a dense index space `0..count(kind)` inside a
/// [`Dataset`](crate::Dataset). The caption is the kind's textual name in
/// the filter DSL (`network.uri="n1"` names the `Network` kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Network,
    Line,
    Route,
    StopArea,
    StopPoint,
    VehicleJourney,
    MetaVehicleJourney,
    JourneyPattern,
    JourneyPatternPoint,
    Connection,
    Poi,
    PoiType,
    Calendar,
    Impact,
    /// Unresolved kind (e.g. a forbidden URI that matches nothing).
    Unknown,
}

impl ObjectKind {
    /// Every kind that owns a collection, in declaration order.
    pub const ALL: [ObjectKind; 14] = [
        ObjectKind::Network,
        ObjectKind::Line,
        ObjectKind::Route,
        ObjectKind::StopArea,
        ObjectKind::StopPoint,
        ObjectKind::VehicleJourney,
        ObjectKind::MetaVehicleJourney,
        ObjectKind::JourneyPattern,
        ObjectKind::JourneyPatternPoint,
        ObjectKind::Connection,
        ObjectKind::Poi,
        ObjectKind::PoiType,
        ObjectKind::Calendar,
        ObjectKind::Impact,
    ];

    /// The kind's name in the filter DSL.
    pub fn caption(self) -> &'static str {
        match self {
            ObjectKind::Network => "network",
            ObjectKind::Line => "line",
            ObjectKind::Route => "route",
            ObjectKind::StopArea => "stop_area",
            ObjectKind::StopPoint => "stop_point",
            ObjectKind::VehicleJourney => "vehicle_journey",
            ObjectKind::MetaVehicleJourney => "trip",
            ObjectKind::JourneyPattern => "journey_pattern",
            ObjectKind::JourneyPatternPoint => "journey_pattern_point",
            ObjectKind::Connection => "connection",
            ObjectKind::Poi => "poi",
            ObjectKind::PoiType => "poi_type",
            ObjectKind::Calendar => "calendar",
            ObjectKind::Impact => "impact",
            ObjectKind::Unknown => "unknown",
        }
    }

    /// Resolve a DSL object name to its kind.
    ///
    /// Returns `None` for names outside the registry, including
    /// `"unknown"` (which is never a valid filter object).
    pub fn from_caption(caption: &str) -> Option<ObjectKind> {
        ObjectKind::ALL.iter().copied().find(|k| k.caption() == caption)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_round_trip() {
        for kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_caption(kind.caption()), Some(kind));
        }
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(ObjectKind::from_caption("unknown"), None);
        assert_eq!(ObjectKind::from_caption("networks"), None);
        assert_eq!(ObjectKind::from_caption(""), None);
    }

    #[test]
    fn meta_vehicle_journey_caption_is_trip() {
        assert_eq!(ObjectKind::MetaVehicleJourney.caption(), "trip");
    }
}
