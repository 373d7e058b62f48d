//! The transit entity records.
//!
//! Every record carries its own dense index, a stable `uri`, and the
//! relation fields the type graph projects through. Relations are dense
//! indices into the sibling collections of the same
//! [`Dataset`](crate::Dataset); they are wired by the
//! [`DatasetBuilder`](crate::DatasetBuilder) and never change afterwards.

use std::str::FromStr;

use crate::disruption::WeakImpact;
use crate::geo::Coord;
use crate::indexes::Idx;
use crate::period::ValidityPattern;

/// Key/value identifiers attached to an entity by external referentials.
pub type Codes = Vec<(String, String)>;

/// On-demand-transport level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdtLevel {
    Scheduled,
    WithStops,
    Zonal,
    /// No restriction; every line matches.
    All,
}

impl FromStr for OdtLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(OdtLevel::Scheduled),
            "with_stops" => Ok(OdtLevel::WithStops),
            "zonal" => Ok(OdtLevel::Zonal),
            "all" => Ok(OdtLevel::All),
            other => Err(format!("unknown odt level: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    /// Display rank; the natural network order sorts on it first.
    pub sort_order: u32,
    pub codes: Codes,
    pub lines: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    /// The commercial code riders see ("1", "B", "N12").
    pub code: String,
    pub sort_order: u32,
    pub network: Idx,
    pub odt_level: OdtLevel,
    pub codes: Codes,
    pub routes: Vec<Idx>,
    pub calendars: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub line: Idx,
    pub codes: Codes,
    pub journey_patterns: Vec<Idx>,
    pub vehicle_journeys: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct StopArea {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub coord: Coord,
    pub codes: Codes,
    pub stop_points: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct StopPoint {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub stop_area: Idx,
    pub coord: Coord,
    pub codes: Codes,
    pub connections: Vec<Idx>,
    pub journey_pattern_points: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct VehicleJourney {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub route: Idx,
    pub journey_pattern: Idx,
    /// The equivalence class this journey belongs to, if any.
    pub meta_vj: Option<Idx>,
    pub headsigns: Vec<String>,
    pub codes: Codes,
    /// Days the base schedule runs.
    pub validity: ValidityPattern,
    /// Departure times in seconds after midnight, in journey order.
    /// May exceed 86400 for journeys crossing midnight.
    pub departures: Vec<u32>,
}

impl VehicleJourney {
    /// Departure time at the first stop, if the journey has stops.
    pub fn first_departure(&self) -> Option<u32> {
        self.departures.first().copied()
    }
}

#[derive(Debug, Clone)]
pub struct MetaVehicleJourney {
    pub idx: Idx,
    pub uri: String,
    pub vehicle_journeys: Vec<Idx>,
    pub impacts: Vec<WeakImpact>,
}

#[derive(Debug, Clone)]
pub struct JourneyPattern {
    pub idx: Idx,
    pub uri: String,
    pub route: Idx,
    /// Journey-pattern points in stop order.
    pub points: Vec<Idx>,
    pub vehicle_journeys: Vec<Idx>,
}

#[derive(Debug, Clone)]
pub struct JourneyPatternPoint {
    pub idx: Idx,
    pub uri: String,
    pub journey_pattern: Idx,
    pub stop_point: Idx,
    /// Position within the journey pattern, starting at 0.
    pub order: u32,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub idx: Idx,
    pub uri: String,
    pub from: Idx,
    pub to: Idx,
}

#[derive(Debug, Clone)]
pub struct Poi {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub poi_type: Idx,
    pub coord: Coord,
}

#[derive(Debug, Clone)]
pub struct PoiType {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Calendar {
    pub idx: Idx,
    pub uri: String,
    pub name: String,
    pub codes: Codes,
    pub lines: Vec<Idx>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odt_level_from_str() {
        assert_eq!("scheduled".parse::<OdtLevel>().unwrap(), OdtLevel::Scheduled);
        assert_eq!("with_stops".parse::<OdtLevel>().unwrap(), OdtLevel::WithStops);
        assert_eq!("zonal".parse::<OdtLevel>().unwrap(), OdtLevel::Zonal);
        assert_eq!("all".parse::<OdtLevel>().unwrap(), OdtLevel::All);
        assert!("odt".parse::<OdtLevel>().is_err());
    }

    #[test]
    fn first_departure_is_front_of_list() {
        let vj = VehicleJourney {
            idx: 0,
            uri: "vj:1".into(),
            name: "vj 1".into(),
            route: 0,
            journey_pattern: 0,
            meta_vj: None,
            headsigns: vec![],
            codes: vec![],
            validity: ValidityPattern::new(
                chrono::NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                7,
            ),
            departures: vec![3600, 3900],
        };
        assert_eq!(vj.first_departure(), Some(3600));
    }
}
