//! JSON input schema for dataset snapshots.
//!
//! The document mirrors the builder API: flat arrays of records that
//! reference each other by URI, in dependency order. [`build`] resolves
//! the references and produces the immutable [`Dataset`].

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use ptref_model::disruption::{Disruption, Effect, Impact, PtObjRef, Severity};
use ptref_model::entities::OdtLevel;
use ptref_model::period::{ProductionPeriod, TimePeriod, ValidityPattern};
use ptref_model::{Coord, Dataset, DatasetBuilder, Idx, ObjectKind};

/// A dataset reference that does not resolve, or a malformed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError(String);

impl InputError {
    fn unknown(what: &str, uri: &str) -> Self {
        InputError(format!("unknown {what} reference: {uri}"))
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InputError {}

// ── Records ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DatasetInput {
    pub production_period: DayPeriodInput,
    #[serde(default)]
    pub networks: Vec<NetworkInput>,
    #[serde(default)]
    pub lines: Vec<LineInput>,
    #[serde(default)]
    pub routes: Vec<RouteInput>,
    #[serde(default)]
    pub stop_areas: Vec<StopAreaInput>,
    #[serde(default)]
    pub stop_points: Vec<StopPointInput>,
    #[serde(default)]
    pub journey_patterns: Vec<JourneyPatternInput>,
    #[serde(default)]
    pub vehicle_journeys: Vec<VehicleJourneyInput>,
    #[serde(default)]
    pub trips: Vec<TripInput>,
    #[serde(default)]
    pub connections: Vec<ConnectionInput>,
    #[serde(default)]
    pub poi_types: Vec<PoiTypeInput>,
    #[serde(default)]
    pub pois: Vec<PoiInput>,
    #[serde(default)]
    pub calendars: Vec<CalendarInput>,
    #[serde(default)]
    pub impacts: Vec<ImpactInput>,
}

/// A half-open day interval.
#[derive(Debug, Deserialize)]
pub struct DayPeriodInput {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

/// A half-open datetime interval.
#[derive(Debug, Deserialize)]
pub struct TimePeriodInput {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimePeriodInput {
    fn to_period(&self) -> TimePeriod {
        TimePeriod::new(self.start, self.end)
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct NetworkInput {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LineInput {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub sort_order: u32,
    pub network: String,
    /// `scheduled` (default), `with_stops` or `zonal`.
    #[serde(default)]
    pub odt_level: Option<String>,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RouteInput {
    pub uri: String,
    pub name: String,
    pub line: String,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StopAreaInput {
    pub uri: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StopPointInput {
    pub uri: String,
    pub name: String,
    pub stop_area: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct JourneyPatternInput {
    pub uri: String,
    pub route: String,
    /// Stop points in journey order.
    pub stop_points: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleJourneyInput {
    pub uri: String,
    pub name: String,
    pub journey_pattern: String,
    #[serde(default)]
    pub headsigns: Vec<String>,
    /// Days the base schedule runs.
    #[serde(default)]
    pub active_days: Vec<NaiveDate>,
    /// Departure seconds after midnight, in journey order.
    #[serde(default)]
    pub departures: Vec<u32>,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TripInput {
    pub uri: String,
    pub vehicle_journeys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionInput {
    pub uri: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct PoiTypeInput {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PoiInput {
    pub uri: String,
    pub name: String,
    pub poi_type: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
pub struct CalendarInput {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SeverityInput {
    pub name: String,
    #[serde(default)]
    pub priority: Option<i32>,
    /// `NO_SERVICE`, `REDUCED_SERVICE`, ... (GTFS-RT spelling).
    pub effect: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InformedEntityInput {
    Network { uri: String },
    Line { uri: String },
    Route { uri: String },
    StopArea { uri: String },
    StopPoint { uri: String },
    Trip { uri: String },
    LineSection { line: String, start: String, end: String },
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct ImpactInput {
    pub uri: String,
    pub disruption_uri: String,
    pub publication_period: TimePeriodInput,
    pub severity: SeverityInput,
    #[serde(default)]
    pub application_periods: Vec<TimePeriodInput>,
    #[serde(default)]
    pub informed_entities: Vec<InformedEntityInput>,
}

// ── Building ───────────────────────────────────────────────────────────

/// URI to index map filled as one collection is built.
#[derive(Debug, Default)]
struct UriMap(HashMap<String, Idx>);

impl UriMap {
    fn add(&mut self, uri: &str, idx: Idx) {
        self.0.insert(uri.to_string(), idx);
    }

    fn get(&self, what: &str, uri: &str) -> Result<Idx, InputError> {
        self.0.get(uri).copied().ok_or_else(|| InputError::unknown(what, uri))
    }
}

fn odt_level(input: &Option<String>) -> Result<OdtLevel, InputError> {
    match input {
        None => Ok(OdtLevel::Scheduled),
        Some(text) => text.parse().map_err(InputError),
    }
}

fn effect(text: &str) -> Result<Effect, InputError> {
    match text {
        "NO_SERVICE" => Ok(Effect::NoService),
        "REDUCED_SERVICE" => Ok(Effect::ReducedService),
        "SIGNIFICANT_DELAYS" => Ok(Effect::SignificantDelays),
        "DETOUR" => Ok(Effect::Detour),
        "ADDITIONAL_SERVICE" => Ok(Effect::AdditionalService),
        "MODIFIED_SERVICE" => Ok(Effect::ModifiedService),
        "OTHER_EFFECT" => Ok(Effect::OtherEffect),
        "UNKNOWN_EFFECT" => Ok(Effect::UnknownEffect),
        "STOP_MOVED" => Ok(Effect::StopMoved),
        other => Err(InputError(format!("unknown effect: {other}"))),
    }
}

/// Resolve every reference and build the snapshot.
pub fn build(input: DatasetInput) -> Result<Dataset, InputError> {
    let production =
        ProductionPeriod::new(input.production_period.begin, input.production_period.end);
    let mut b = DatasetBuilder::new(production);

    let mut networks = UriMap::default();
    let mut lines = UriMap::default();
    let mut routes = UriMap::default();
    let mut stop_areas = UriMap::default();
    let mut stop_points = UriMap::default();
    let mut journey_patterns = UriMap::default();
    let mut vehicle_journeys = UriMap::default();
    let mut trips = UriMap::default();
    let mut poi_types = UriMap::default();

    for record in &input.networks {
        let idx = b.add_network(&record.uri, &record.name, record.sort_order);
        networks.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::Network, idx, &code.key, &code.value);
        }
    }
    for record in &input.lines {
        let network = networks.get("network", &record.network)?;
        let idx = b.add_line(
            &record.uri,
            &record.name,
            &record.code,
            record.sort_order,
            network,
            odt_level(&record.odt_level)?,
        );
        lines.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::Line, idx, &code.key, &code.value);
        }
    }
    for record in &input.routes {
        let line = lines.get("line", &record.line)?;
        let idx = b.add_route(&record.uri, &record.name, line);
        routes.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::Route, idx, &code.key, &code.value);
        }
    }
    for record in &input.stop_areas {
        let idx = b.add_stop_area(&record.uri, &record.name, Coord::new(record.lon, record.lat));
        stop_areas.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::StopArea, idx, &code.key, &code.value);
        }
    }
    for record in &input.stop_points {
        let stop_area = stop_areas.get("stop_area", &record.stop_area)?;
        let idx = b.add_stop_point(
            &record.uri,
            &record.name,
            stop_area,
            Coord::new(record.lon, record.lat),
        );
        stop_points.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::StopPoint, idx, &code.key, &code.value);
        }
    }
    for record in &input.journey_patterns {
        let route = routes.get("route", &record.route)?;
        let mut points = Vec::with_capacity(record.stop_points.len());
        for uri in &record.stop_points {
            points.push(stop_points.get("stop_point", uri)?);
        }
        let idx = b.add_journey_pattern(&record.uri, route, &points);
        journey_patterns.add(&record.uri, idx);
    }
    for record in &input.vehicle_journeys {
        let journey_pattern = journey_patterns.get("journey_pattern", &record.journey_pattern)?;
        let headsigns: Vec<&str> = record.headsigns.iter().map(String::as_str).collect();
        let validity =
            ValidityPattern::from_dates(input.production_period.begin, &record.active_days);
        let idx = b.add_vehicle_journey(
            &record.uri,
            &record.name,
            journey_pattern,
            &headsigns,
            validity,
            record.departures.clone(),
        );
        vehicle_journeys.add(&record.uri, idx);
        for code in &record.codes {
            b.add_code(ObjectKind::VehicleJourney, idx, &code.key, &code.value);
        }
    }
    for record in &input.trips {
        let mut members = Vec::with_capacity(record.vehicle_journeys.len());
        for uri in &record.vehicle_journeys {
            members.push(vehicle_journeys.get("vehicle_journey", uri)?);
        }
        let idx = b.add_meta_vehicle_journey(&record.uri, &members);
        trips.add(&record.uri, idx);
    }
    for record in &input.connections {
        let from = stop_points.get("stop_point", &record.from)?;
        let to = stop_points.get("stop_point", &record.to)?;
        b.add_connection(&record.uri, from, to);
    }
    for record in &input.poi_types {
        let idx = b.add_poi_type(&record.uri, &record.name);
        poi_types.add(&record.uri, idx);
    }
    for record in &input.pois {
        let poi_type = poi_types.get("poi_type", &record.poi_type)?;
        b.add_poi(&record.uri, &record.name, poi_type, Coord::new(record.lon, record.lat));
    }
    for record in &input.calendars {
        let mut members = Vec::with_capacity(record.lines.len());
        for uri in &record.lines {
            members.push(lines.get("line", uri)?);
        }
        let idx = b.add_calendar(&record.uri, &record.name, &members);
        for code in &record.codes {
            b.add_code(ObjectKind::Calendar, idx, &code.key, &code.value);
        }
    }
    for record in &input.impacts {
        let mut informed = Vec::with_capacity(record.informed_entities.len());
        for entity in &record.informed_entities {
            informed.push(match entity {
                InformedEntityInput::Network { uri } => {
                    PtObjRef::Network(networks.get("network", uri)?)
                }
                InformedEntityInput::Line { uri } => PtObjRef::Line(lines.get("line", uri)?),
                InformedEntityInput::Route { uri } => PtObjRef::Route(routes.get("route", uri)?),
                InformedEntityInput::StopArea { uri } => {
                    PtObjRef::StopArea(stop_areas.get("stop_area", uri)?)
                }
                InformedEntityInput::StopPoint { uri } => {
                    PtObjRef::StopPoint(stop_points.get("stop_point", uri)?)
                }
                InformedEntityInput::Trip { uri } => {
                    PtObjRef::MetaVehicleJourney(trips.get("trip", uri)?)
                }
                InformedEntityInput::LineSection { line, start, end } => PtObjRef::LineSection {
                    line: lines.get("line", line)?,
                    start: stop_areas.get("stop_area", start)?,
                    end: stop_areas.get("stop_area", end)?,
                },
                InformedEntityInput::Unknown => PtObjRef::Unknown,
            });
        }
        b.add_impact(Impact {
            uri: record.uri.clone(),
            disruption: Disruption {
                uri: record.disruption_uri.clone(),
                publication_period: record.publication_period.to_period(),
            },
            severity: Severity {
                name: record.severity.name.clone(),
                priority: record.severity.priority,
                effect: effect(&record.severity.effect)?,
            },
            application_periods: record
                .application_periods
                .iter()
                .map(TimePeriodInput::to_period)
                .collect(),
            informed_entities: informed,
        });
    }

    Ok(b.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "production_period": { "begin": "2019-01-01", "end": "2020-01-01" },
        "networks": [{ "uri": "network:N1", "name": "Metro" }],
        "lines": [{
            "uri": "line:L1", "name": "Alpha", "code": "1",
            "network": "network:N1",
            "codes": [{ "key": "external_code", "value": "A" }]
        }],
        "routes": [{ "uri": "route:R1", "name": "R1", "line": "line:L1" }],
        "stop_areas": [
            { "uri": "stop_area:SA1", "name": "Opera", "lon": 2.35, "lat": 48.85 },
            { "uri": "stop_area:SA2", "name": "Chatelet", "lon": 2.36, "lat": 48.86 }
        ],
        "stop_points": [
            { "uri": "stop_point:SP1", "name": "Opera A", "stop_area": "stop_area:SA1", "lon": 2.35, "lat": 48.85 },
            { "uri": "stop_point:SP2", "name": "Chatelet A", "stop_area": "stop_area:SA2", "lon": 2.36, "lat": 48.86 }
        ],
        "journey_patterns": [{
            "uri": "journey_pattern:JP1", "route": "route:R1",
            "stop_points": ["stop_point:SP1", "stop_point:SP2"]
        }],
        "vehicle_journeys": [{
            "uri": "vehicle_journey:VJ1", "name": "VJ1",
            "journey_pattern": "journey_pattern:JP1",
            "headsigns": ["Plage"],
            "active_days": ["2019-06-01"],
            "departures": [3600, 3900]
        }],
        "trips": [{ "uri": "trip:VJ1", "vehicle_journeys": ["vehicle_journey:VJ1"] }],
        "impacts": [{
            "uri": "impact:I1",
            "disruption_uri": "disruption:D1",
            "publication_period": { "start": "2019-06-01T00:00:00", "end": "2019-07-01T00:00:00" },
            "severity": { "name": "blocking", "priority": 0, "effect": "NO_SERVICE" },
            "application_periods": [
                { "start": "2019-06-01T00:00:00", "end": "2019-06-03T00:00:00" }
            ],
            "informed_entities": [{ "type": "trip", "uri": "trip:VJ1" }]
        }]
    }"#;

    #[test]
    fn builds_a_snapshot_from_json() {
        let input: DatasetInput = serde_json::from_str(SNAPSHOT).unwrap();
        let data = build(input).unwrap();
        assert_eq!(data.count(ObjectKind::Line), 1);
        assert_eq!(data.count(ObjectKind::StopPoint), 2);
        assert_eq!(data.count(ObjectKind::Impact), 1);
        assert_eq!(data.index_by_uri(ObjectKind::StopArea, "stop_area:SA2"), Some(1));
        assert_eq!(data.vehicle_journeys_by_headsign("Plage").len(), 1);
        assert_eq!(data.codes_lookup(ObjectKind::Line, "external_code", "A").len(), 1);
    }

    #[test]
    fn unknown_reference_is_reported() {
        let input: DatasetInput = serde_json::from_str(
            r#"{
                "production_period": { "begin": "2019-01-01", "end": "2020-01-01" },
                "lines": [{ "uri": "line:L1", "name": "Alpha", "network": "network:missing" }]
            }"#,
        )
        .unwrap();
        let err = build(input).unwrap_err();
        assert_eq!(err.to_string(), "unknown network reference: network:missing");
    }

    #[test]
    fn unknown_effect_is_reported() {
        assert!(effect("NO_SERVICE").is_ok());
        assert!(effect("EXPLODED").is_err());
    }
}
