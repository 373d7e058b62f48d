//! The dataset snapshot and its builder.
//!
//! A [`Dataset`] owns every entity collection, the impact store, and the
//! lookup tables the engine consumes: per-kind URI maps, the code
//! container, the headsign map and the journey-pattern id maps. It is
//! immutable for the lifetime of a query; many queries may borrow it in
//! parallel.
//!
//! Construction goes through [`DatasetBuilder`], which wires the relation
//! fields as entities are added and freezes the lookup tables on
//! [`finalize`](DatasetBuilder::finalize).

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use crate::disruption::{Impact, ImpactSet, ImpactStore, PtObjRef, WeakImpact};
use crate::entities::{
    Calendar, Codes, Connection, JourneyPattern, JourneyPatternPoint, Line, MetaVehicleJourney,
    Network, OdtLevel, Poi, PoiType, Route, StopArea, StopPoint, VehicleJourney,
};
use crate::geo::Coord;
use crate::indexes::{Idx, Indexes};
use crate::object_kind::ObjectKind;
use crate::period::{ProductionPeriod, ValidityPattern};

const NO_IMPACTS: &[WeakImpact] = &[];

/// An immutable transit dataset snapshot.
#[derive(Debug)]
pub struct Dataset {
    pub networks: Vec<Network>,
    pub lines: Vec<Line>,
    pub routes: Vec<Route>,
    pub stop_areas: Vec<StopArea>,
    pub stop_points: Vec<StopPoint>,
    pub vehicle_journeys: Vec<VehicleJourney>,
    pub meta_vjs: Vec<MetaVehicleJourney>,
    pub journey_patterns: Vec<JourneyPattern>,
    pub journey_pattern_points: Vec<JourneyPatternPoint>,
    pub connections: Vec<Connection>,
    pub pois: Vec<Poi>,
    pub poi_types: Vec<PoiType>,
    pub calendars: Vec<Calendar>,
    pub impacts: ImpactStore,
    production_period: ProductionPeriod,
    uri_maps: FxHashMap<ObjectKind, FxHashMap<String, Idx>>,
    codes: FxHashMap<(ObjectKind, String, String), Vec<Idx>>,
    headsigns: FxHashMap<String, Vec<Idx>>,
}

impl Dataset {
    // ── Collections ────────────────────────────────────────────────────

    /// Number of entities of `kind`. For impacts this counts slots, so
    /// discarded impacts keep their index reserved.
    pub fn count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Network => self.networks.len(),
            ObjectKind::Line => self.lines.len(),
            ObjectKind::Route => self.routes.len(),
            ObjectKind::StopArea => self.stop_areas.len(),
            ObjectKind::StopPoint => self.stop_points.len(),
            ObjectKind::VehicleJourney => self.vehicle_journeys.len(),
            ObjectKind::MetaVehicleJourney => self.meta_vjs.len(),
            ObjectKind::JourneyPattern => self.journey_patterns.len(),
            ObjectKind::JourneyPatternPoint => self.journey_pattern_points.len(),
            ObjectKind::Connection => self.connections.len(),
            ObjectKind::Poi => self.pois.len(),
            ObjectKind::PoiType => self.poi_types.len(),
            ObjectKind::Calendar => self.calendars.len(),
            ObjectKind::Impact => self.impacts.slot_count(),
            ObjectKind::Unknown => 0,
        }
    }

    /// Every index of `kind`, in ascending order.
    pub fn all_indexes(&self, kind: ObjectKind) -> Indexes {
        (0..self.count(kind) as Idx).collect()
    }

    /// Constant-time URI lookup for kinds with a URI map (every kind but
    /// Impact and Unknown).
    pub fn index_by_uri(&self, kind: ObjectKind, uri: &str) -> Option<Idx> {
        self.uri_maps.get(&kind)?.get(uri).copied()
    }

    /// Resolve the kind owning `uri`, or `Unknown`. URIs are compared
    /// exactly, case-sensitively.
    pub fn kind_of_uri(&self, uri: &str) -> ObjectKind {
        for kind in ObjectKind::ALL {
            if let Some(map) = self.uri_maps.get(&kind) {
                if map.contains_key(uri) {
                    return kind;
                }
            }
        }
        ObjectKind::Unknown
    }

    pub fn production_period(&self) -> &ProductionPeriod {
        &self.production_period
    }

    // ── Dedicated lookups ──────────────────────────────────────────────

    /// Journey pattern by its id.
    pub fn journey_pattern_by_id(&self, id: &str) -> Option<Idx> {
        self.index_by_uri(ObjectKind::JourneyPattern, id)
    }

    /// Journey-pattern point by its id.
    pub fn journey_pattern_point_by_id(&self, id: &str) -> Option<Idx> {
        self.index_by_uri(ObjectKind::JourneyPatternPoint, id)
    }

    /// Vehicle journeys carrying `headsign`.
    pub fn vehicle_journeys_by_headsign(&self, headsign: &str) -> Indexes {
        match self.headsigns.get(headsign) {
            Some(v) => v.iter().copied().collect(),
            None => Indexes::new(),
        }
    }

    /// Entities of `kind` registered under the code `key=value`. Kinds
    /// outside the code container yield the empty set.
    pub fn codes_lookup(&self, kind: ObjectKind, key: &str, value: &str) -> Indexes {
        match self.codes.get(&(kind, key.to_owned(), value.to_owned())) {
            Some(v) => v.iter().copied().collect(),
            None => Indexes::new(),
        }
    }

    /// Proximity search: entities of `kind` within `distance` meters of
    /// `center`, as `(index, coord)` pairs in index order. `None` for
    /// kinds without coordinates.
    pub fn find_within(
        &self,
        kind: ObjectKind,
        center: Coord,
        distance: f64,
    ) -> Option<Vec<(Idx, Coord)>> {
        fn scan<T>(items: &[T], center: Coord, distance: f64, coord: impl Fn(&T) -> Coord) -> Vec<(Idx, Coord)> {
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| coord(item).distance_to(&center) <= distance)
                .map(|(i, item)| (i as Idx, coord(item)))
                .collect()
        }
        match kind {
            ObjectKind::StopPoint => Some(scan(&self.stop_points, center, distance, |sp| sp.coord)),
            ObjectKind::StopArea => Some(scan(&self.stop_areas, center, distance, |sa| sa.coord)),
            ObjectKind::Poi => Some(scan(&self.pois, center, distance, |poi| poi.coord)),
            _ => None,
        }
    }

    // ── Impacts ────────────────────────────────────────────────────────

    /// The weak impact handles registered on one entity. Vehicle
    /// journeys read their meta-vehicle-journey's handles.
    pub fn impacts_on(&self, kind: ObjectKind, idx: Idx) -> &[WeakImpact] {
        let i = idx as usize;
        match kind {
            ObjectKind::Network => &self.networks[i].impacts,
            ObjectKind::Line => &self.lines[i].impacts,
            ObjectKind::Route => &self.routes[i].impacts,
            ObjectKind::StopArea => &self.stop_areas[i].impacts,
            ObjectKind::StopPoint => &self.stop_points[i].impacts,
            ObjectKind::MetaVehicleJourney => &self.meta_vjs[i].impacts,
            ObjectKind::VehicleJourney => match self.vehicle_journeys[i].meta_vj {
                Some(meta) => &self.meta_vjs[meta as usize].impacts,
                None => NO_IMPACTS,
            },
            _ => NO_IMPACTS,
        }
    }

    /// Upgrade the entity's impacts and keep those publishable at `now`.
    pub fn publishable_impacts(
        &self,
        kind: ObjectKind,
        idx: Idx,
        now: NaiveDateTime,
    ) -> ImpactSet {
        let mut out = ImpactSet::new();
        for weak in self.impacts_on(kind, idx) {
            if let Some(impact) = self.impacts.upgrade(weak) {
                if impact.disruption.is_publishable(now) {
                    out.insert(weak.id, impact);
                }
            }
        }
        out
    }

    // ── Type-graph edge projection ─────────────────────────────────────

    /// Project an index set through one edge of the type graph. Pairs
    /// without an edge yield the empty set.
    pub fn related(&self, from: ObjectKind, to: ObjectKind, set: &Indexes) -> Indexes {
        use ObjectKind::*;
        let mut out = Indexes::new();
        match (from, to) {
            (Network, Line) => {
                for i in set.iter() {
                    out.extend(self.networks[i as usize].lines.iter().copied());
                }
            }
            (Line, Network) => {
                for i in set.iter() {
                    out.insert(self.lines[i as usize].network);
                }
            }
            (Line, Route) => {
                for i in set.iter() {
                    out.extend(self.lines[i as usize].routes.iter().copied());
                }
            }
            (Line, Calendar) => {
                for i in set.iter() {
                    out.extend(self.lines[i as usize].calendars.iter().copied());
                }
            }
            (Calendar, Line) => {
                for i in set.iter() {
                    out.extend(self.calendars[i as usize].lines.iter().copied());
                }
            }
            (Route, Line) => {
                for i in set.iter() {
                    out.insert(self.routes[i as usize].line);
                }
            }
            (Route, JourneyPattern) => {
                for i in set.iter() {
                    out.extend(self.routes[i as usize].journey_patterns.iter().copied());
                }
            }
            (Route, VehicleJourney) => {
                for i in set.iter() {
                    out.extend(self.routes[i as usize].vehicle_journeys.iter().copied());
                }
            }
            (StopArea, StopPoint) => {
                for i in set.iter() {
                    out.extend(self.stop_areas[i as usize].stop_points.iter().copied());
                }
            }
            (StopPoint, StopArea) => {
                for i in set.iter() {
                    out.insert(self.stop_points[i as usize].stop_area);
                }
            }
            (StopPoint, Connection) => {
                for i in set.iter() {
                    out.extend(self.stop_points[i as usize].connections.iter().copied());
                }
            }
            (StopPoint, JourneyPatternPoint) => {
                for i in set.iter() {
                    out.extend(self.stop_points[i as usize].journey_pattern_points.iter().copied());
                }
            }
            (Connection, StopPoint) => {
                for i in set.iter() {
                    let connection = &self.connections[i as usize];
                    out.insert(connection.from);
                    out.insert(connection.to);
                }
            }
            (VehicleJourney, Route) => {
                for i in set.iter() {
                    out.insert(self.vehicle_journeys[i as usize].route);
                }
            }
            (VehicleJourney, JourneyPattern) => {
                for i in set.iter() {
                    out.insert(self.vehicle_journeys[i as usize].journey_pattern);
                }
            }
            (VehicleJourney, MetaVehicleJourney) => {
                for i in set.iter() {
                    if let Some(meta) = self.vehicle_journeys[i as usize].meta_vj {
                        out.insert(meta);
                    }
                }
            }
            (MetaVehicleJourney, VehicleJourney) => {
                for i in set.iter() {
                    out.extend(self.meta_vjs[i as usize].vehicle_journeys.iter().copied());
                }
            }
            (JourneyPattern, Route) => {
                for i in set.iter() {
                    out.insert(self.journey_patterns[i as usize].route);
                }
            }
            (JourneyPattern, JourneyPatternPoint) => {
                for i in set.iter() {
                    out.extend(self.journey_patterns[i as usize].points.iter().copied());
                }
            }
            (JourneyPattern, VehicleJourney) => {
                for i in set.iter() {
                    out.extend(self.journey_patterns[i as usize].vehicle_journeys.iter().copied());
                }
            }
            (JourneyPatternPoint, JourneyPattern) => {
                for i in set.iter() {
                    out.insert(self.journey_pattern_points[i as usize].journey_pattern);
                }
            }
            (JourneyPatternPoint, StopPoint) => {
                for i in set.iter() {
                    out.insert(self.journey_pattern_points[i as usize].stop_point);
                }
            }
            (Poi, PoiType) => {
                for i in set.iter() {
                    out.insert(self.pois[i as usize].poi_type);
                }
            }
            (PoiType, Poi) => {
                for poi in &self.pois {
                    if set.contains(poi.poi_type) {
                        out.insert(poi.idx);
                    }
                }
            }
            (Network | Line | Route | StopArea | StopPoint | VehicleJourney, Impact) => {
                for i in set.iter() {
                    for weak in self.impacts_on(from, i) {
                        if self.impacts.upgrade(weak).is_some() {
                            out.insert(weak.id.0);
                        }
                    }
                }
            }
            _ => {}
        }
        out
    }

    // ── Natural orderings ──────────────────────────────────────────────

    /// Network order: display rank, then name, then index.
    pub fn compare_networks(&self, a: Idx, b: Idx) -> Ordering {
        let (na, nb) = (&self.networks[a as usize], &self.networks[b as usize]);
        na.sort_order
            .cmp(&nb.sort_order)
            .then_with(|| na.name.cmp(&nb.name))
            .then_with(|| a.cmp(&b))
    }

    /// Line order: owning network first, then rank, code, name, index.
    pub fn compare_lines(&self, a: Idx, b: Idx) -> Ordering {
        let (la, lb) = (&self.lines[a as usize], &self.lines[b as usize]);
        self.compare_networks(la.network, lb.network)
            .then_with(|| la.sort_order.cmp(&lb.sort_order))
            .then_with(|| la.code.cmp(&lb.code))
            .then_with(|| la.name.cmp(&lb.name))
            .then_with(|| a.cmp(&b))
    }
}

// ── Builder ────────────────────────────────────────────────────────────

/// Append-only construction of a [`Dataset`].
///
/// Relation fields are wired as entities are added; referencing an index
/// that was never returned by the builder is a caller bug and panics.
#[derive(Debug)]
pub struct DatasetBuilder {
    data: Dataset,
}

impl DatasetBuilder {
    pub fn new(production_period: ProductionPeriod) -> Self {
        DatasetBuilder {
            data: Dataset {
                networks: Vec::new(),
                lines: Vec::new(),
                routes: Vec::new(),
                stop_areas: Vec::new(),
                stop_points: Vec::new(),
                vehicle_journeys: Vec::new(),
                meta_vjs: Vec::new(),
                journey_patterns: Vec::new(),
                journey_pattern_points: Vec::new(),
                connections: Vec::new(),
                pois: Vec::new(),
                poi_types: Vec::new(),
                calendars: Vec::new(),
                impacts: ImpactStore::new(),
                production_period,
                uri_maps: FxHashMap::default(),
                codes: FxHashMap::default(),
                headsigns: FxHashMap::default(),
            },
        }
    }

    pub fn add_network(&mut self, uri: &str, name: &str, sort_order: u32) -> Idx {
        let idx = self.data.networks.len() as Idx;
        self.data.networks.push(Network {
            idx,
            uri: uri.into(),
            name: name.into(),
            sort_order,
            codes: Codes::new(),
            lines: Vec::new(),
            impacts: Vec::new(),
        });
        idx
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_line(
        &mut self,
        uri: &str,
        name: &str,
        code: &str,
        sort_order: u32,
        network: Idx,
        odt_level: OdtLevel,
    ) -> Idx {
        let idx = self.data.lines.len() as Idx;
        self.data.lines.push(Line {
            idx,
            uri: uri.into(),
            name: name.into(),
            code: code.into(),
            sort_order,
            network,
            odt_level,
            codes: Codes::new(),
            routes: Vec::new(),
            calendars: Vec::new(),
            impacts: Vec::new(),
        });
        self.data.networks[network as usize].lines.push(idx);
        idx
    }

    pub fn add_route(&mut self, uri: &str, name: &str, line: Idx) -> Idx {
        let idx = self.data.routes.len() as Idx;
        self.data.routes.push(Route {
            idx,
            uri: uri.into(),
            name: name.into(),
            line,
            codes: Codes::new(),
            journey_patterns: Vec::new(),
            vehicle_journeys: Vec::new(),
            impacts: Vec::new(),
        });
        self.data.lines[line as usize].routes.push(idx);
        idx
    }

    pub fn add_stop_area(&mut self, uri: &str, name: &str, coord: Coord) -> Idx {
        let idx = self.data.stop_areas.len() as Idx;
        self.data.stop_areas.push(StopArea {
            idx,
            uri: uri.into(),
            name: name.into(),
            coord,
            codes: Codes::new(),
            stop_points: Vec::new(),
            impacts: Vec::new(),
        });
        idx
    }

    pub fn add_stop_point(&mut self, uri: &str, name: &str, stop_area: Idx, coord: Coord) -> Idx {
        let idx = self.data.stop_points.len() as Idx;
        self.data.stop_points.push(StopPoint {
            idx,
            uri: uri.into(),
            name: name.into(),
            stop_area,
            coord,
            codes: Codes::new(),
            connections: Vec::new(),
            journey_pattern_points: Vec::new(),
            impacts: Vec::new(),
        });
        self.data.stop_areas[stop_area as usize].stop_points.push(idx);
        idx
    }

    /// Add a journey pattern over `stop_points` in journey order. One
    /// journey-pattern point per stop is created, with ids
    /// `<uri>:<order>`.
    pub fn add_journey_pattern(&mut self, uri: &str, route: Idx, stop_points: &[Idx]) -> Idx {
        let idx = self.data.journey_patterns.len() as Idx;
        let mut points = Vec::with_capacity(stop_points.len());
        for (order, &stop_point) in stop_points.iter().enumerate() {
            let jpp_idx = self.data.journey_pattern_points.len() as Idx;
            self.data.journey_pattern_points.push(JourneyPatternPoint {
                idx: jpp_idx,
                uri: format!("{uri}:{order}"),
                journey_pattern: idx,
                stop_point,
                order: order as u32,
            });
            self.data.stop_points[stop_point as usize].journey_pattern_points.push(jpp_idx);
            points.push(jpp_idx);
        }
        self.data.journey_patterns.push(JourneyPattern {
            idx,
            uri: uri.into(),
            route,
            points,
            vehicle_journeys: Vec::new(),
        });
        self.data.routes[route as usize].journey_patterns.push(idx);
        idx
    }

    pub fn add_vehicle_journey(
        &mut self,
        uri: &str,
        name: &str,
        journey_pattern: Idx,
        headsigns: &[&str],
        validity: ValidityPattern,
        departures: Vec<u32>,
    ) -> Idx {
        let idx = self.data.vehicle_journeys.len() as Idx;
        let route = self.data.journey_patterns[journey_pattern as usize].route;
        self.data.vehicle_journeys.push(VehicleJourney {
            idx,
            uri: uri.into(),
            name: name.into(),
            route,
            journey_pattern,
            meta_vj: None,
            headsigns: headsigns.iter().map(|s| s.to_string()).collect(),
            codes: Codes::new(),
            validity,
            departures,
        });
        self.data.journey_patterns[journey_pattern as usize].vehicle_journeys.push(idx);
        self.data.routes[route as usize].vehicle_journeys.push(idx);
        idx
    }

    /// Group vehicle journeys under one meta-vehicle-journey.
    pub fn add_meta_vehicle_journey(&mut self, uri: &str, vehicle_journeys: &[Idx]) -> Idx {
        let idx = self.data.meta_vjs.len() as Idx;
        self.data.meta_vjs.push(MetaVehicleJourney {
            idx,
            uri: uri.into(),
            vehicle_journeys: vehicle_journeys.to_vec(),
            impacts: Vec::new(),
        });
        for &vj in vehicle_journeys {
            self.data.vehicle_journeys[vj as usize].meta_vj = Some(idx);
        }
        idx
    }

    pub fn add_connection(&mut self, uri: &str, from: Idx, to: Idx) -> Idx {
        let idx = self.data.connections.len() as Idx;
        self.data.connections.push(Connection { idx, uri: uri.into(), from, to });
        self.data.stop_points[from as usize].connections.push(idx);
        self.data.stop_points[to as usize].connections.push(idx);
        idx
    }

    pub fn add_poi_type(&mut self, uri: &str, name: &str) -> Idx {
        let idx = self.data.poi_types.len() as Idx;
        self.data.poi_types.push(PoiType { idx, uri: uri.into(), name: name.into() });
        idx
    }

    pub fn add_poi(&mut self, uri: &str, name: &str, poi_type: Idx, coord: Coord) -> Idx {
        let idx = self.data.pois.len() as Idx;
        self.data.pois.push(Poi { idx, uri: uri.into(), name: name.into(), poi_type, coord });
        idx
    }

    pub fn add_calendar(&mut self, uri: &str, name: &str, lines: &[Idx]) -> Idx {
        let idx = self.data.calendars.len() as Idx;
        self.data.calendars.push(Calendar {
            idx,
            uri: uri.into(),
            name: name.into(),
            codes: Codes::new(),
            lines: lines.to_vec(),
        });
        for &line in lines {
            self.data.lines[line as usize].calendars.push(idx);
        }
        idx
    }

    /// Attach an external code to an entity.
    pub fn add_code(&mut self, kind: ObjectKind, idx: Idx, key: &str, value: &str) {
        let i = idx as usize;
        let entry = (key.to_string(), value.to_string());
        match kind {
            ObjectKind::Network => self.data.networks[i].codes.push(entry),
            ObjectKind::Line => self.data.lines[i].codes.push(entry),
            ObjectKind::Route => self.data.routes[i].codes.push(entry),
            ObjectKind::StopArea => self.data.stop_areas[i].codes.push(entry),
            ObjectKind::StopPoint => self.data.stop_points[i].codes.push(entry),
            ObjectKind::VehicleJourney => self.data.vehicle_journeys[i].codes.push(entry),
            ObjectKind::Calendar => self.data.calendars[i].codes.push(entry),
            // Other kinds have no code container; the entry is dropped.
            _ => {}
        }
    }

    /// Store an impact and register its weak handle on every informed
    /// entity. Line sections register on their line; a meta-vehicle-
    /// journey also registers on its member journeys' routes, so a trip
    /// alteration stays visible at the line level; unknown targets
    /// register nowhere.
    pub fn add_impact(&mut self, impact: Impact) -> WeakImpact {
        let entities = impact.informed_entities.clone();
        let weak = self.data.impacts.insert(impact);
        for entity in &entities {
            match *entity {
                PtObjRef::Network(i) => self.data.networks[i as usize].impacts.push(weak),
                PtObjRef::Line(i) => self.data.lines[i as usize].impacts.push(weak),
                PtObjRef::Route(i) => self.data.routes[i as usize].impacts.push(weak),
                PtObjRef::StopArea(i) => self.data.stop_areas[i as usize].impacts.push(weak),
                PtObjRef::StopPoint(i) => self.data.stop_points[i as usize].impacts.push(weak),
                PtObjRef::MetaVehicleJourney(i) => {
                    self.data.meta_vjs[i as usize].impacts.push(weak);
                    let routes: Vec<Idx> = self.data.meta_vjs[i as usize]
                        .vehicle_journeys
                        .iter()
                        .map(|&vj| self.data.vehicle_journeys[vj as usize].route)
                        .collect();
                    for route in routes {
                        let impacts = &mut self.data.routes[route as usize].impacts;
                        if !impacts.contains(&weak) {
                            impacts.push(weak);
                        }
                    }
                }
                PtObjRef::LineSection { line, .. } => {
                    self.data.lines[line as usize].impacts.push(weak)
                }
                PtObjRef::Unknown => {}
            }
        }
        weak
    }

    /// Freeze the lookup tables and hand out the snapshot.
    pub fn finalize(mut self) -> Dataset {
        fn uri_map<T>(items: &[T], uri: impl Fn(&T) -> &str) -> FxHashMap<String, Idx> {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (uri(item).to_string(), i as Idx))
                .collect()
        }

        let d = &mut self.data;
        d.uri_maps.insert(ObjectKind::Network, uri_map(&d.networks, |n| &n.uri));
        d.uri_maps.insert(ObjectKind::Line, uri_map(&d.lines, |l| &l.uri));
        d.uri_maps.insert(ObjectKind::Route, uri_map(&d.routes, |r| &r.uri));
        d.uri_maps.insert(ObjectKind::StopArea, uri_map(&d.stop_areas, |s| &s.uri));
        d.uri_maps.insert(ObjectKind::StopPoint, uri_map(&d.stop_points, |s| &s.uri));
        d.uri_maps
            .insert(ObjectKind::VehicleJourney, uri_map(&d.vehicle_journeys, |v| &v.uri));
        d.uri_maps
            .insert(ObjectKind::MetaVehicleJourney, uri_map(&d.meta_vjs, |m| &m.uri));
        d.uri_maps
            .insert(ObjectKind::JourneyPattern, uri_map(&d.journey_patterns, |j| &j.uri));
        d.uri_maps.insert(
            ObjectKind::JourneyPatternPoint,
            uri_map(&d.journey_pattern_points, |j| &j.uri),
        );
        d.uri_maps.insert(ObjectKind::Connection, uri_map(&d.connections, |c| &c.uri));
        d.uri_maps.insert(ObjectKind::Poi, uri_map(&d.pois, |p| &p.uri));
        d.uri_maps.insert(ObjectKind::PoiType, uri_map(&d.poi_types, |p| &p.uri));
        d.uri_maps.insert(ObjectKind::Calendar, uri_map(&d.calendars, |c| &c.uri));

        fn collect_codes(
            out: &mut FxHashMap<(ObjectKind, String, String), Vec<Idx>>,
            kind: ObjectKind,
            idx: Idx,
            codes: &Codes,
        ) {
            for (key, value) in codes {
                out.entry((kind, key.clone(), value.clone())).or_default().push(idx);
            }
        }
        let mut codes = FxHashMap::default();
        for n in &d.networks {
            collect_codes(&mut codes, ObjectKind::Network, n.idx, &n.codes);
        }
        for l in &d.lines {
            collect_codes(&mut codes, ObjectKind::Line, l.idx, &l.codes);
        }
        for r in &d.routes {
            collect_codes(&mut codes, ObjectKind::Route, r.idx, &r.codes);
        }
        for s in &d.stop_areas {
            collect_codes(&mut codes, ObjectKind::StopArea, s.idx, &s.codes);
        }
        for s in &d.stop_points {
            collect_codes(&mut codes, ObjectKind::StopPoint, s.idx, &s.codes);
        }
        for v in &d.vehicle_journeys {
            collect_codes(&mut codes, ObjectKind::VehicleJourney, v.idx, &v.codes);
        }
        for c in &d.calendars {
            collect_codes(&mut codes, ObjectKind::Calendar, c.idx, &c.codes);
        }
        d.codes = codes;

        let mut headsigns: FxHashMap<String, Vec<Idx>> = FxHashMap::default();
        for vj in &d.vehicle_journeys {
            for headsign in &vj.headsigns {
                headsigns.entry(headsign.clone()).or_default().push(vj.idx);
            }
        }
        d.headsigns = headsigns;

        self.data
    }
}
