//! Resolves one filter clause to an index set of the clause's own kind.
//!
//! Dispatch order matters and mirrors the DSL's contract: the spatial
//! operator first, then the recursive shapes (HAVING, AFTER), method
//! calls, the journey-pattern id special cases, the URI fast path, and
//! finally a linear scan with a compiled predicate.

use ptref_filter::{CompareOp, Filter};
use ptref_model::disruption::{Effect, PtObjRef};
use ptref_model::{Coord, Dataset, Idx, Indexes, ObjectKind};

use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::query;

/// Indices of `kind` matching `filter`.
pub fn resolve_filter(
    data: &Dataset,
    kind: ObjectKind,
    filter: &Filter,
) -> Result<Indexes, QueryError> {
    match filter {
        Filter::Binary { op: CompareOp::DWithin, value, .. } => dwithin(data, kind, value),

        Filter::Having { value, .. } => query::make_query_set(kind, value, data),

        Filter::After { value } => after(data, value),

        Filter::Method { object, method, args } => method_call(data, kind, object, method, args),

        // Journey patterns and their points live behind dedicated id
        // lookups; their records have no general attributes.
        Filter::Binary { object, attribute, op: CompareOp::Eq, value }
            if object == "journey_pattern" && (attribute == "uri" || attribute == "name") =>
        {
            Ok(match data.journey_pattern_by_id(value) {
                Some(idx) => Indexes::single(idx),
                None => Indexes::new(),
            })
        }
        Filter::Binary { object, attribute, op: CompareOp::Eq, value }
            if object == "journey_pattern_point"
                && (attribute == "uri" || attribute == "name") =>
        {
            Ok(match data.journey_pattern_point_by_id(value) {
                Some(idx) => Indexes::single(idx),
                None => Indexes::new(),
            })
        }

        // URI equality resolves through the kind's URI map. Impacts have
        // no map and take the scan below.
        Filter::Binary { attribute, op: CompareOp::Eq, value, .. }
            if attribute == "uri" && kind != ObjectKind::Impact =>
        {
            Ok(match data.index_by_uri(kind, value) {
                Some(idx) => Indexes::single(idx),
                None => Indexes::new(),
            })
        }

        filter => Ok(scan(data, kind, filter)),
    }
}

/// `object.coord DWITHIN(lon,lat,distance)` through the proximity index.
fn dwithin(data: &Dataset, kind: ObjectKind, value: &str) -> Result<Indexes, QueryError> {
    let center = parse_dwithin(value).ok_or_else(|| {
        QueryError::PartialParse(format!("Unable to parse the DWITHIN parameter {value}"))
    })?;
    let (coord, distance) = center;
    match data.find_within(kind, coord, distance) {
        Some(hits) => Ok(hits.into_iter().map(|(idx, _)| idx).collect()),
        None => Err(QueryError::PtRef(
            "The requested object can not be used in a DWITHIN clause".to_string(),
        )),
    }
}

/// Split `lon,lat,distance`, each field trimmed and decimal.
fn parse_dwithin(value: &str) -> Option<(Coord, f64)> {
    let mut fields = value.split(',');
    let lon: f64 = fields.next()?.trim().parse().ok()?;
    let lat: f64 = fields.next()?.trim().parse().ok()?;
    let distance: f64 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((Coord::new(lon, lat), distance))
}

/// `AFTER(sub-filter)`: the journey-pattern points strictly after the
/// matched ones on their own journey pattern.
fn after(data: &Dataset, value: &str) -> Result<Indexes, QueryError> {
    let first_points = query::make_query_set(ObjectKind::JourneyPatternPoint, value, data)?;
    let mut out = Indexes::new();
    for idx in first_points.iter() {
        let point = &data.journey_pattern_points[idx as usize];
        let pattern = &data.journey_patterns[point.journey_pattern as usize];
        for &other in &pattern.points {
            if data.journey_pattern_points[other as usize].order > point.order {
                out.insert(other);
            }
        }
    }
    Ok(out)
}

/// The closed set of method calls.
fn method_call(
    data: &Dataset,
    kind: ObjectKind,
    object: &str,
    method: &str,
    args: &[String],
) -> Result<Indexes, QueryError> {
    if object == "vehicle_journey" && method == "has_headsign" && args.len() == 1 {
        Ok(data.vehicle_journeys_by_headsign(&args[0]))
    } else if object == "vehicle_journey" && method == "has_disruption" && args.is_empty() {
        Ok(no_service_vehicle_journeys(data))
    } else if method == "has_code" && args.len() == 2 {
        Ok(data.codes_lookup(kind, &args[0], &args[1]))
    } else {
        Err(QueryError::PartialParse(format!("Unknown method {object}:{method}")))
    }
}

/// Vehicle journeys informed by a live `NoService` impact. Informed
/// entities only project through their meta-vehicle-journey; other
/// variants name no vehicle journey.
fn no_service_vehicle_journeys(data: &Dataset) -> Indexes {
    let mut out = Indexes::new();
    for weak in data.impacts.weak_impacts() {
        let Some(impact) = data.impacts.upgrade(&weak) else {
            continue;
        };
        if impact.severity.effect != Effect::NoService {
            continue;
        }
        for entity in &impact.informed_entities {
            if let PtObjRef::MetaVehicleJourney(meta) = entity {
                out.extend(
                    data.meta_vjs[*meta as usize].vehicle_journeys.iter().copied(),
                );
            }
        }
    }
    out
}

/// Linear scan of the kind's collection with a compiled predicate.
fn scan(data: &Dataset, kind: ObjectKind, filter: &Filter) -> Indexes {
    let predicate = Predicate::compile(kind, std::slice::from_ref(filter));
    (0..data.count(kind) as Idx)
        .filter(|&idx| predicate.matches(data, idx))
        .collect()
}
