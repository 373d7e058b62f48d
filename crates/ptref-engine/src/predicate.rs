//! Compiles a binary clause into a predicate over one kind's records.
//!
//! Only three attributes compare directly: `uri`, `name` and `code` (a
//! line's commercial code). A clause on an attribute the kind does not
//! have is dropped from the predicate with a warning, so a single-clause
//! filter on an unsupported attribute matches the whole collection. This
//! permissiveness is part of the DSL's contract.

use ptref_filter::{CompareOp, Filter};
use ptref_model::disruption::ImpactId;
use ptref_model::{Dataset, Idx, ObjectKind};

/// A directly comparable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attr {
    Uri,
    Name,
    Code,
}

impl Attr {
    fn from_name(name: &str) -> Option<Attr> {
        match name {
            "uri" => Some(Attr::Uri),
            "name" => Some(Attr::Name),
            "code" => Some(Attr::Code),
            _ => None,
        }
    }

    /// Whether records of `kind` carry this attribute.
    fn supported_by(self, kind: ObjectKind) -> bool {
        use ObjectKind::*;
        match self {
            Attr::Uri => !matches!(kind, JourneyPattern | JourneyPatternPoint | Unknown),
            Attr::Name => matches!(
                kind,
                Network | Line | Route | StopArea | StopPoint | VehicleJourney | Poi | PoiType
                    | Calendar
            ),
            Attr::Code => kind == ObjectKind::Line,
        }
    }
}

#[derive(Debug)]
struct Clause {
    attr: Attr,
    op: CompareOp,
    value: String,
}

/// A conjunction of comparable clauses for one kind.
#[derive(Debug)]
pub struct Predicate {
    kind: ObjectKind,
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Compile the binary filters of `filters` for `kind`. Non-binary
    /// shapes are the resolver's business and are skipped here.
    pub fn compile(kind: ObjectKind, filters: &[Filter]) -> Predicate {
        let mut clauses = Vec::new();
        for filter in filters {
            let Filter::Binary { attribute, op, value, .. } = filter else {
                continue;
            };
            match Attr::from_name(attribute) {
                Some(attr) if attr.supported_by(kind) => {
                    clauses.push(Clause { attr, op: *op, value: value.clone() });
                }
                Some(_) => {
                    log::warn!(
                        "given object has no member: {attribute}. The filter is ignored"
                    );
                }
                None => {
                    log::warn!("unhandled filter type: {attribute}. The filter is ignored");
                }
            }
        }
        Predicate { kind, clauses }
    }

    /// Evaluate the predicate on one record. Discarded impacts never
    /// match.
    pub fn matches(&self, data: &Dataset, idx: Idx) -> bool {
        if self.kind == ObjectKind::Impact {
            let Some(impact) = data.impacts.get(ImpactId(idx)) else {
                return false;
            };
            return self.clauses.iter().all(|clause| match clause.attr {
                Attr::Uri => compare(&impact.uri, clause.op, &clause.value),
                // compile() only keeps uri clauses for impacts
                _ => true,
            });
        }
        self.clauses.iter().all(|clause| {
            match field(data, self.kind, idx, clause.attr) {
                Some(actual) => compare(actual, clause.op, &clause.value),
                None => false,
            }
        })
    }
}

/// Lexicographic comparison of a record field against the clause value.
fn compare(actual: &str, op: CompareOp, value: &str) -> bool {
    match op {
        CompareOp::Eq => actual == value,
        CompareOp::Neq => actual != value,
        CompareOp::Lt => actual < value,
        CompareOp::Leq => actual <= value,
        CompareOp::Gt => actual > value,
        CompareOp::Geq => actual >= value,
        // spatial clauses never reach the predicate
        CompareOp::DWithin => false,
    }
}

/// The record's attribute value, for kinds the compiler accepted.
fn field(data: &Dataset, kind: ObjectKind, idx: Idx, attr: Attr) -> Option<&str> {
    use ObjectKind::*;
    let i = idx as usize;
    let value = match (kind, attr) {
        (Network, Attr::Uri) => &data.networks[i].uri,
        (Network, Attr::Name) => &data.networks[i].name,
        (Line, Attr::Uri) => &data.lines[i].uri,
        (Line, Attr::Name) => &data.lines[i].name,
        (Line, Attr::Code) => &data.lines[i].code,
        (Route, Attr::Uri) => &data.routes[i].uri,
        (Route, Attr::Name) => &data.routes[i].name,
        (StopArea, Attr::Uri) => &data.stop_areas[i].uri,
        (StopArea, Attr::Name) => &data.stop_areas[i].name,
        (StopPoint, Attr::Uri) => &data.stop_points[i].uri,
        (StopPoint, Attr::Name) => &data.stop_points[i].name,
        (VehicleJourney, Attr::Uri) => &data.vehicle_journeys[i].uri,
        (VehicleJourney, Attr::Name) => &data.vehicle_journeys[i].name,
        (MetaVehicleJourney, Attr::Uri) => &data.meta_vjs[i].uri,
        (Connection, Attr::Uri) => &data.connections[i].uri,
        (Poi, Attr::Uri) => &data.pois[i].uri,
        (Poi, Attr::Name) => &data.pois[i].name,
        (PoiType, Attr::Uri) => &data.poi_types[i].uri,
        (PoiType, Attr::Name) => &data.poi_types[i].name,
        (Calendar, Attr::Uri) => &data.calendars[i].uri,
        (Calendar, Attr::Name) => &data.calendars[i].name,
        _ => return None,
    };
    Some(value)
}
