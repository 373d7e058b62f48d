//! `make_query`: the composed PTRef pipeline.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use ptref_filter::{CompareOp, Filter};
use ptref_model::disruption::ImpactId;
use ptref_model::entities::{OdtLevel, VehicleJourney};
use ptref_model::period::TimePeriod;
use ptref_model::{Dataset, Idx, Indexes, ObjectKind};

use crate::error::QueryError;
use crate::resolve::resolve_filter;
use crate::type_graph::navigate;

/// Run a PTRef query and return the matching indices of
/// `requested`, ordered.
///
/// Networks and lines come back in their natural order; every other kind
/// keeps ascending index order.
pub fn make_query(
    requested: ObjectKind,
    request: &str,
    forbidden_uris: &[String],
    odt_level: OdtLevel,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    data: &Dataset,
) -> Result<Vec<Idx>, QueryError> {
    let indexes =
        make_query_inner(requested, request, forbidden_uris, odt_level, since, until, data)?;
    let mut result = indexes.into_vec();
    match requested {
        ObjectKind::Network => result.sort_by(|&a, &b| data.compare_networks(a, b)),
        ObjectKind::Line => result.sort_by(|&a, &b| data.compare_lines(a, b)),
        _ => {}
    }
    Ok(result)
}

/// Unsorted variant for the recursive shapes (HAVING, AFTER): no
/// forbidden URIs, no post-filters.
pub(crate) fn make_query_set(
    requested: ObjectKind,
    request: &str,
    data: &Dataset,
) -> Result<Indexes, QueryError> {
    make_query_inner(requested, request, &[], OdtLevel::All, None, None, data)
}

fn make_query_inner(
    requested: ObjectKind,
    request: &str,
    forbidden_uris: &[String],
    odt_level: OdtLevel,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    data: &Dataset,
) -> Result<Indexes, QueryError> {
    if data.count(requested) == 0 {
        return Err(QueryError::PtRef(
            "Filters: No requested object in the database".to_string(),
        ));
    }

    let filters = if request.is_empty() { Vec::new() } else { ptref_filter::parse(request)? };

    // Annotate every clause with its resolved kind up front; a filter
    // with an unresolved object never reaches evaluation.
    let mut typed = Vec::with_capacity(filters.len());
    for filter in &filters {
        match ObjectKind::from_caption(filter.object()) {
            Some(kind) => typed.push((kind, filter)),
            None => {
                return Err(QueryError::UnknownObject(format!(
                    "Filter: unknown object type: {}",
                    filter.object()
                )))
            }
        }
    }

    let mut final_indexes = if typed.is_empty() {
        data.all_indexes(requested)
    } else {
        let mut acc = Indexes::new();
        for (i, (kind, filter)) in typed.iter().enumerate() {
            let resolved = resolve_filter(data, *kind, filter)?;
            let projected = navigate(data, *kind, requested, resolved);
            acc = if i == 0 { projected } else { acc.intersection(&projected) };
            if acc.is_empty() {
                break;
            }
        }
        acc
    };

    // Forbidden URIs subtract, each through a synthesized uri clause of
    // its own kind.
    for uri in forbidden_uris {
        let kind = data.kind_of_uri(uri);
        if kind == ObjectKind::Unknown {
            log::info!("impossible to find the uri {uri}, not used as a forbidden id");
            continue;
        }
        let forbidden = Filter::Binary {
            object: kind.caption().to_string(),
            attribute: "uri".to_string(),
            op: CompareOp::Eq,
            value: uri.clone(),
        };
        let resolved = resolve_filter(data, kind, &forbidden)?;
        let projected = navigate(data, kind, requested, resolved);
        final_indexes = final_indexes.difference(&projected);
    }

    if odt_level != OdtLevel::All && requested == ObjectKind::Line {
        final_indexes = final_indexes
            .iter()
            .filter(|&idx| data.lines[idx as usize].odt_level == odt_level)
            .collect();
    }

    if since.is_some() || until.is_some() {
        final_indexes = filter_on_period(final_indexes, requested, since, until, data)?;
    }

    if final_indexes.is_empty() {
        return Err(QueryError::PtRef("Filters: Unable to find object".to_string()));
    }
    Ok(final_indexes)
}

// ── Validity-period filtering ──────────────────────────────────────────

/// Clamp `since`/`until` to the production period and filter. Only
/// vehicle journeys and impacts support a validity-period restriction.
fn filter_on_period(
    indexes: Indexes,
    requested: ObjectKind,
    since: Option<NaiveDateTime>,
    until: Option<NaiveDateTime>,
    data: &Dataset,
) -> Result<Indexes, QueryError> {
    if let (Some(since), Some(until)) = (since, until) {
        if until < since {
            return Err(QueryError::PtRef("invalid filtering period".to_string()));
        }
    }

    let production = data.production_period();
    let mut start = production.begin.and_time(NaiveTime::MIN);
    let mut end = production.end.and_time(NaiveTime::MIN);
    if let Some(since) = since {
        if production.ends_before(since.date()) {
            return Err(QueryError::PtRef(
                "invalid filtering period, not in production period".to_string(),
            ));
        }
        if since.date() >= production.begin {
            start = since;
        }
    }
    if let Some(until) = until {
        if production.begins_after(until.date()) {
            return Err(QueryError::PtRef(
                "invalid filtering period, not in production period".to_string(),
            ));
        }
        if until.date() <= production.last_day() {
            end = until;
        }
    }
    // The end bound is inclusive at second resolution.
    let period = TimePeriod::new(start, end + Duration::seconds(1));

    match requested {
        ObjectKind::VehicleJourney => Ok(indexes
            .iter()
            .filter(|&idx| keep_vj(&data.vehicle_journeys[idx as usize], &period))
            .collect()),
        ObjectKind::Impact => Ok(indexes
            .iter()
            .filter(|&idx| keep_impact(data, idx, &period))
            .collect()),
        _ => Err(QueryError::GlobalParse(
            "cannot filter on validity period for this type".to_string(),
        )),
    }
}

/// A journey stays iff its base pattern runs on a day of the period and
/// its first departure on that day falls inside the period.
fn keep_vj(vj: &VehicleJourney, period: &TimePeriod) -> bool {
    let Some(first_departure) = vj.first_departure() else {
        // no stop time, so it cannot be valid
        return false;
    };
    let last = period.last_day();
    let mut day = period.start.date();
    while day <= last {
        if vj.validity.active(day) {
            let departure = day.and_time(NaiveTime::MIN) + Duration::seconds(first_departure as i64);
            if period.contains(departure) {
                return true;
            }
        }
        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
    }
    false
}

/// An impact stays iff one of its application periods overlaps the
/// filter period. Discarded impacts are skipped.
fn keep_impact(data: &Dataset, idx: Idx, period: &TimePeriod) -> bool {
    let Some(impact) = data.impacts.get(ImpactId(idx)) else {
        return false;
    };
    impact.application_periods.iter().any(|application| application.intersects(period))
}
