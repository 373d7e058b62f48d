//! Traffic reports: the currently publishable disruptions of a filtered
//! sub-network, grouped by network and sub-grouped by line, stop area
//! and vehicle journey.
//!
//! The aggregator runs one PTRef query per grouping axis. The network
//! and line queries are authoritative: their errors surface to the
//! caller. The per-network stop-area and vehicle-journey queries compose
//! the caller's filter with a `network.uri=...` restriction, and a
//! filter that does not intersect a given network is an expected,
//! recoverable event: parse failures are logged at WARN, semantic
//! failures mean "nothing for this network".

use chrono::NaiveDateTime;

use ptref_engine::{make_query, QueryError};
use ptref_model::disruption::{Effect, ImpactSet};
use ptref_model::entities::OdtLevel;
use ptref_model::{Dataset, Idx, ObjectKind};

/// Publishable disruptions of one network, sub-grouped by entity.
///
/// Within one report every `NetworkDisrupt` has a distinct network, and
/// within one `NetworkDisrupt` every line / stop area / vehicle journey
/// appears at most once; colliding impact sets are unioned.
#[derive(Debug)]
pub struct NetworkDisrupt {
    pub network: Idx,
    /// Impacts informing the network itself.
    pub network_disruptions: ImpactSet,
    pub lines: Vec<(Idx, ImpactSet)>,
    pub stop_areas: Vec<(Idx, ImpactSet)>,
    pub vehicle_journeys: Vec<(Idx, ImpactSet)>,
}

/// One page of a traffic report, ready for serialization.
#[derive(Debug)]
pub struct Report {
    /// Number of network groups before pagination.
    pub total: usize,
    /// Serialization depth requested by the caller.
    pub depth: usize,
    pub networks: Vec<NetworkDisrupt>,
}

/// Build the traffic report for the sub-network matched by `filter`.
pub fn traffic_reports(
    data: &Dataset,
    now: NaiveDateTime,
    depth: usize,
    count: usize,
    start_page: usize,
    filter: &str,
    forbidden_uris: &[String],
) -> Result<Report, QueryError> {
    let mut report = TrafficReport { disrupts: Vec::new() };
    report.disruptions_list(data, filter, forbidden_uris, now)?;
    let total = report.disrupts.len();
    let networks = paginate(report.disrupts, count, start_page);
    Ok(Report { total, depth, networks })
}

struct TrafficReport {
    disrupts: Vec<NetworkDisrupt>,
}

impl TrafficReport {
    fn disruptions_list(
        &mut self,
        data: &Dataset,
        filter: &str,
        forbidden_uris: &[String],
        now: NaiveDateTime,
    ) -> Result<(), QueryError> {
        // Nothing disrupted, nothing to compute.
        if data.impacts.is_empty() {
            return Ok(());
        }
        let networks = make_query(
            ObjectKind::Network,
            filter,
            forbidden_uris,
            OdtLevel::All,
            None,
            None,
            data,
        )?;
        self.add_networks(data, &networks, now);
        self.add_lines(data, filter, forbidden_uris, now)?;
        self.add_stop_areas(data, &networks, filter, forbidden_uris, now);
        self.add_vehicle_journeys(data, &networks, filter, forbidden_uris, now);
        self.sort(data);
        Ok(())
    }

    fn find_or_create(&mut self, network: Idx) -> &mut NetworkDisrupt {
        let pos = match self.disrupts.iter().position(|d| d.network == network) {
            Some(pos) => pos,
            None => {
                self.disrupts.push(NetworkDisrupt {
                    network,
                    network_disruptions: ImpactSet::new(),
                    lines: Vec::new(),
                    stop_areas: Vec::new(),
                    vehicle_journeys: Vec::new(),
                });
                self.disrupts.len() - 1
            }
        };
        &mut self.disrupts[pos]
    }

    fn add_networks(&mut self, data: &Dataset, networks: &[Idx], now: NaiveDateTime) {
        for &idx in networks {
            let messages = data.publishable_impacts(ObjectKind::Network, idx, now);
            if !messages.is_empty() {
                self.find_or_create(idx).network_disruptions.merge(&messages);
            }
        }
    }

    /// A line carries its own messages plus each of its routes'.
    fn add_lines(
        &mut self,
        data: &Dataset,
        filter: &str,
        forbidden_uris: &[String],
        now: NaiveDateTime,
    ) -> Result<(), QueryError> {
        let lines = make_query(
            ObjectKind::Line,
            filter,
            forbidden_uris,
            OdtLevel::All,
            None,
            None,
            data,
        )?;
        for line_idx in lines {
            let line = &data.lines[line_idx as usize];
            let mut messages = data.publishable_impacts(ObjectKind::Line, line_idx, now);
            for &route in &line.routes {
                messages.merge(&data.publishable_impacts(ObjectKind::Route, route, now));
            }
            if !messages.is_empty() {
                let entries = &mut self.find_or_create(line.network).lines;
                merge_entry(entries, line_idx, messages);
            }
        }
        Ok(())
    }

    /// A stop area carries its own messages plus each stop point's.
    fn add_stop_areas(
        &mut self,
        data: &Dataset,
        networks: &[Idx],
        filter: &str,
        forbidden_uris: &[String],
        now: NaiveDateTime,
    ) {
        for &network_idx in networks {
            let sub_filter =
                network_filter(&data.networks[network_idx as usize].uri, filter, false);
            let stop_areas = match make_query(
                ObjectKind::StopArea,
                &sub_filter,
                forbidden_uris,
                OdtLevel::All,
                None,
                None,
                data,
            ) {
                Ok(stop_areas) => stop_areas,
                Err(QueryError::PtRef(_)) => {
                    // Expected whenever the caller's filter does not
                    // intersect this network.
                    continue;
                }
                Err(err) => {
                    log::warn!("traffic reports: unable to parse the stop area filter: {err}");
                    continue;
                }
            };
            for sa_idx in stop_areas {
                let mut messages = data.publishable_impacts(ObjectKind::StopArea, sa_idx, now);
                for &sp in &data.stop_areas[sa_idx as usize].stop_points {
                    messages.merge(&data.publishable_impacts(ObjectKind::StopPoint, sp, now));
                }
                if !messages.is_empty() {
                    let entries = &mut self.find_or_create(network_idx).stop_areas;
                    merge_entry(entries, sa_idx, messages);
                }
            }
        }
    }

    /// Vehicle journeys keep only publishable `NoService` impacts.
    fn add_vehicle_journeys(
        &mut self,
        data: &Dataset,
        networks: &[Idx],
        filter: &str,
        forbidden_uris: &[String],
        now: NaiveDateTime,
    ) {
        for &network_idx in networks {
            let sub_filter =
                network_filter(&data.networks[network_idx as usize].uri, filter, true);
            let vehicle_journeys = match make_query(
                ObjectKind::VehicleJourney,
                &sub_filter,
                forbidden_uris,
                OdtLevel::All,
                None,
                None,
                data,
            ) {
                Ok(vehicle_journeys) => vehicle_journeys,
                Err(QueryError::PtRef(_)) => continue,
                Err(err) => {
                    log::warn!(
                        "traffic reports: unable to parse the vehicle journey filter: {err}"
                    );
                    continue;
                }
            };
            for vj_idx in vehicle_journeys {
                let mut kept = ImpactSet::new();
                for weak in data.impacts_on(ObjectKind::VehicleJourney, vj_idx) {
                    let Some(impact) = data.impacts.upgrade(weak) else {
                        continue;
                    };
                    if !impact.disruption.is_publishable(now) {
                        continue;
                    }
                    if impact.severity.effect != Effect::NoService {
                        continue;
                    }
                    kept.insert(weak.id, impact);
                }
                if !kept.is_empty() {
                    let entries = &mut self.find_or_create(network_idx).vehicle_journeys;
                    merge_entry(entries, vj_idx, kept);
                }
            }
        }
    }

    fn sort(&mut self, data: &Dataset) {
        self.disrupts.sort_by(|a, b| data.compare_networks(a.network, b.network));
        for disrupt in &mut self.disrupts {
            disrupt.lines.sort_by(|(l1, s1), (l2, s2)| {
                min_priority(s1)
                    .cmp(&min_priority(s2))
                    .then_with(|| {
                        data.lines[*l1 as usize].code.cmp(&data.lines[*l2 as usize].code)
                    })
                    .then_with(|| {
                        data.lines[*l1 as usize].name.cmp(&data.lines[*l2 as usize].name)
                    })
            });
        }
    }
}

/// `network.uri=<uri>`, optionally restricted to disrupted journeys,
/// composed with the caller's filter.
fn network_filter(network_uri: &str, filter: &str, has_disruption: bool) -> String {
    let mut out = format!("network.uri={network_uri}");
    if has_disruption {
        out.push_str(" and vehicle_journey.has_disruption()");
    }
    if !filter.is_empty() {
        out.push_str(" and ");
        out.push_str(filter);
    }
    out
}

/// Add `messages` under `key`, unioning with an existing entry.
fn merge_entry(entries: &mut Vec<(Idx, ImpactSet)>, key: Idx, messages: ImpactSet) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, set)) => set.merge(&messages),
        None => entries.push((key, messages)),
    }
}

/// Smallest severity priority of the set; severities without one are
/// ignored.
fn min_priority(impacts: &ImpactSet) -> i32 {
    impacts
        .iter()
        .filter_map(|(_, impact)| impact.severity.priority)
        .min()
        .unwrap_or(i32::MAX)
}

/// Stable slice `[page * count, page * count + count)`.
fn paginate(disrupts: Vec<NetworkDisrupt>, count: usize, start_page: usize) -> Vec<NetworkDisrupt> {
    disrupts.into_iter().skip(start_page.saturating_mul(count)).take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ptref_model::disruption::{Disruption, Impact, ImpactStore, PtObjRef, Severity};
    use ptref_model::period::TimePeriod;

    fn impact(uri: &str, priority: Option<i32>) -> Impact {
        let start = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2019, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        Impact {
            uri: uri.into(),
            disruption: Disruption {
                uri: format!("disruption:{uri}"),
                publication_period: TimePeriod::new(start, end),
            },
            severity: Severity { name: "s".into(), priority, effect: Effect::NoService },
            application_periods: vec![],
            informed_entities: vec![PtObjRef::Unknown],
        }
    }

    #[test]
    fn merge_entry_unions_on_key_collision() {
        let mut store = ImpactStore::new();
        let w1 = store.insert(impact("i1", Some(1)));
        let w2 = store.insert(impact("i2", Some(2)));

        let mut entries: Vec<(Idx, ImpactSet)> = Vec::new();
        let mut first = ImpactSet::new();
        first.insert(w1.id, store.upgrade(&w1).unwrap());
        merge_entry(&mut entries, 7, first);
        let mut second = ImpactSet::new();
        second.insert(w2.id, store.upgrade(&w2).unwrap());
        second.insert(w1.id, store.upgrade(&w1).unwrap());
        merge_entry(&mut entries, 7, second);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.len(), 2);
    }

    #[test]
    fn min_priority_ignores_absent_priorities() {
        let mut store = ImpactStore::new();
        let w1 = store.insert(impact("i1", None));
        let w2 = store.insert(impact("i2", Some(3)));

        let mut set = ImpactSet::new();
        set.insert(w1.id, store.upgrade(&w1).unwrap());
        assert_eq!(min_priority(&set), i32::MAX);
        set.insert(w2.id, store.upgrade(&w2).unwrap());
        assert_eq!(min_priority(&set), 3);
    }

    #[test]
    fn network_filter_composition() {
        assert_eq!(network_filter("network:N1", "", false), "network.uri=network:N1");
        assert_eq!(
            network_filter("network:N1", "line.code=7", false),
            "network.uri=network:N1 and line.code=7"
        );
        assert_eq!(
            network_filter("network:N1", "line.code=7", true),
            "network.uri=network:N1 and vehicle_journey.has_disruption() and line.code=7"
        );
    }
}
