//! The static entity type graph and the shortest-path projection walk.
//!
//! Nodes are [`ObjectKind`]s, an edge `K -> K'` means "from an index of K
//! the dataset can produce the related indices of K'". The graph is a
//! compile-time constant; [`find_path`] and [`navigate`] are pure, and
//! ties between equally short paths resolve by the declared edge order.
//!
//! Impact is a sink: entities project onto their impacts but no edge
//! leaves Impact, so disruptions can never shortcut a path between two
//! transit kinds.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use ptref_model::{Dataset, Indexes, ObjectKind};

/// Out-edges of `kind`, in tie-breaking order.
pub fn edges(kind: ObjectKind) -> &'static [ObjectKind] {
    use ObjectKind::*;
    match kind {
        Network => &[Line, Impact],
        Line => &[Network, Route, Calendar, Impact],
        Route => &[Line, JourneyPattern, VehicleJourney, Impact],
        StopArea => &[StopPoint, Impact],
        StopPoint => &[StopArea, Connection, JourneyPatternPoint, Impact],
        VehicleJourney => &[Route, JourneyPattern, MetaVehicleJourney, Impact],
        MetaVehicleJourney => &[VehicleJourney],
        JourneyPattern => &[Route, JourneyPatternPoint, VehicleJourney],
        JourneyPatternPoint => &[JourneyPattern, StopPoint],
        Connection => &[StopPoint],
        Poi => &[PoiType],
        PoiType => &[Poi],
        Calendar => &[Line],
        Impact | Unknown => &[],
    }
}

/// Next-hop map toward `target`: for every kind that can reach the
/// target, the first step of a shortest path. The target maps to itself.
pub fn find_path(target: ObjectKind) -> FxHashMap<ObjectKind, ObjectKind> {
    // BFS over reversed edges gives each kind's distance to the target.
    let mut dist: FxHashMap<ObjectKind, u32> = FxHashMap::default();
    dist.insert(target, 0);
    let mut queue = VecDeque::from([target]);
    while let Some(node) = queue.pop_front() {
        let d = dist[&node];
        for kind in ObjectKind::ALL {
            if !dist.contains_key(&kind) && edges(kind).contains(&node) {
                dist.insert(kind, d + 1);
                queue.push_back(kind);
            }
        }
    }

    // The next hop is the first out-edge (declaration order) that gets
    // strictly closer; this is the deterministic tie-break.
    let mut next: FxHashMap<ObjectKind, ObjectKind> = FxHashMap::default();
    next.insert(target, target);
    for (&kind, &d) in &dist {
        if d == 0 {
            continue;
        }
        let hop = edges(kind)
            .iter()
            .copied()
            .find(|e| dist.get(e) == Some(&(d - 1)))
            .expect("a kind at distance d has an out-edge at distance d - 1");
        next.insert(kind, hop);
    }
    next
}

/// Project `indexes` of kind `from` onto kind `to` along a shortest
/// path. An unreachable target yields the empty set, not an error.
pub fn navigate(
    data: &Dataset,
    from: ObjectKind,
    to: ObjectKind,
    indexes: Indexes,
) -> Indexes {
    if from == to {
        return indexes;
    }
    let path = find_path(to);
    let mut current = from;
    let mut indexes = indexes;
    loop {
        let Some(&hop) = path.get(&current) else {
            // no path from `current` to the target
            return Indexes::new();
        };
        if hop == current {
            break;
        }
        indexes = data.related(current, hop, &indexes);
        current = hop;
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ObjectKind::*;

    /// Walk the next-hop map from `from` until the fixpoint.
    fn path_from(from: ObjectKind, to: ObjectKind) -> Option<Vec<ObjectKind>> {
        let next = find_path(to);
        let mut path = vec![from];
        let mut current = from;
        loop {
            let hop = *next.get(&current)?;
            if hop == current {
                return Some(path);
            }
            path.push(hop);
            current = hop;
        }
    }

    #[test]
    fn network_to_stop_area_goes_through_lines() {
        let path = path_from(Network, StopArea).unwrap();
        assert_eq!(
            path,
            vec![Network, Line, Route, JourneyPattern, JourneyPatternPoint, StopPoint, StopArea]
        );
    }

    #[test]
    fn network_to_vehicle_journey() {
        let path = path_from(Network, VehicleJourney).unwrap();
        assert_eq!(path, vec![Network, Line, Route, VehicleJourney]);
    }

    #[test]
    fn impact_is_one_hop_from_carriers() {
        assert_eq!(path_from(Network, Impact).unwrap(), vec![Network, Impact]);
        assert_eq!(path_from(StopPoint, Impact).unwrap(), vec![StopPoint, Impact]);
    }

    #[test]
    fn nothing_is_reachable_from_impact() {
        assert!(path_from(Impact, Network).is_none());
        assert!(path_from(Impact, Line).is_none());
    }

    #[test]
    fn disruptions_never_shortcut_transit_paths() {
        // Every shortest path between two non-impact kinds stays off the
        // Impact node.
        for from in ObjectKind::ALL {
            for to in ObjectKind::ALL {
                if from == Impact || to == Impact {
                    continue;
                }
                if let Some(path) = path_from(from, to) {
                    assert!(!path.contains(&Impact), "{from} -> {to} via {path:?}");
                }
            }
        }
    }

    #[test]
    fn poi_world_is_disconnected_from_transit() {
        assert!(path_from(Poi, Network).is_none());
        assert!(path_from(Network, PoiType).is_none());
        assert_eq!(path_from(Poi, PoiType).unwrap(), vec![Poi, PoiType]);
    }

    #[test]
    fn find_path_is_deterministic() {
        for to in ObjectKind::ALL {
            assert_eq!(find_path(to), find_path(to));
        }
    }
}
