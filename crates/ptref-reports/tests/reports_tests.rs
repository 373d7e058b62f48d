use chrono::{NaiveDate, NaiveDateTime};

use ptref_model::disruption::{Disruption, Effect, Impact, ImpactId, PtObjRef, Severity};
use ptref_model::entities::OdtLevel;
use ptref_model::period::{ProductionPeriod, TimePeriod, ValidityPattern};
use ptref_model::{Coord, Dataset, DatasetBuilder, Idx};
use ptref_reports::{traffic_reports, Report};

use ptref_engine::QueryError;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, m, d).unwrap()
}

fn dt(m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(m, d).and_hms_opt(h, 0, 0).unwrap()
}

fn now() -> NaiveDateTime {
    dt(6, 15, 12)
}

fn june_publication() -> TimePeriod {
    TimePeriod::new(dt(6, 1, 0), dt(7, 1, 0))
}

fn impact(
    uri: &str,
    priority: Option<i32>,
    effect: Effect,
    publication: TimePeriod,
    informed: Vec<PtObjRef>,
) -> Impact {
    Impact {
        uri: uri.into(),
        disruption: Disruption { uri: format!("disruption:{uri}"), publication_period: publication },
        severity: Severity { name: "severity".into(), priority, effect },
        application_periods: vec![TimePeriod::new(dt(6, 1, 0), dt(7, 1, 0))],
        informed_entities: informed,
    }
}

struct Fixture {
    data: Dataset,
    n1: Idx,
    n2: Idx,
    l1: Idx,
    l2: Idx,
    vj1: Idx,
    sa1: Idx,
    sa2: Idx,
}

/// N1 owns L1 (route R1 over SA1-SA2) and L2; N2 owns L3; N3 is empty of
/// disruptions and lines. Impacts:
///
/// - i0 network N1 (priority 5)
/// - i1 line L2 (priority 3)
/// - i2 route R1 (priority 1, shows under L1)
/// - i3 stop area SA1 (priority 2)
/// - i4 stop point SP2 (priority 2, shows under SA2)
/// - i5 trip of VJ1, NoService (priority 0; line L1 via R1 and the VJ group)
/// - i6 line L1 but published in July only (hidden at `now`)
/// - i7 trip of VJ2, ReducedService, no priority (line L2 via R2, never a
///   VJ entry)
/// - i8 network N2 (priority 9)
fn fixture() -> Fixture {
    let mut b = DatasetBuilder::new(ProductionPeriod::new(date(1, 1), date(12, 31)));

    let n1 = b.add_network("network:N1", "Metro", 0);
    let n2 = b.add_network("network:N2", "Rail", 1);
    b.add_network("network:N3", "Ferry", 2);

    let l1 = b.add_line("line:L1", "Alpha", "1", 0, n1, OdtLevel::Scheduled);
    let l2 = b.add_line("line:L2", "Beta", "2", 0, n1, OdtLevel::Scheduled);
    let l3 = b.add_line("line:L3", "Gamma", "3", 0, n2, OdtLevel::Scheduled);

    let r1 = b.add_route("route:R1", "R1", l1);
    let r2 = b.add_route("route:R2", "R2", l2);
    let r3 = b.add_route("route:R3", "R3", l3);

    let sa1 = b.add_stop_area("stop_area:SA1", "Opera", Coord::new(2.35, 48.85));
    let sa2 = b.add_stop_area("stop_area:SA2", "Chatelet", Coord::new(2.36, 48.86));
    let sa3 = b.add_stop_area("stop_area:SA3", "Harbor", Coord::new(2.50, 48.90));

    let sp1 = b.add_stop_point("stop_point:SP1", "Opera A", sa1, Coord::new(2.35, 48.85));
    let sp2 = b.add_stop_point("stop_point:SP2", "Chatelet A", sa2, Coord::new(2.36, 48.86));
    let sp3 = b.add_stop_point("stop_point:SP3", "Harbor A", sa3, Coord::new(2.50, 48.90));

    let jp1 = b.add_journey_pattern("journey_pattern:JP1", r1, &[sp1, sp2]);
    let jp2 = b.add_journey_pattern("journey_pattern:JP2", r2, &[sp1]);
    let jp3 = b.add_journey_pattern("journey_pattern:JP3", r3, &[sp3]);

    let validity = ValidityPattern::from_dates(date(1, 1), &[date(6, 15)]);
    let vj1 = b.add_vehicle_journey("vehicle_journey:VJ1", "VJ1", jp1, &[], validity.clone(), vec![3600]);
    let vj2 = b.add_vehicle_journey("vehicle_journey:VJ2", "VJ2", jp2, &[], validity.clone(), vec![7200]);
    b.add_vehicle_journey("vehicle_journey:VJ3", "VJ3", jp3, &[], validity, vec![9000]);

    let m1 = b.add_meta_vehicle_journey("trip:VJ1", &[vj1]);
    let m2 = b.add_meta_vehicle_journey("trip:VJ2", &[vj2]);

    b.add_impact(impact("i0", Some(5), Effect::OtherEffect, june_publication(), vec![PtObjRef::Network(n1)]));
    b.add_impact(impact("i1", Some(3), Effect::OtherEffect, june_publication(), vec![PtObjRef::Line(l2)]));
    b.add_impact(impact("i2", Some(1), Effect::ReducedService, june_publication(), vec![PtObjRef::Route(r1)]));
    b.add_impact(impact("i3", Some(2), Effect::OtherEffect, june_publication(), vec![PtObjRef::StopArea(sa1)]));
    b.add_impact(impact("i4", Some(2), Effect::OtherEffect, june_publication(), vec![PtObjRef::StopPoint(sp2)]));
    b.add_impact(impact(
        "i5",
        Some(0),
        Effect::NoService,
        june_publication(),
        vec![PtObjRef::MetaVehicleJourney(m1)],
    ));
    b.add_impact(impact(
        "i6",
        Some(1),
        Effect::OtherEffect,
        TimePeriod::new(dt(7, 1, 0), dt(8, 1, 0)),
        vec![PtObjRef::Line(l1)],
    ));
    b.add_impact(impact(
        "i7",
        None,
        Effect::ReducedService,
        june_publication(),
        vec![PtObjRef::MetaVehicleJourney(m2)],
    ));
    b.add_impact(impact("i8", Some(9), Effect::OtherEffect, june_publication(), vec![PtObjRef::Network(n2)]));

    Fixture { data: b.finalize(), n1, n2, l1, l2, vj1, sa1, sa2 }
}

fn report(data: &Dataset, filter: &str) -> Report {
    traffic_reports(data, now(), 1, 10, 0, filter, &[]).unwrap()
}

fn impact_uris(set: &ptref_model::disruption::ImpactSet) -> Vec<String> {
    set.iter().map(|(_, impact)| impact.uri.clone()).collect()
}

// ── Grouping ────────────────────────────────────────────────────────────

#[test]
fn networks_without_publishable_impacts_are_absent() {
    let f = fixture();
    let report = report(&f.data, "");
    assert_eq!(report.total, 2);
    let networks: Vec<Idx> = report.networks.iter().map(|d| d.network).collect();
    assert_eq!(networks, vec![f.n1, f.n2], "N3 carries nothing");
}

#[test]
fn network_level_messages_are_collected() {
    let f = fixture();
    let report = report(&f.data, "");
    assert_eq!(impact_uris(&report.networks[0].network_disruptions), vec!["i0"]);
    assert_eq!(impact_uris(&report.networks[1].network_disruptions), vec!["i8"]);
}

#[test]
fn line_messages_merge_line_and_route_impacts() {
    let f = fixture();
    let report = report(&f.data, "");
    let n1 = &report.networks[0];
    let l1_entry = n1.lines.iter().find(|(line, _)| *line == f.l1).unwrap();
    assert_eq!(impact_uris(&l1_entry.1), vec!["i2", "i5"], "route impact plus trip impact");
    let l2_entry = n1.lines.iter().find(|(line, _)| *line == f.l2).unwrap();
    assert_eq!(impact_uris(&l2_entry.1), vec!["i1", "i7"]);
}

#[test]
fn expired_publication_windows_hide_impacts() {
    let f = fixture();
    let report = report(&f.data, "");
    for (_, set) in &report.networks[0].lines {
        assert!(!impact_uris(set).contains(&"i6".to_string()));
    }
}

#[test]
fn stop_area_messages_merge_stop_point_impacts() {
    let f = fixture();
    let report = report(&f.data, "");
    let n1 = &report.networks[0];
    let sa1_entry = n1.stop_areas.iter().find(|(sa, _)| *sa == f.sa1).unwrap();
    assert_eq!(impact_uris(&sa1_entry.1), vec!["i3"]);
    let sa2_entry = n1.stop_areas.iter().find(|(sa, _)| *sa == f.sa2).unwrap();
    assert_eq!(impact_uris(&sa2_entry.1), vec!["i4"], "inherited from its stop point");
}

#[test]
fn vehicle_journeys_keep_publishable_no_service_only() {
    let f = fixture();
    let report = report(&f.data, "");
    let n1 = &report.networks[0];
    assert_eq!(n1.vehicle_journeys.len(), 1, "VJ2's impact is ReducedService");
    let (vj, set) = &n1.vehicle_journeys[0];
    assert_eq!(*vj, f.vj1);
    assert_eq!(impact_uris(set), vec!["i5"]);
}

#[test]
fn lines_sort_by_min_priority_then_code() {
    let f = fixture();
    let report = report(&f.data, "");
    let lines: Vec<Idx> = report.networks[0].lines.iter().map(|(line, _)| *line).collect();
    // L1's best priority is 0 (i5), L2's is 3 (i1; i7 has none).
    assert_eq!(lines, vec![f.l1, f.l2]);
}

// ── The single-impact scenario ──────────────────────────────────────────

#[test]
fn one_no_service_trip_impact_reports_line_and_vehicle_journey() {
    let mut b = DatasetBuilder::new(ProductionPeriod::new(date(1, 1), date(12, 31)));
    let n1 = b.add_network("network:N1", "Metro", 0);
    let l1 = b.add_line("line:L1", "Alpha", "1", 0, n1, OdtLevel::Scheduled);
    let r1 = b.add_route("route:R1", "R1", l1);
    let sa = b.add_stop_area("stop_area:SA1", "Opera", Coord::new(2.35, 48.85));
    let sp = b.add_stop_point("stop_point:SP1", "Opera A", sa, Coord::new(2.35, 48.85));
    let jp = b.add_journey_pattern("journey_pattern:JP1", r1, &[sp]);
    let vj = b.add_vehicle_journey(
        "vehicle_journey:V1",
        "V1",
        jp,
        &[],
        ValidityPattern::from_dates(date(1, 1), &[date(6, 15)]),
        vec![3600],
    );
    let meta = b.add_meta_vehicle_journey("trip:V1", &[vj]);
    b.add_impact(impact(
        "i_no_service",
        Some(0),
        Effect::NoService,
        june_publication(),
        vec![PtObjRef::MetaVehicleJourney(meta)],
    ));
    let data = b.finalize();

    let report = traffic_reports(&data, now(), 1, 10, 0, "network.uri=\"network:N1\"", &[]).unwrap();

    assert_eq!(report.total, 1);
    let disrupt = &report.networks[0];
    assert_eq!(disrupt.network, n1);
    assert!(disrupt.network_disruptions.is_empty());
    assert_eq!(disrupt.lines.len(), 1);
    assert_eq!(disrupt.lines[0].0, l1);
    assert_eq!(impact_uris(&disrupt.lines[0].1), vec!["i_no_service"]);
    assert_eq!(disrupt.vehicle_journeys.len(), 1);
    assert_eq!(disrupt.vehicle_journeys[0].0, vj);
    assert_eq!(impact_uris(&disrupt.vehicle_journeys[0].1), vec!["i_no_service"]);
    assert!(disrupt.stop_areas.is_empty());
}

// ── Filters, recovery and pagination ────────────────────────────────────

#[test]
fn filter_restricts_the_report_to_matching_networks() {
    let f = fixture();
    let report = report(&f.data, "network.uri=network:N2");
    assert_eq!(report.total, 1);
    assert_eq!(report.networks[0].network, f.n2);
    assert!(report.networks[0].lines.is_empty());
}

#[test]
fn empty_store_short_circuits_even_with_a_bad_filter() {
    let mut b = DatasetBuilder::new(ProductionPeriod::new(date(1, 1), date(12, 31)));
    b.add_network("network:N1", "Metro", 0);
    let data = b.finalize();

    let report = traffic_reports(&data, now(), 1, 10, 0, "@@@", &[]).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.networks.is_empty());
}

#[test]
fn unparsable_filter_surfaces_from_the_network_query() {
    let f = fixture();
    let err = traffic_reports(&f.data, now(), 1, 10, 0, "@@@", &[]).unwrap_err();
    assert!(matches!(err, QueryError::GlobalParse(_)));
}

#[test]
fn discarded_impacts_vanish_from_the_report() {
    let mut f = fixture();
    // i5 is slot 5.
    f.data.impacts.discard(ImpactId(5));
    let report = report(&f.data, "");
    let n1 = &report.networks[0];
    assert!(n1.vehicle_journeys.is_empty());
    let l1_entry = n1.lines.iter().find(|(line, _)| *line == f.l1).unwrap();
    assert_eq!(impact_uris(&l1_entry.1), vec!["i2"]);
}

#[test]
fn forbidden_uri_drops_a_whole_network_group() {
    let f = fixture();
    let report =
        traffic_reports(&f.data, now(), 1, 10, 0, "", &["network:N1".to_string()]).unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.networks[0].network, f.n2);
}

#[test]
fn pagination_slices_the_sorted_groups() {
    let f = fixture();
    let page0 = traffic_reports(&f.data, now(), 1, 1, 0, "", &[]).unwrap();
    assert_eq!(page0.total, 2);
    assert_eq!(page0.networks.len(), 1);
    assert_eq!(page0.networks[0].network, f.n1);

    let page1 = traffic_reports(&f.data, now(), 1, 1, 1, "", &[]).unwrap();
    assert_eq!(page1.total, 2);
    assert_eq!(page1.networks[0].network, f.n2);

    let page2 = traffic_reports(&f.data, now(), 1, 1, 2, "", &[]).unwrap();
    assert_eq!(page2.total, 2);
    assert!(page2.networks.is_empty());
}

#[test]
fn nothing_publishable_yields_an_empty_report() {
    let f = fixture();
    // Midnight of 2019-01-01 predates every publication window.
    let report = traffic_reports(&f.data, dt(1, 1, 0), 1, 10, 0, "", &[]).unwrap();
    assert_eq!(report.total, 0);
}
