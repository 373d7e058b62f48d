//! `ptrefq`: run PTRef queries and traffic reports against a JSON
//! dataset snapshot.
//!
//! ```text
//! ptrefq --dataset snapshot.json query --kind line --filter 'network.uri=network:N1'
//! ptrefq --dataset snapshot.json traffic-reports --now 2019-06-15T12:00:00
//! ```
//!
//! Engine warnings (ignored clauses, skipped sub-queries) go through the
//! `log` facade; set `RUST_LOG=warn` to see them.

mod input;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use ptref_engine::make_query;
use ptref_model::entities::OdtLevel;
use ptref_model::{Dataset, Idx, ObjectKind};
use ptref_reports::{traffic_reports, Report};

#[derive(Parser)]
#[command(name = "ptrefq", about = "Query a transit referential snapshot", version)]
struct Cli {
    /// Path to the JSON dataset snapshot.
    #[arg(long)]
    dataset: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a referential query and print the matching objects.
    Query {
        /// Kind of object to return (network, line, stop_area, ...).
        #[arg(long)]
        kind: String,
        /// Filter expression, e.g. 'line.code=7 and network.uri=n1'.
        #[arg(long, default_value = "")]
        filter: String,
        /// URIs excluded from the result; repeatable.
        #[arg(long = "forbidden")]
        forbidden_uris: Vec<String>,
        /// Restrict lines to an on-demand-transport level.
        #[arg(long, default_value = "all")]
        odt: OdtLevel,
        /// Start of the validity window (e.g. 2019-06-01T00:00:00).
        #[arg(long)]
        since: Option<NaiveDateTime>,
        /// End of the validity window.
        #[arg(long)]
        until: Option<NaiveDateTime>,
    },
    /// Group the currently publishable disruptions by network.
    TrafficReports {
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long = "forbidden")]
        forbidden_uris: Vec<String>,
        /// Report instant; defaults to the current local time.
        #[arg(long)]
        now: Option<NaiveDateTime>,
        /// Page size.
        #[arg(long, default_value_t = 10)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Serialization depth annotation.
        #[arg(long, default_value_t = 1)]
        depth: usize,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(&cli.dataset)?;
    let document: input::DatasetInput = serde_json::from_str(&text)?;
    let data = input::build(document)?;

    match cli.command {
        Command::Query { kind, filter, forbidden_uris, odt, since, until } => {
            let kind = ObjectKind::from_caption(&kind)
                .ok_or_else(|| format!("unknown object kind: {kind}"))?;
            let result = make_query(kind, &filter, &forbidden_uris, odt, since, until, &data)?;
            for idx in result {
                let (uri, name) = describe(&data, kind, idx);
                println!("{uri}\t{name}");
            }
        }
        Command::TrafficReports { filter, forbidden_uris, now, count, page, depth } => {
            let now = now.unwrap_or_else(|| chrono::Local::now().naive_local());
            let report =
                traffic_reports(&data, now, depth, count, page, &filter, &forbidden_uris)?;
            print_report(&data, &report);
        }
    }
    Ok(())
}

/// URI and display name of one query result.
fn describe(data: &Dataset, kind: ObjectKind, idx: Idx) -> (String, String) {
    use ObjectKind::*;
    let i = idx as usize;
    match kind {
        Network => (data.networks[i].uri.clone(), data.networks[i].name.clone()),
        Line => (data.lines[i].uri.clone(), data.lines[i].name.clone()),
        Route => (data.routes[i].uri.clone(), data.routes[i].name.clone()),
        StopArea => (data.stop_areas[i].uri.clone(), data.stop_areas[i].name.clone()),
        StopPoint => (data.stop_points[i].uri.clone(), data.stop_points[i].name.clone()),
        VehicleJourney => {
            (data.vehicle_journeys[i].uri.clone(), data.vehicle_journeys[i].name.clone())
        }
        MetaVehicleJourney => (data.meta_vjs[i].uri.clone(), String::new()),
        JourneyPattern => (data.journey_patterns[i].uri.clone(), String::new()),
        JourneyPatternPoint => (data.journey_pattern_points[i].uri.clone(), String::new()),
        Connection => (data.connections[i].uri.clone(), String::new()),
        Poi => (data.pois[i].uri.clone(), data.pois[i].name.clone()),
        PoiType => (data.poi_types[i].uri.clone(), data.poi_types[i].name.clone()),
        Calendar => (data.calendars[i].uri.clone(), data.calendars[i].name.clone()),
        Impact => match data.impacts.get(ptref_model::disruption::ImpactId(idx)) {
            Some(impact) => (impact.uri.clone(), impact.severity.name.clone()),
            None => (format!("impact#{idx}"), "<discarded>".to_string()),
        },
        Unknown => (format!("unknown#{idx}"), String::new()),
    }
}

fn print_report(data: &Dataset, report: &Report) {
    println!("{} disrupted network(s)", report.total);
    for disrupt in &report.networks {
        let network = &data.networks[disrupt.network as usize];
        println!("network {} ({})", network.name, network.uri);
        for (_, impact) in disrupt.network_disruptions.iter() {
            println!("  ! {} [{}]", impact.uri, impact.severity.name);
        }
        for (line, impacts) in &disrupt.lines {
            let line = &data.lines[*line as usize];
            println!("  line {} {} ({})", line.code, line.name, line.uri);
            for (_, impact) in impacts.iter() {
                println!("    ! {} [{}]", impact.uri, impact.severity.name);
            }
        }
        for (stop_area, impacts) in &disrupt.stop_areas {
            let stop_area = &data.stop_areas[*stop_area as usize];
            println!("  stop area {} ({})", stop_area.name, stop_area.uri);
            for (_, impact) in impacts.iter() {
                println!("    ! {} [{}]", impact.uri, impact.severity.name);
            }
        }
        for (vehicle_journey, impacts) in &disrupt.vehicle_journeys {
            let vehicle_journey = &data.vehicle_journeys[*vehicle_journey as usize];
            println!("  vehicle journey {} ({})", vehicle_journey.name, vehicle_journey.uri);
            for (_, impact) in impacts.iter() {
                println!("    ! {} [{}]", impact.uri, impact.severity.name);
            }
        }
    }
}
