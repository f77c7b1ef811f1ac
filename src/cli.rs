//! CLI interface for Tripid.
//!
//! Each subcommand is non-interactive: arguments in, plain output out.
//! Notices go to stderr, results to stdout.
//!
//! - `tripid track [FEED]` records one trip from a JSON-lines position feed.
//! - `tripid trip list|show|delete|export` works on the saved history.
//! - `tripid insights` asks for fuel consumption estimates.
//! - `tripid clear --yes` wipes everything.
//!
//! Trip ids take the full id or an unambiguous prefix (e.g. `2024-03-09T14`).

mod format;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::clock::SystemClock;
use crate::config::Config;
use crate::export;
use crate::insights::{self, GeminiClient, InsightsClient, InsightsError};
use crate::model::{Notice, Trip};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::position::{FeedSource, NoPositionSource, PositionSource};
use crate::storage::{KeyValueStore, TripHistory};
use crate::tracker::{StopOutcome, Tracker, TrackerEvent};

use format::{format_distance, format_duration, format_progress, format_trip_details, format_trip_row};

/// Tripid: record car trips and review them.
#[derive(Debug, Parser)]
#[command(name = "tripid", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r#"Recording a trip:
  gps-logger --json | tripid track
  tripid track drive.jsonl

Each feed line is one fix:
  {"latitude": 55.6761, "longitude": 12.5683, "speed": 13.4, "timestamp": 1709993110000}

Reviewing:
  tripid trip list
  tripid trip show 2024-03-09
  tripid trip export --out trips.geojson"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a trip from a position feed until the feed ends.
    ///
    /// Progress is printed to stderr. The saved trip id is printed to stdout.
    Track {
        /// JSON-lines feed of position fixes. Reads stdin when omitted or `-`.
        feed: Option<PathBuf>,
    },

    /// Work with saved trips.
    Trip {
        #[command(subcommand)]
        command: TripCommand,
    },

    /// Estimate fuel consumption over the trip history.
    Insights {
        /// Fuel efficiency of the car in km per liter. Defaults to the configured value.
        #[arg(long)]
        efficiency: Option<f64>,
    },

    /// Delete all stored trip data.
    Clear {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TripCommand {
    /// List saved trips, most recent first.
    List,

    /// Show one trip.
    Show {
        /// Trip id or unambiguous prefix.
        id: String,
    },

    /// Delete one trip.
    Delete {
        /// Trip id or unambiguous prefix.
        id: String,
    },

    /// Export trips as GeoJSON.
    ///
    /// One trip becomes a Feature, the whole history a FeatureCollection.
    Export {
        /// Trip id or unambiguous prefix. Exports every trip when omitted.
        id: Option<String>,

        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, store: Box<dyn KeyValueStore>) -> Result<(), String> {
    let cli = Cli::parse();
    let history = TripHistory::new(store);

    match cli.command {
        Command::Track { feed } => cmd_track(config, history, feed.as_deref()),
        Command::Trip { command } => match command {
            TripCommand::List => cmd_list(&history),
            TripCommand::Show { id } => cmd_show(&history, &id),
            TripCommand::Delete { id } => cmd_delete(config, history, &id),
            TripCommand::Export { id, out } => cmd_export(&history, id.as_deref(), out.as_deref()),
        },
        Command::Insights { efficiency } => cmd_insights(config, &history, efficiency),
        Command::Clear { yes } => cmd_clear(&history, yes),
    }
}

fn tracker<S: PositionSource, K: KeyValueStore>(
    config: &Config,
    source: S,
    history: TripHistory<K>,
) -> Result<Tracker<S, K>, String> {
    Ok(Tracker::new(
        source,
        history,
        Box::new(ConsoleNotifier),
        Box::new(SystemClock),
        config.tracker_settings()?,
    ))
}

fn cmd_track<K: KeyValueStore>(
    config: &Config,
    history: TripHistory<K>,
    feed: Option<&Path>,
) -> Result<(), String> {
    let source = match feed {
        None => FeedSource::new(BufReader::new(io::stdin())),
        Some(path) if path == Path::new("-") => FeedSource::new(BufReader::new(io::stdin())),
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("failed to open {}: {e}", path.display()))?;
            FeedSource::new(BufReader::new(file))
        }
    };

    let mut tracker = tracker(config, source, history)?;
    tracker.on_change(|event| {
        if let Some(line) = describe_event(event) {
            eprintln!("{line}");
        }
    });

    tracker.start().map_err(|e| format!("could not start trip: {e}"))?;

    // A trip with no fixes is dropped; the tracker has already said so.
    if let StopOutcome::Saved(id) = tracker.follow() {
        if let Some(fix) = tracker.current_position() {
            eprintln!("Last fix: {:.5}, {:.5}", fix.latitude, fix.longitude);
        }
        println!("{id}");
    }
    Ok(())
}

/// Progress line for a tracker event, if it warrants one.
fn describe_event(event: &TrackerEvent<'_>) -> Option<String> {
    match event {
        TrackerEvent::Started(trip) => Some(format!("Recording {}", trip.name)),
        TrackerEvent::Moved { trip, position } => {
            Some(format_progress(trip, position.speed_kmh()))
        }
        TrackerEvent::Ended(trip) => Some(format!(
            "{}  {} in {}",
            trip.name,
            format_distance(trip.distance),
            format_duration(trip.duration_ms())
        )),
        TrackerEvent::Deleted(id) => Some(format!("Deleted {id}")),
        TrackerEvent::Cancelled => None,
    }
}

fn cmd_list<K: KeyValueStore>(history: &TripHistory<K>) -> Result<(), String> {
    let trips = history.load();

    if trips.is_empty() {
        println!("No trips");
        return Ok(());
    }

    for trip in &trips {
        println!("{}", format_trip_row(trip));
    }

    Ok(())
}

fn cmd_show<K: KeyValueStore>(history: &TripHistory<K>, reference: &str) -> Result<(), String> {
    let trips = history.load();
    let trip = resolve_trip(&trips, reference)?;
    println!("{}", format_trip_details(trip));
    Ok(())
}

fn cmd_delete<K: KeyValueStore>(
    config: &Config,
    history: TripHistory<K>,
    reference: &str,
) -> Result<(), String> {
    let mut tracker = tracker(config, NoPositionSource, history)?;
    let id = resolve_trip(tracker.history(), reference)?.id.clone();
    tracker.on_change(|event| {
        if let TrackerEvent::Deleted(id) = event {
            println!("{id}");
        }
    });
    tracker.delete_trip(&id);
    Ok(())
}

fn cmd_export<K: KeyValueStore>(
    history: &TripHistory<K>,
    reference: Option<&str>,
    out: Option<&Path>,
) -> Result<(), String> {
    let trips = history.load();

    let json = match reference {
        Some(reference) => {
            let trip = resolve_trip(&trips, reference)?;
            serde_json::to_string_pretty(&export::trip_feature(trip))
        }
        None => serde_json::to_string_pretty(&export::history_collection(&trips)),
    }
    .map_err(|e| format!("failed to serialize GeoJSON: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Exported {} → {}", export_summary(reference, trips.len()), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn export_summary(reference: Option<&str>, total: usize) -> String {
    match reference {
        Some(_) => "1 trip".to_string(),
        None if total == 1 => "1 trip".to_string(),
        None => format!("{total} trips"),
    }
}

fn cmd_insights<K: KeyValueStore>(
    config: &Config,
    history: &TripHistory<K>,
    efficiency: Option<f64>,
) -> Result<(), String> {
    let notifier = ConsoleNotifier;
    let trips = history.load();
    let efficiency = efficiency.unwrap_or(config.fuel_efficiency_km_per_liter);

    let request = match insights::request_for(&trips, efficiency) {
        Ok(request) => request,
        Err(e @ InsightsError::NoTrips) => {
            notifier.notify(Notice::error("No trip data").with_description(e.to_string()));
            return Err(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    let result = GeminiClient::from_env(
        &config.insights.endpoint,
        &config.insights.model,
        &config.insights.api_key_env,
    )
    .and_then(|client| client.fuel_insights(&request));

    match result {
        Ok(answer) => {
            println!(
                "Estimated fuel consumption: {:.2} L",
                answer.estimated_fuel_consumption_liters
            );
            println!();
            println!("{}", answer.driving_style_insights);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "fuel insights failed");
            notifier.notify(
                Notice::error("Failed to get insights. Please try again.")
                    .with_description(e.to_string()),
            );
            Err("fuel insights unavailable".to_string())
        }
    }
}

fn cmd_clear<K: KeyValueStore>(history: &TripHistory<K>, yes: bool) -> Result<(), String> {
    if !yes {
        return Err("this deletes every saved trip; re-run with --yes to confirm".to_string());
    }

    history
        .clear_all()
        .map_err(|e| format!("failed to clear data: {e}"))?;

    ConsoleNotifier.notify(
        Notice::info("Data cleared!").with_description("All your trip data has been deleted."),
    );
    Ok(())
}

/// Resolve a trip reference (full id or unambiguous prefix) to a trip.
fn resolve_trip<'a>(trips: &'a [Trip], reference: &str) -> Result<&'a Trip, String> {
    if let Some(trip) = trips.iter().find(|t| t.id.as_str() == reference) {
        return Ok(trip);
    }

    let matches: Vec<&Trip> = trips
        .iter()
        .filter(|t| t.id.as_str().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no trip matching '{reference}'")),
        1 => Ok(matches[0]),
        n => {
            let ids: Vec<&str> = matches.iter().map(|t| t.id.as_str()).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} trips: {}",
                ids.join(", ")
            ))
        }
    }
}
