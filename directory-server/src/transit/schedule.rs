//! Static schedule tables loaded from a GTFS directory.
//!
//! Only the four tables the matcher needs are read: `stops.txt`,
//! `routes.txt`, `trips.txt` and `stop_times.txt`. Columns are matched by
//! header name, so column order and extra columns don't matter.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::Coordinate;

/// Errors loading the schedule. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A required file is absent from the dataset directory
    #[error("missing schedule file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A file exists but could not be opened
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed (wrong field count, missing column, ...)
    #[error("malformed row in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// A boarding location with a usable position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub location: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_url: Option<String>,
}

impl Route {
    /// Long name, else short name, else the id.
    pub fn display_name(&self) -> &str {
        self.route_long_name
            .as_deref()
            .or(self.route_short_name.as_deref())
            .unwrap_or(&self.route_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
}

/// One visit of a trip to a stop. Sequence within the trip is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
}

/// The four schedule tables, as loaded.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,

    /// Stops dropped for missing or invalid coordinates.
    pub skipped_stops: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StopRow {
    stop_id: String,
    #[serde(default)]
    stop_name: Option<String>,
    #[serde(default)]
    stop_lat: Option<String>,
    #[serde(default)]
    stop_lon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteRow {
    route_id: String,
    #[serde(default)]
    route_short_name: Option<String>,
    #[serde(default)]
    route_long_name: Option<String>,
    #[serde(default)]
    route_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripRow {
    route_id: String,
    trip_id: String,
}

#[derive(Debug, Deserialize)]
struct StopTimeRow {
    trip_id: String,
    stop_id: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_coordinate(lat: Option<&str>, lon: Option<&str>) -> Option<Coordinate> {
    let lat = lat?.trim().parse::<f64>().ok()?;
    let lon = lon?.trim().parse::<f64>().ok()?;
    Coordinate::new(lat, lon).ok()
}

/// Read every row of one table.
fn read_table<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    file: &'static str,
) -> Result<Vec<T>, ScheduleError> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(ScheduleError::MissingFile(path));
    }
    let handle = File::open(&path).map_err(|source| ScheduleError::Io {
        path: path.clone(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(handle);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| ScheduleError::Csv { file, source })
}

impl Schedule {
    /// Load the dataset from a directory of GTFS text files.
    pub fn load(dir: &Path) -> Result<Self, ScheduleError> {
        let stop_rows: Vec<StopRow> = read_table(dir, "stops.txt")?;
        let route_rows: Vec<RouteRow> = read_table(dir, "routes.txt")?;
        let trip_rows: Vec<TripRow> = read_table(dir, "trips.txt")?;
        let stop_time_rows: Vec<StopTimeRow> = read_table(dir, "stop_times.txt")?;

        let mut schedule = Schedule::default();

        for row in stop_rows {
            match parse_coordinate(row.stop_lat.as_deref(), row.stop_lon.as_deref()) {
                Some(location) => schedule.stops.push(Stop {
                    stop_name: non_empty(row.stop_name).unwrap_or_else(|| row.stop_id.clone()),
                    stop_id: row.stop_id,
                    location,
                }),
                None => schedule.skipped_stops.push(row.stop_id),
            }
        }

        schedule.routes = route_rows
            .into_iter()
            .map(|row| Route {
                route_id: row.route_id,
                route_short_name: non_empty(row.route_short_name),
                route_long_name: non_empty(row.route_long_name),
                route_url: non_empty(row.route_url),
            })
            .collect();

        schedule.trips = trip_rows
            .into_iter()
            .map(|row| Trip {
                trip_id: row.trip_id,
                route_id: row.route_id,
            })
            .collect();

        schedule.stop_times = stop_time_rows
            .into_iter()
            .map(|row| StopTime {
                trip_id: row.trip_id,
                stop_id: row.stop_id,
            })
            .collect();

        if !schedule.skipped_stops.is_empty() {
            warn!(
                count = schedule.skipped_stops.len(),
                "skipped stops without usable coordinates"
            );
        }
        info!(
            dir = %dir.display(),
            stops = schedule.stops.len(),
            routes = schedule.routes.len(),
            trips = schedule.trips.len(),
            stop_times = schedule.stop_times.len(),
            "loaded transit schedule"
        );

        Ok(schedule)
    }
}
