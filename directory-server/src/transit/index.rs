//! Immutable lookup structures over the loaded schedule.

use std::collections::{BTreeSet, HashMap};

use crate::domain::Coordinate;

use super::schedule::{Route, Schedule, Stop};

/// Stops and the routes serving each one.
///
/// Built once at startup and never mutated, so it can be shared across
/// request handlers behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    stops: Vec<Stop>,
    routes: HashMap<String, Route>,

    /// stop_id → route_ids serving it (stop_times → trips → routes).
    routes_by_stop: HashMap<String, BTreeSet<String>>,

    skipped_stops: usize,
}

impl ScheduleIndex {
    /// Join the schedule tables.
    ///
    /// Stop-times referencing unknown trips, and trips referencing unknown
    /// routes, contribute nothing.
    pub fn build(schedule: Schedule) -> Self {
        let routes: HashMap<String, Route> = schedule
            .routes
            .into_iter()
            .map(|r| (r.route_id.clone(), r))
            .collect();

        let route_of_trip: HashMap<&str, &str> = schedule
            .trips
            .iter()
            .filter(|t| routes.contains_key(&t.route_id))
            .map(|t| (t.trip_id.as_str(), t.route_id.as_str()))
            .collect();

        let mut routes_by_stop: HashMap<String, BTreeSet<String>> = HashMap::new();
        for st in &schedule.stop_times {
            if let Some(route_id) = route_of_trip.get(st.trip_id.as_str()) {
                routes_by_stop
                    .entry(st.stop_id.clone())
                    .or_default()
                    .insert((*route_id).to_string());
            }
        }

        Self {
            stops: schedule.stops,
            routes,
            routes_by_stop,
            skipped_stops: schedule.skipped_stops.len(),
        }
    }

    /// Stops within `max_walk_miles` of `origin`, with their distances.
    ///
    /// A linear scan; results keep dataset order.
    pub fn candidate_stops(&self, origin: &Coordinate, max_walk_miles: f64) -> Vec<(&Stop, f64)> {
        if max_walk_miles.is_nan() || max_walk_miles <= 0.0 {
            return Vec::new();
        }
        self.stops
            .iter()
            .map(|stop| (stop, origin.distance_miles(&stop.location)))
            .filter(|(_, d)| *d <= max_walk_miles)
            .collect()
    }

    /// Routes serving a stop, deduplicated and ordered by route id.
    pub fn routes_for_stop(&self, stop_id: &str) -> Vec<&Route> {
        self.routes_by_stop
            .get(stop_id)
            .map(|ids| ids.iter().filter_map(|id| self.routes.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.get(route_id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Stops excluded at load time for bad coordinates.
    pub fn skipped_stops(&self) -> usize {
        self.skipped_stops
    }
}
