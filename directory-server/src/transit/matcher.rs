//! Nearest-stop transit route matching.
//!
//! Answers "is there a single route I could take from near here to near
//! there?" A route qualifies when it serves some stop within walking
//! distance of the origin and some other stop within walking distance of
//! the destination. Direction and stop order along the route are not
//! checked; this is a proximity match, not itinerary planning.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::{Coordinate, round_hundredths};

use super::index::ScheduleIndex;
use super::schedule::{Route, Stop};

/// One way to ride a single route between the two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitOption {
    pub route_name: String,
    pub route_id: String,
    pub route_url: Option<String>,
    pub start_stop: String,
    pub start_stop_id: String,
    pub end_stop: String,
    pub end_stop_id: String,

    /// Origin to boarding stop, miles, two decimals.
    pub walk_to_start_miles: f64,

    /// Alighting stop to destination, miles, two decimals.
    pub walk_from_end_miles: f64,
}

impl TransitOption {
    pub fn total_walk_miles(&self) -> f64 {
        self.walk_to_start_miles + self.walk_from_end_miles
    }
}

/// A (start stop, end stop, route) triple with unrounded walk distances.
struct Candidate<'a> {
    start: &'a Stop,
    end: &'a Stop,
    route: &'a Route,
    walk_start: f64,
    walk_end: f64,
}

impl Candidate<'_> {
    fn total(&self) -> f64 {
        self.walk_start + self.walk_end
    }

    fn to_option(&self) -> TransitOption {
        TransitOption {
            route_name: self.route.display_name().to_string(),
            route_id: self.route.route_id.clone(),
            route_url: self.route.route_url.clone(),
            start_stop: self.start.stop_name.clone(),
            start_stop_id: self.start.stop_id.clone(),
            end_stop: self.end.stop_name.clone(),
            end_stop_id: self.end.stop_id.clone(),
            walk_to_start_miles: round_hundredths(self.walk_start),
            walk_from_end_miles: round_hundredths(self.walk_end),
        }
    }

    /// Ordering key among candidates for the same route.
    fn preference(&self) -> (f64, &str, &str) {
        (self.total(), &self.start.stop_id, &self.end.stop_id)
    }
}

/// Matches origin/destination pairs against the schedule index.
#[derive(Debug, Clone)]
pub struct TransitMatcher {
    index: Arc<ScheduleIndex>,
}

impl TransitMatcher {
    pub fn new(index: Arc<ScheduleIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &ScheduleIndex {
        &self.index
    }

    /// Every (start stop, end stop, route) triple where the route serves
    /// both stops and each stop is within `max_walk_miles` of its point.
    fn candidates(&self, start: &Coordinate, end: &Coordinate, max_walk_miles: f64) -> Vec<Candidate<'_>> {
        let starts = self.index.candidate_stops(start, max_walk_miles);
        if starts.is_empty() {
            return Vec::new();
        }
        let ends = self.index.candidate_stops(end, max_walk_miles);
        if ends.is_empty() {
            return Vec::new();
        }

        let end_routes: Vec<(&Stop, f64, Vec<&Route>)> = ends
            .into_iter()
            .map(|(stop, d)| (stop, d, self.index.routes_for_stop(&stop.stop_id)))
            .collect();

        let mut out = Vec::new();
        for (start_stop, walk_start) in starts {
            let start_routes = self.index.routes_for_stop(&start_stop.stop_id);
            if start_routes.is_empty() {
                continue;
            }
            for (end_stop, walk_end, routes_at_end) in &end_routes {
                for &route in &start_routes {
                    if routes_at_end.iter().any(|r| r.route_id == route.route_id) {
                        out.push(Candidate {
                            start: start_stop,
                            end: *end_stop,
                            route,
                            walk_start,
                            walk_end: *walk_end,
                        });
                    }
                }
            }
        }
        out
    }

    /// All matching triples, unfiltered.
    ///
    /// Includes triples where origin and destination share a stop.
    pub fn all_options(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        max_walk_miles: f64,
    ) -> Vec<TransitOption> {
        self.candidates(start, end, max_walk_miles)
            .iter()
            .map(Candidate::to_option)
            .collect()
    }

    /// Transit options between two points, one per route.
    ///
    /// For each route serving distinct stops near both points, the stop
    /// pair with the least combined walking is kept. Results are ordered by
    /// route id; use [`rank_options`] to order by walking distance.
    ///
    /// Invalid coordinates or a non-positive radius give an empty list,
    /// as does having no stops in range. None of these are errors.
    pub fn find_transit_routes(
        &self,
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        max_walk_miles: f64,
    ) -> Vec<TransitOption> {
        let (Ok(start), Ok(end)) = (
            Coordinate::new(start_lat, start_lon),
            Coordinate::new(end_lat, end_lon),
        ) else {
            debug!("transit request with invalid coordinates");
            return Vec::new();
        };

        let mut best: BTreeMap<&str, Candidate<'_>> = BTreeMap::new();
        for candidate in self.candidates(&start, &end, max_walk_miles) {
            if candidate.start.stop_id == candidate.end.stop_id {
                continue;
            }
            match best.entry(candidate.route.route_id.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if candidate.preference() < slot.get().preference() {
                        slot.insert(candidate);
                    }
                }
            }
        }

        debug!(routes = best.len(), max_walk_miles, "matched transit routes");
        best.values().map(Candidate::to_option).collect()
    }
}

/// Order options by combined walking distance, then route name.
pub fn rank_options(mut options: Vec<TransitOption>) -> Vec<TransitOption> {
    options.sort_by(|a, b| {
        a.total_walk_miles()
            .total_cmp(&b.total_walk_miles())
            .then_with(|| a.route_name.cmp(&b.route_name))
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    options
}
