//! Transit route matching over a static GTFS schedule.
//!
//! The schedule is loaded once at startup ([`Schedule::load`]), indexed
//! into an immutable [`ScheduleIndex`] and queried through a
//! [`TransitMatcher`].

mod config;
mod index;
mod matcher;
mod schedule;

pub use config::TransitConfig;
pub use index::ScheduleIndex;
pub use matcher::{TransitMatcher, TransitOption, rank_options};
pub use schedule::{Route, Schedule, ScheduleError, Stop, StopTime, Trip};
