//! Healthcare resource directory server.
//!
//! Keeps a directory of healthcare providers clean of duplicate records,
//! and answers "which bus gets me from here to that clinic?" from a static
//! transit schedule.

pub mod config;
pub mod dedup;
pub mod domain;
pub mod store;
pub mod transit;
pub mod web;
