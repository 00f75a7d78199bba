//! Web layer for the resource directory.
//!
//! Provides HTTP endpoints for managing resources, merging duplicates and
//! matching transit routes.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
