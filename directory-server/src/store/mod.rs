//! Persistent resource store.
//!
//! Resources and their one-to-many link tables live in SQLite. All
//! statements are parameterized; table and column names only ever come
//! from [`AssociationKind`].

mod error;
mod schema;
mod sqlite;

pub use error::StoreError;
pub use schema::AssociationKind;
pub use sqlite::{Database, Feedback, ResourceStore};
