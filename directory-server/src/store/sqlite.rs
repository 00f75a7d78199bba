//! SQLite-backed resource store.
//!
//! [`ResourceStore`] is implemented for [`rusqlite::Connection`]. A
//! [`rusqlite::Transaction`] derefs to a connection, so the same calls run
//! inside a caller-controlled transaction unchanged.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use serde::Serialize;
use tracing::debug;

use crate::domain::{NewResource, Resource, ResourceId, ResourceUpdate};

use super::error::StoreError;
use super::schema::{AssociationKind, RESOURCE_COLUMNS, SCHEMA};

/// A piece of user feedback attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub resource_id: ResourceId,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Storage operations over resources and their link tables.
///
/// Implementations do not open transactions themselves; callers decide the
/// atomicity boundary.
pub trait ResourceStore {
    /// All resources, ordered by id.
    fn fetch_all_resources(&self) -> Result<Vec<Resource>, StoreError>;

    /// A single resource, or [`StoreError::NotFound`].
    fn fetch_resource(&self, id: ResourceId) -> Result<Resource, StoreError>;

    /// Insert a new resource and return its freshly assigned id.
    fn insert_resource(
        &self,
        new: &NewResource,
        now: DateTime<Utc>,
    ) -> Result<ResourceId, StoreError>;

    /// Apply a partial edit and return the updated record.
    fn update_resource(
        &self,
        id: ResourceId,
        update: &ResourceUpdate,
        now: DateTime<Utc>,
    ) -> Result<Resource, StoreError>;

    /// Persist the fields a merge may change on a surviving record.
    fn save_merged(&self, resource: &Resource) -> Result<(), StoreError>;

    /// Delete a resource row. Fails if link or feedback rows still reference it.
    fn delete_resource(&self, id: ResourceId) -> Result<(), StoreError>;

    /// Linked entity ids for one resource, ascending.
    fn associations(&self, kind: AssociationKind, id: ResourceId)
    -> Result<Vec<i64>, StoreError>;

    /// Link an entity, ignoring the insert if the pair already exists.
    ///
    /// Returns `true` when a row was written.
    fn insert_association(
        &self,
        kind: AssociationKind,
        id: ResourceId,
        other: i64,
    ) -> Result<bool, StoreError>;

    /// Remove every link of this kind from a resource. Returns rows removed.
    fn delete_associations(&self, kind: AssociationKind, id: ResourceId)
    -> Result<usize, StoreError>;

    fn add_feedback(
        &self,
        id: ResourceId,
        rating: Option<i64>,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    fn feedback_for(&self, id: ResourceId) -> Result<Vec<Feedback>, StoreError>;

    /// Remove all feedback attached to a resource. Returns rows removed.
    fn delete_feedback(&self, id: ResourceId) -> Result<usize, StoreError>;
}

fn resource_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ResourceId> {
    let raw: i64 = row.get(idx)?;
    ResourceId::new(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: resource_id_at(row, 0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        address_line1: row.get(3)?,
        address_line2: row.get(4)?,
        city: row.get(5)?,
        state: row.get(6)?,
        zip: row.get(7)?,
        phone: row.get(8)?,
        website: row.get(9)?,
        hours: row.get(10)?,
        latitude: row.get(11)?,
        longitude: row.get(12)?,
        accepts_uninsured: row.get(13)?,
        sliding_scale: row.get(14)?,
        free_care_available: row.get(15)?,
        notes: row.get(16)?,
        resource_type_id: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

impl ResourceStore for Connection {
    fn fetch_all_resources(&self) -> Result<Vec<Resource>, StoreError> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY id");
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt.query_map([], resource_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn fetch_resource(&self, id: ResourceId) -> Result<Resource, StoreError> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?1");
        self.query_row(&sql, params![id.get()], resource_from_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    fn insert_resource(
        &self,
        new: &NewResource,
        now: DateTime<Utc>,
    ) -> Result<ResourceId, StoreError> {
        self.execute(
            "INSERT INTO resources (
                name, display_name, address_line1, address_line2, city, state, zip,
                phone, website, hours, latitude, longitude,
                accepts_uninsured, sliding_scale, free_care_available,
                notes, resource_type_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)",
            params![
                new.name,
                new.display_name,
                new.address_line1,
                new.address_line2,
                new.city,
                new.state,
                new.zip,
                new.phone,
                new.website,
                new.hours,
                new.latitude,
                new.longitude,
                new.accepts_uninsured,
                new.sliding_scale,
                new.free_care_available,
                new.notes,
                new.resource_type_id,
                now,
            ],
        )?;
        let raw = self.last_insert_rowid();
        let id = ResourceId::new(raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e))
        })?;
        debug!(%id, name = %new.name, "inserted resource");
        Ok(id)
    }

    fn update_resource(
        &self,
        id: ResourceId,
        update: &ResourceUpdate,
        now: DateTime<Utc>,
    ) -> Result<Resource, StoreError> {
        let mut resource = self.fetch_resource(id)?;
        update.apply_to(&mut resource);
        resource.updated_at = now;

        self.execute(
            "UPDATE resources SET
                display_name = ?2, address_line1 = ?3, address_line2 = ?4, city = ?5,
                state = ?6, zip = ?7, phone = ?8, website = ?9, hours = ?10,
                latitude = ?11, longitude = ?12, accepts_uninsured = ?13,
                sliding_scale = ?14, free_care_available = ?15, notes = ?16,
                resource_type_id = ?17, updated_at = ?18
            WHERE id = ?1",
            params![
                id.get(),
                resource.display_name,
                resource.address_line1,
                resource.address_line2,
                resource.city,
                resource.state,
                resource.zip,
                resource.phone,
                resource.website,
                resource.hours,
                resource.latitude,
                resource.longitude,
                resource.accepts_uninsured,
                resource.sliding_scale,
                resource.free_care_available,
                resource.notes,
                resource.resource_type_id,
                resource.updated_at,
            ],
        )?;
        Ok(resource)
    }

    fn save_merged(&self, resource: &Resource) -> Result<(), StoreError> {
        let changed = self.execute(
            "UPDATE resources SET
                notes = ?2, website = ?3, hours = ?4, accepts_uninsured = ?5,
                sliding_scale = ?6, free_care_available = ?7, updated_at = ?8
            WHERE id = ?1",
            params![
                resource.id.get(),
                resource.notes,
                resource.website,
                resource.hours,
                resource.accepts_uninsured,
                resource.sliding_scale,
                resource.free_care_available,
                resource.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(resource.id));
        }
        Ok(())
    }

    fn delete_resource(&self, id: ResourceId) -> Result<(), StoreError> {
        let changed = self.execute("DELETE FROM resources WHERE id = ?1", params![id.get()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn associations(
        &self,
        kind: AssociationKind,
        id: ResourceId,
    ) -> Result<Vec<i64>, StoreError> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE resource_id = ?1 ORDER BY {col}",
            col = kind.column(),
            table = kind.table(),
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt.query_map(params![id.get()], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<i64>, _>>()?)
    }

    fn insert_association(
        &self,
        kind: AssociationKind,
        id: ResourceId,
        other: i64,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {table} (resource_id, {col}) VALUES (?1, ?2)",
            col = kind.column(),
            table = kind.table(),
        );
        let written = self.execute(&sql, params![id.get(), other])?;
        Ok(written > 0)
    }

    fn delete_associations(
        &self,
        kind: AssociationKind,
        id: ResourceId,
    ) -> Result<usize, StoreError> {
        let sql = format!("DELETE FROM {} WHERE resource_id = ?1", kind.table());
        Ok(self.execute(&sql, params![id.get()])?)
    }

    fn add_feedback(
        &self,
        id: ResourceId,
        rating: Option<i64>,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.execute(
            "INSERT INTO resource_feedback (resource_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id.get(), rating, comment, now],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn feedback_for(&self, id: ResourceId) -> Result<Vec<Feedback>, StoreError> {
        let mut stmt = self.prepare(
            "SELECT id, resource_id, rating, comment, created_at
             FROM resource_feedback WHERE resource_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![id.get()], |row| {
            Ok(Feedback {
                id: row.get(0)?,
                resource_id: resource_id_at(row, 1)?,
                rating: row.get(2)?,
                comment: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn delete_feedback(&self, id: ResourceId) -> Result<usize, StoreError> {
        Ok(self.execute(
            "DELETE FROM resource_feedback WHERE resource_id = ?1",
            params![id.get()],
        )?)
    }
}

/// An open resource database with the schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Read-only and single-statement access.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction. Dropping it without commit rolls back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn insert_and_fetch() {
        let db = db();
        let new = NewResource::named("Troy Clinic")
            .with_address("6 Main St")
            .with_phone("518-555-0001")
            .with_location(42.73, -73.69);
        let id = db.conn().insert_resource(&new, now()).unwrap();

        let r = db.conn().fetch_resource(id).unwrap();
        assert_eq!(r.id, id);
        assert_eq!(r.name, "Troy Clinic");
        assert_eq!(r.address_line1.as_deref(), Some("6 Main St"));
        assert_eq!(r.latitude, Some(42.73));
        assert_eq!(r.created_at, now());
        assert_eq!(r.updated_at, now());
        assert!(!r.accepts_uninsured);
    }

    #[test]
    fn fetch_all_is_ordered_by_id() {
        let db = db();
        let a = db.conn().insert_resource(&NewResource::named("A"), now()).unwrap();
        let b = db.conn().insert_resource(&NewResource::named("B"), now()).unwrap();
        let all = db.conn().fetch_all_resources().unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn missing_resource_is_not_found() {
        let db = db();
        let id = ResourceId::new(404).unwrap();
        assert!(db.conn().fetch_resource(id).unwrap_err().is_not_found());
        assert!(db.conn().delete_resource(id).unwrap_err().is_not_found());
        assert!(
            db.conn()
                .update_resource(id, &ResourceUpdate::default(), now())
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn ids_are_never_reused() {
        let db = db();
        let a = db.conn().insert_resource(&NewResource::named("A"), now()).unwrap();
        db.conn().delete_resource(a).unwrap();
        let b = db.conn().insert_resource(&NewResource::named("B"), now()).unwrap();
        assert!(b > a);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let db = db();
        let id = db
            .conn()
            .insert_resource(&NewResource::named("Clinic").with_phone("1"), now())
            .unwrap();
        let later = now() + chrono::Duration::hours(1);
        let update = ResourceUpdate {
            city: Some("Troy".to_string()),
            free_care_available: Some(true),
            ..ResourceUpdate::default()
        };
        let updated = db.conn().update_resource(id, &update, later).unwrap();
        assert_eq!(updated.city.as_deref(), Some("Troy"));
        assert!(updated.free_care_available);
        assert_eq!(updated.phone.as_deref(), Some("1"));
        assert_eq!(updated.updated_at, later);

        let reread = db.conn().fetch_resource(id).unwrap();
        assert_eq!(reread, updated);
    }

    #[test]
    fn associations_insert_or_ignore() {
        let db = db();
        let id = db.conn().insert_resource(&NewResource::named("A"), now()).unwrap();
        let kind = AssociationKind::Service;

        assert!(db.conn().insert_association(kind, id, 3).unwrap());
        assert!(db.conn().insert_association(kind, id, 1).unwrap());
        assert!(!db.conn().insert_association(kind, id, 3).unwrap());
        assert_eq!(db.conn().associations(kind, id).unwrap(), vec![1, 3]);
        assert!(
            db.conn()
                .associations(AssociationKind::Language, id)
                .unwrap()
                .is_empty()
        );

        assert_eq!(db.conn().delete_associations(kind, id).unwrap(), 2);
        assert!(db.conn().associations(kind, id).unwrap().is_empty());
    }

    #[test]
    fn delete_blocked_by_remaining_links() {
        let db = db();
        let id = db.conn().insert_resource(&NewResource::named("A"), now()).unwrap();
        db.conn()
            .insert_association(AssociationKind::Insurance, id, 7)
            .unwrap();
        assert!(matches!(
            db.conn().delete_resource(id),
            Err(StoreError::Sqlite(_))
        ));
    }

    #[test]
    fn feedback_roundtrip() {
        let db = db();
        let id = db.conn().insert_resource(&NewResource::named("A"), now()).unwrap();
        db.conn()
            .add_feedback(id, Some(5), Some("great"), now())
            .unwrap();
        let fb = db.conn().feedback_for(id).unwrap();
        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].rating, Some(5));
        assert_eq!(fb[0].comment.as_deref(), Some("great"));

        assert_eq!(db.conn().delete_feedback(id).unwrap(), 1);
        assert!(db.conn().feedback_for(id).unwrap().is_empty());
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let mut db = db();
        {
            let tx = db.transaction().unwrap();
            tx.insert_resource(&NewResource::named("A"), now()).unwrap();
        }
        assert!(db.conn().fetch_all_resources().unwrap().is_empty());

        let tx = db.transaction().unwrap();
        tx.insert_resource(&NewResource::named("B"), now()).unwrap();
        tx.commit().unwrap();
        assert_eq!(db.conn().fetch_all_resources().unwrap().len(), 1);
    }

    #[test]
    fn open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.sqlite3");
        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .insert_resource(&NewResource::named("Persisted"), now())
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        let all = db.conn().fetch_all_resources().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Persisted");
    }
}
