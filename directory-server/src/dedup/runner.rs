//! Transactional dedup run over the resource store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Resource, ResourceId};
use crate::store::{AssociationKind, Database, ResourceStore, StoreError};

use super::matching::{DuplicateGroup, find_duplicate_groups};
use super::merge::{MergedRecord, merge_group};

/// Errors that abort a dedup run. The run is rolled back in full.
#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    /// Storage failed while reading or merging
    #[error("dedup run aborted: {0}")]
    Store(#[from] StoreError),

    /// A grouped id vanished between reading and merging
    #[error("resource {0} disappeared during dedup run")]
    MissingMember(ResourceId),
}

/// Outcome for one merged group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOutcome {
    pub primary: ResourceId,
    pub absorbed: Vec<ResourceId>,
    pub associations_repointed: usize,
    pub associations_dropped: usize,
    pub feedback_removed: usize,
}

/// Structured result of a dedup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupReport {
    /// Number of duplicate groups merged.
    pub groups_processed: usize,

    /// Resource rows deleted after being absorbed.
    pub resources_removed: usize,

    /// Link rows moved onto a primary.
    pub associations_repointed: usize,

    /// Link rows discarded because the primary already had them.
    pub associations_dropped: usize,

    /// Feedback rows deleted along with absorbed resources.
    pub feedback_removed: usize,

    /// Per-group detail, ordered by primary id.
    pub groups: Vec<GroupOutcome>,
}

impl DedupReport {
    fn record(&mut self, outcome: GroupOutcome) {
        self.groups_processed += 1;
        self.resources_removed += outcome.absorbed.len();
        self.associations_repointed += outcome.associations_repointed;
        self.associations_dropped += outcome.associations_dropped;
        self.feedback_removed += outcome.feedback_removed;
        self.groups.push(outcome);
    }

    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.groups_processed == 0
    }
}

/// Finds and merges duplicate resources.
///
/// A run holds one write transaction for its whole duration: either every
/// group is merged or none is. Concurrent writers outside that transaction
/// are not coordinated with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Run with the current time as the merge timestamp.
    pub fn run(&self, db: &mut Database) -> Result<DedupReport, DedupError> {
        self.run_at(db, Utc::now())
    }

    /// Run with an explicit merge timestamp.
    pub fn run_at(&self, db: &mut Database, now: DateTime<Utc>) -> Result<DedupReport, DedupError> {
        let tx = db.transaction()?;
        let report = self.run_in(&*tx, now)?;
        tx.commit().map_err(StoreError::from)?;

        info!(
            groups = report.groups_processed,
            removed = report.resources_removed,
            repointed = report.associations_repointed,
            "dedup run committed"
        );
        Ok(report)
    }

    /// Run against a store without committing.
    ///
    /// The caller owns the transaction; on error it must not commit.
    pub fn run_in<S: ResourceStore + ?Sized>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<DedupReport, DedupError> {
        let resources = store.fetch_all_resources()?;
        let groups = find_duplicate_groups(&resources);
        debug!(
            resources = resources.len(),
            groups = groups.len(),
            "found duplicate groups"
        );

        let by_id: HashMap<ResourceId, &Resource> = resources.iter().map(|r| (r.id, r)).collect();

        let mut report = DedupReport::default();
        for group in &groups {
            let outcome = apply_group(store, &by_id, group, now).inspect_err(|e| {
                warn!(primary = %group.primary, error = %e, "merge failed, rolling back run");
            })?;
            report.record(outcome);
        }
        Ok(report)
    }
}

fn apply_group<S: ResourceStore + ?Sized>(
    store: &S,
    by_id: &HashMap<ResourceId, &Resource>,
    group: &DuplicateGroup,
    now: DateTime<Utc>,
) -> Result<GroupOutcome, DedupError> {
    let lookup = |id: ResourceId| -> Result<Resource, DedupError> {
        by_id
            .get(&id)
            .map(|r| (*r).clone())
            .ok_or(DedupError::MissingMember(id))
    };

    let primary = lookup(group.primary)?;
    let duplicates = group
        .duplicates
        .iter()
        .map(|&id| lookup(id))
        .collect::<Result<Vec<_>, _>>()?;

    let MergedRecord { resource, absorbed } = merge_group(&primary, &duplicates, now);
    store.save_merged(&resource)?;

    let mut outcome = GroupOutcome {
        primary: resource.id,
        absorbed: absorbed.clone(),
        associations_repointed: 0,
        associations_dropped: 0,
        feedback_removed: 0,
    };

    for &dup in &absorbed {
        for kind in AssociationKind::ALL {
            for other in store.associations(kind, dup)? {
                if store.insert_association(kind, resource.id, other)? {
                    outcome.associations_repointed += 1;
                } else {
                    outcome.associations_dropped += 1;
                }
            }
            store.delete_associations(kind, dup)?;
        }
        outcome.feedback_removed += store.delete_feedback(dup)?;
        store.delete_resource(dup)?;
    }

    debug!(
        primary = %outcome.primary,
        absorbed = ?outcome.absorbed,
        "merged duplicate group"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewResource;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
    }

    fn insert(db: &Database, new: NewResource) -> ResourceId {
        db.conn().insert_resource(&new, now()).unwrap()
    }

    #[test]
    fn merges_name_address_duplicates() {
        let mut db = Database::open_in_memory().unwrap();
        let a = insert(
            &db,
            NewResource::named("Troy Clinic")
                .with_address("6 Main St")
                .with_phone("518-555-0001"),
        );
        let b = insert(
            &db,
            NewResource::named("troy clinic")
                .with_address("6 main st")
                .with_phone("518-555-9999"),
        );

        let later = now() + chrono::Duration::days(1);
        let report = Deduplicator::new().run_at(&mut db, later).unwrap();
        assert_eq!(report.groups_processed, 1);
        assert_eq!(report.resources_removed, 1);
        assert_eq!(report.groups[0].primary, a);
        assert_eq!(report.groups[0].absorbed, vec![b]);

        let all = db.conn().fetch_all_resources().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, a);
        assert_eq!(all[0].updated_at, later);
        assert!(db.conn().fetch_resource(b).unwrap_err().is_not_found());
    }

    #[test]
    fn merges_phone_address_duplicates() {
        let mut db = Database::open_in_memory().unwrap();
        let a = insert(
            &db,
            NewResource::named("Oak Health")
                .with_address("10 Oak St")
                .with_phone("518-555-0002"),
        );
        let _ = insert(
            &db,
            NewResource::named("Oak Street Family")
                .with_address("10 oak st")
                .with_phone("518-555-0002"),
        );

        let report = Deduplicator::new().run_at(&mut db, now()).unwrap();
        assert_eq!(report.groups_processed, 1);
        let all = db.conn().fetch_all_resources().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, a);
        assert_eq!(all[0].name, "Oak Health");
    }

    #[test]
    fn associations_repointed_with_insert_or_ignore() {
        let mut db = Database::open_in_memory().unwrap();
        let a = insert(&db, NewResource::named("X").with_address("1 St"));
        let b = insert(&db, NewResource::named("x").with_address("1 st"));
        let conn = db.conn();
        conn.insert_association(AssociationKind::Service, a, 1).unwrap();
        conn.insert_association(AssociationKind::Service, b, 1).unwrap();
        conn.insert_association(AssociationKind::Service, b, 2).unwrap();
        conn.insert_association(AssociationKind::Language, b, 5).unwrap();
        conn.add_feedback(b, Some(4), Some("ok"), now()).unwrap();

        let report = Deduplicator::new().run_at(&mut db, now()).unwrap();
        assert_eq!(report.associations_repointed, 2);
        assert_eq!(report.associations_dropped, 1);
        assert_eq!(report.feedback_removed, 1);

        let conn = db.conn();
        assert_eq!(
            conn.associations(AssociationKind::Service, a).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            conn.associations(AssociationKind::Language, a).unwrap(),
            vec![5]
        );
        assert!(conn.associations(AssociationKind::Service, b).unwrap().is_empty());
        assert!(conn.feedback_for(b).unwrap().is_empty());
    }

    #[test]
    fn merged_fields_persisted() {
        let mut db = Database::open_in_memory().unwrap();
        let a = insert(
            &db,
            NewResource::named("X").with_address("1 St").with_notes("first"),
        );
        let mut dup = NewResource::named("X").with_address("1 St").with_notes("second");
        dup.free_care_available = true;
        dup.website = Some("https://x.example".into());
        insert(&db, dup);

        Deduplicator::new().run_at(&mut db, now()).unwrap();
        let merged = db.conn().fetch_resource(a).unwrap();
        assert_eq!(merged.notes.as_deref(), Some("first | second"));
        assert!(merged.free_care_available);
        assert_eq!(merged.website.as_deref(), Some("https://x.example"));
    }

    #[test]
    fn second_run_is_noop() {
        let mut db = Database::open_in_memory().unwrap();
        insert(&db, NewResource::named("A").with_address("1 St"));
        insert(&db, NewResource::named("a").with_address("1 st"));
        insert(&db, NewResource::named("B").with_address("2 St"));

        let first = Deduplicator::new().run_at(&mut db, now()).unwrap();
        assert_eq!(first.groups_processed, 1);
        let second = Deduplicator::new().run_at(&mut db, now()).unwrap();
        assert!(second.is_noop());
        assert_eq!(second, DedupReport::default());
    }

    #[test]
    fn failure_rolls_back_entire_run() {
        let mut db = Database::open_in_memory().unwrap();
        insert(&db, NewResource::named("A").with_address("1 St").with_notes("a1"));
        let a2 = insert(&db, NewResource::named("A").with_address("1 St").with_notes("a2"));
        let b1 = insert(&db, NewResource::named("B").with_address("2 St"));
        let b2 = insert(&db, NewResource::named("B").with_address("2 St"));
        db.conn()
            .insert_association(AssociationKind::Service, b2, 9)
            .unwrap();

        // The second group fails on deleting its duplicate.
        db.conn()
            .execute_batch(&format!(
                "CREATE TRIGGER block_delete BEFORE DELETE ON resources
                 WHEN OLD.id = {} BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
                b2.get()
            ))
            .unwrap();

        let before = db.conn().fetch_all_resources().unwrap();
        let err = Deduplicator::new().run_at(&mut db, now()).unwrap_err();
        assert!(matches!(err, DedupError::Store(StoreError::Sqlite(_))));

        // First group untouched even though it merged before the failure.
        let after = db.conn().fetch_all_resources().unwrap();
        assert_eq!(before, after);
        assert!(db.conn().fetch_resource(a2).is_ok());
        assert_eq!(
            db.conn()
                .associations(AssociationKind::Service, b2)
                .unwrap(),
            vec![9]
        );
        assert!(
            db.conn()
                .associations(AssociationKind::Service, b1)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn empty_store_is_noop() {
        let mut db = Database::open_in_memory().unwrap();
        let report = Deduplicator::new().run(&mut db).unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = DedupReport {
            groups_processed: 2,
            ..DedupReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["groupsProcessed"], 2);
        assert_eq!(json["resourcesRemoved"], 0);
    }
}
