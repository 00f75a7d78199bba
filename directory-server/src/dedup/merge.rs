//! Field-level merge of a duplicate group into its primary.

use chrono::{DateTime, Utc};

use crate::domain::{Resource, ResourceId, non_blank};

/// Separator placed between notes gathered from different records.
pub const NOTES_SEPARATOR: &str = " | ";

/// The surviving record after absorbing its duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    /// The primary with merged fields applied.
    pub resource: Resource,

    /// Ids folded into the primary, ascending. These rows are to be deleted.
    pub absorbed: Vec<ResourceId>,
}

/// Merge `duplicates` into `primary`.
///
/// Duplicates are folded in ascending id order regardless of the order
/// given. Nothing informative is dropped:
///
/// - notes are appended with [`NOTES_SEPARATOR`] (a duplicate's notes
///   already contained in the merged text are not repeated);
/// - website and hours are filled only where the primary has none;
/// - each feature flag is the OR over all members;
/// - `updated_at` becomes `now`.
///
/// Identity fields (name, address, phone, coordinates) stay as the
/// primary's.
pub fn merge_group(primary: &Resource, duplicates: &[Resource], now: DateTime<Utc>) -> MergedRecord {
    let mut merged = primary.clone();

    let mut ordered: Vec<&Resource> = duplicates.iter().filter(|d| d.id != primary.id).collect();
    ordered.sort_by_key(|d| d.id);
    ordered.dedup_by_key(|d| d.id);

    for dup in &ordered {
        merged.notes = merge_notes(merged.notes.take(), dup.notes.as_deref());
        merged.website = coalesce(merged.website.take(), dup.website.as_deref());
        merged.hours = coalesce(merged.hours.take(), dup.hours.as_deref());
        merged.accepts_uninsured |= dup.accepts_uninsured;
        merged.sliding_scale |= dup.sliding_scale;
        merged.free_care_available |= dup.free_care_available;
    }
    merged.updated_at = now;

    MergedRecord {
        resource: merged,
        absorbed: ordered.iter().map(|d| d.id).collect(),
    }
}

fn merge_notes(current: Option<String>, incoming: Option<&str>) -> Option<String> {
    let Some(incoming) = non_blank(incoming) else {
        return current;
    };
    match current {
        Some(existing) if !existing.trim().is_empty() => {
            if existing.contains(incoming) {
                Some(existing)
            } else {
                Some(format!("{existing}{NOTES_SEPARATOR}{incoming}"))
            }
        }
        _ => Some(incoming.to_string()),
    }
}

fn coalesce(current: Option<String>, incoming: Option<&str>) -> Option<String> {
    match current {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => non_blank(incoming).map(str::to_string).or(current),
    }
}

#[cfg(test)]
mod tests {
    use super::super::matching::test_support::resource;
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn notes_concatenate_in_id_order() {
        let mut p = resource(1, "X", "1 St", "");
        p.notes = Some("walk-ins".into());
        let mut d2 = resource(2, "X", "1 St", "");
        d2.notes = Some("spanish spoken".into());
        let mut d3 = resource(3, "X", "1 St", "");
        d3.notes = Some("closed sundays".into());

        let merged = merge_group(&p, &[d3, d2], now());
        assert_eq!(
            merged.resource.notes.as_deref(),
            Some("walk-ins | spanish spoken | closed sundays")
        );
        assert_eq!(
            merged.absorbed,
            vec![ResourceId::new(2).unwrap(), ResourceId::new(3).unwrap()]
        );
    }

    #[test]
    fn notes_adopted_when_primary_empty() {
        let mut p = resource(1, "X", "1 St", "");
        p.notes = Some("  ".into());
        let mut d = resource(2, "X", "1 St", "");
        d.notes = Some("evening hours".into());
        let merged = merge_group(&p, &[d], now());
        assert_eq!(merged.resource.notes.as_deref(), Some("evening hours"));
    }

    #[test]
    fn repeated_notes_not_duplicated() {
        let mut p = resource(1, "X", "1 St", "");
        p.notes = Some("walk-ins".into());
        let mut d = resource(2, "X", "1 St", "");
        d.notes = Some("walk-ins".into());
        let merged = merge_group(&p, &[d], now());
        assert_eq!(merged.resource.notes.as_deref(), Some("walk-ins"));
    }

    #[test]
    fn website_and_hours_fill_if_missing() {
        let mut p = resource(1, "X", "1 St", "");
        p.website = Some("https://primary.example".into());
        let mut d2 = resource(2, "X", "1 St", "");
        d2.website = Some("https://dup.example".into());
        d2.hours = Some("".into());
        let mut d3 = resource(3, "X", "1 St", "");
        d3.hours = Some("Mon-Fri 9-5".into());

        let merged = merge_group(&p, &[d2, d3], now());
        assert_eq!(
            merged.resource.website.as_deref(),
            Some("https://primary.example")
        );
        assert_eq!(merged.resource.hours.as_deref(), Some("Mon-Fri 9-5"));
    }

    #[test]
    fn flags_are_ored() {
        let p = resource(1, "X", "1 St", "");
        let mut d2 = resource(2, "X", "1 St", "");
        d2.sliding_scale = true;
        let mut d3 = resource(3, "X", "1 St", "");
        d3.free_care_available = true;

        let merged = merge_group(&p, &[d2, d3], now());
        assert!(!merged.resource.accepts_uninsured);
        assert!(merged.resource.sliding_scale);
        assert!(merged.resource.free_care_available);
    }

    #[test]
    fn identity_fields_kept_and_timestamp_bumped() {
        let p = resource(1, "Troy Clinic", "6 Main St", "518-555-0001");
        let d = resource(2, "troy clinic", "6 main st", "518-555-9999");
        let merged = merge_group(&p, &[d], now());
        assert_eq!(merged.resource.id, p.id);
        assert_eq!(merged.resource.name, "Troy Clinic");
        assert_eq!(merged.resource.phone.as_deref(), Some("518-555-0001"));
        assert_eq!(merged.resource.created_at, p.created_at);
        assert_eq!(merged.resource.updated_at, now());
    }

    #[test]
    fn primary_in_duplicates_is_ignored() {
        let p = resource(1, "X", "1 St", "");
        let merged = merge_group(&p, &[p.clone()], now());
        assert!(merged.absorbed.is_empty());
    }
}
