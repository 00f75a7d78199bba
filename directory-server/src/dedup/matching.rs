//! Duplicate detection.
//!
//! Two resources are duplicates when, after normalization, they share
//! either `(name, address_line1)` or `(phone, address_line1)`. A third
//! combination, all three fields equal, is implied by the first. The
//! relation is closed transitively with a disjoint-set forest, so chains
//! like A~B, B~C end up in one group even when A and C share nothing.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;

use crate::domain::{Resource, ResourceId, normalize_field};

use super::union_find::DisjointSet;

/// One equivalence class of duplicate resources.
///
/// `primary` is the smallest id in the class; `duplicates` are the rest,
/// ascending. Built fresh on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub primary: ResourceId,
    pub duplicates: Vec<ResourceId>,
}

impl DuplicateGroup {
    /// All members, primary first.
    pub fn members(&self) -> impl Iterator<Item = ResourceId> + '_ {
        std::iter::once(self.primary).chain(self.duplicates.iter().copied())
    }

    pub fn len(&self) -> usize {
        1 + self.duplicates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The normalized fields compared when matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl MatchKey {
    pub fn of(resource: &Resource) -> Self {
        Self {
            name: normalize_field(Some(&resource.name)),
            address: normalize_field(resource.address_line1.as_deref()),
            phone: normalize_field(resource.phone.as_deref()),
        }
    }

    /// `(name, address)` identity, if both parts are present.
    fn name_address(&self) -> Option<(&str, &str)> {
        Some((self.name.as_deref()?, self.address.as_deref()?))
    }

    /// `(phone, address)` identity, if both parts are present.
    fn phone_address(&self) -> Option<(&str, &str)> {
        Some((self.phone.as_deref()?, self.address.as_deref()?))
    }

    /// Whether two keys describe the same provider.
    ///
    /// Blank fields never match each other.
    pub fn matches(&self, other: &MatchKey) -> bool {
        let by_name = self.name_address().is_some() && self.name_address() == other.name_address();
        let by_phone =
            self.phone_address().is_some() && self.phone_address() == other.phone_address();
        by_name || by_phone
    }
}

/// Whether two resources directly match under the duplicate rule.
pub fn is_duplicate(a: &Resource, b: &Resource) -> bool {
    MatchKey::of(a).matches(&MatchKey::of(b))
}

/// Group resources into duplicate classes.
///
/// Only classes with at least two members are returned, ordered by primary
/// id. The result does not depend on the order of `resources`.
pub fn find_duplicate_groups(resources: &[Resource]) -> Vec<DuplicateGroup> {
    let keys: Vec<MatchKey> = resources.iter().map(MatchKey::of).collect();
    let mut sets = DisjointSet::new(resources.len());

    // Records sharing an identity are unioned with the first record seen
    // with that identity, which is enough to connect all of them.
    let mut by_name: HashMap<(&str, &str), usize> = HashMap::new();
    let mut by_phone: HashMap<(&str, &str), usize> = HashMap::new();

    for (idx, key) in keys.iter().enumerate() {
        if let Some(identity) = key.name_address() {
            match by_name.entry(identity) {
                Entry::Occupied(first) => {
                    sets.union(*first.get(), idx);
                }
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
            }
        }
        if let Some(identity) = key.phone_address() {
            match by_phone.entry(identity) {
                Entry::Occupied(first) => {
                    sets.union(*first.get(), idx);
                }
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
            }
        }
    }

    let mut groups: Vec<DuplicateGroup> = sets
        .sets()
        .into_iter()
        .filter(|members| members.len() > 1)
        .map(|members| {
            let mut ids: Vec<ResourceId> = members.iter().map(|&i| resources[i].id).collect();
            ids.sort();
            ids.dedup();
            DuplicateGroup {
                primary: ids[0],
                duplicates: ids[1..].to_vec(),
            }
        })
        .filter(|g| !g.duplicates.is_empty())
        .collect();

    groups.sort_by_key(|g| g.primary);
    groups
}
