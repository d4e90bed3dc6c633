use std::collections::HashSet;

use crate::SubscriptionSnapshot;

/// Subscription ids already observed by the new-item detector.
///
/// Append-only apart from [`KnownIdSet::reset`]. A fresh set is unprimed: its
/// first scan only seeds it, so subscriptions that existed before the process
/// started are not treated as new.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownIdSet {
    ids: HashSet<String>,
    primed: bool,
}

impl KnownIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A primed set holding `ids`, as restored from a checkpoint.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            primed: true,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn reset(&mut self) {
        self.ids.clear();
        self.primed = false;
    }

    /// Sorted copy of the ids, for checkpoints.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Seeds an unprimed set with the whole list and reports nothing;
    /// otherwise behaves as [`detect_new`].
    pub fn scan(&mut self, newest_first: &[SubscriptionSnapshot]) -> Vec<SubscriptionSnapshot> {
        if !self.primed {
            self.ids
                .extend(newest_first.iter().map(|item| item.id.clone()));
            self.primed = true;
            return Vec::new();
        }
        detect_new(self, newest_first)
    }
}

/// Returns the items in front of the first already-known id, in list order.
///
/// `newest_first` must be ordered by creation, newest first. The walk stops
/// at the boundary, so the cost is proportional to the number of new items.
/// Every id visited, the boundary included, is recorded in `known`.
pub fn detect_new(
    known: &mut KnownIdSet,
    newest_first: &[SubscriptionSnapshot],
) -> Vec<SubscriptionSnapshot> {
    let mut fresh = Vec::new();
    for item in newest_first {
        if !known.insert(item.id.clone()) {
            break;
        }
        fresh.push(item.clone());
    }
    fresh
}
