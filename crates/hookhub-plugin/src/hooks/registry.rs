//! Callback registry — per-hook storage of callbacks ordered by priority.
//!
//! Callbacks live in buckets keyed by priority; a bucket keeps insertion
//! order. Iteration only ever goes through an [`IterationCursor`], which pins
//! the bucket it is walking. While a bucket is pinned its slots never move:
//! removals become tombstones and are swept once the last cursor leaves.
//!
//! Entries leaving the registry are parked rather than dropped. A callback's
//! captures may run arbitrary code on drop, including calls back into the
//! engine, so the owner collects them with [`CallbackRegistry::take_retired`]
//! and drops them once it no longer holds the registry.

use std::collections::BTreeMap;
use std::ops::Bound;

use hookhub_core::types::{CallbackId, Priority};

use super::cursor::IterationCursor;
use super::definitions::CallbackEntry;

/// Slot in a bucket. `live == false` marks a tombstone.
#[derive(Debug)]
struct Slot {
    entry: CallbackEntry,
    live: bool,
}

/// All callbacks registered at one priority.
#[derive(Debug, Default)]
struct Bucket {
    slots: Vec<Slot>,
    /// Number of non-tombstoned slots.
    live: usize,
    /// Number of cursors currently walking this bucket.
    pins: usize,
}

impl Bucket {
    fn position(&self, id: &CallbackId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.live && slot.entry.id == *id)
    }

    /// Removes the slot at `index`, physically if nothing walks the bucket.
    fn remove_at(&mut self, index: usize, retired: &mut Vec<CallbackEntry>) {
        if self.pins == 0 {
            retired.push(self.slots.remove(index).entry);
        } else {
            self.slots[index].live = false;
        }
        self.live -= 1;
    }

    /// Removes every live slot matching `pred`, returning how many went.
    fn remove_where<P>(&mut self, pred: P, retired: &mut Vec<CallbackEntry>) -> usize
    where
        P: Fn(&CallbackEntry) -> bool,
    {
        let before = self.live;
        if self.pins == 0 {
            self.drain_slots(|slot| pred(&slot.entry), retired);
            self.live = self.slots.len();
        } else {
            for slot in self.slots.iter_mut().filter(|s| s.live && pred(&s.entry)) {
                slot.live = false;
                self.live -= 1;
            }
        }
        before - self.live
    }

    fn sweep(&mut self, retired: &mut Vec<CallbackEntry>) {
        if self.live < self.slots.len() {
            self.drain_slots(|slot| !slot.live, retired);
        }
    }

    /// Moves the slots matching `pred` out of the bucket, keeping order.
    fn drain_slots<P>(&mut self, pred: P, retired: &mut Vec<CallbackEntry>)
    where
        P: Fn(&Slot) -> bool,
    {
        let (gone, kept): (Vec<Slot>, Vec<Slot>) =
            std::mem::take(&mut self.slots).into_iter().partition(pred);
        self.slots = kept;
        retired.extend(gone.into_iter().map(|slot| slot.entry));
    }

    /// A bucket may be dropped from the map once it is empty and unpinned.
    fn is_disposable(&self) -> bool {
        self.pins == 0 && self.slots.is_empty()
    }
}

/// Ordered callbacks for a single hook.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    buckets: BTreeMap<Priority, Bucket>,
    /// Live entries across all buckets.
    live: usize,
    /// Bumped for every cursor handed out.
    generation: u64,
    /// Cursors handed out and not yet closed.
    active_cursors: usize,
    /// Entries removed from the registry and not yet handed back.
    retired: Vec<CallbackEntry>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` to its priority bucket.
    ///
    /// Returns `false` when the same identity is already live at that
    /// priority; the rejected entry is retired.
    pub fn add(&mut self, entry: CallbackEntry) -> bool {
        let bucket = self.buckets.entry(entry.priority).or_default();
        if bucket.position(&entry.id).is_some() {
            self.retired.push(entry);
            return false;
        }
        bucket.slots.push(Slot { entry, live: true });
        bucket.live += 1;
        self.live += 1;
        true
    }

    /// Removes the entry registered as `id` at `priority`.
    pub fn remove(&mut self, priority: Priority, id: &CallbackId) -> bool {
        let Some(bucket) = self.buckets.get_mut(&priority) else {
            return false;
        };
        let Some(index) = bucket.position(id) else {
            return false;
        };

        bucket.remove_at(index, &mut self.retired);
        self.live -= 1;
        if bucket.is_disposable() {
            self.buckets.remove(&priority);
        }
        true
    }

    /// Removes every entry at `priority`, returning how many were removed.
    pub fn remove_priority(&mut self, priority: Priority) -> usize {
        let Some(bucket) = self.buckets.get_mut(&priority) else {
            return 0;
        };
        let removed = bucket.remove_where(|_| true, &mut self.retired);
        self.live -= removed;
        if bucket.is_disposable() {
            self.buckets.remove(&priority);
        }
        removed
    }

    /// Removes every entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        self.remove_matching(|_| true)
    }

    /// Removes every entry registered by `owner`.
    pub fn remove_owned_by(&mut self, owner: &str) -> usize {
        self.remove_matching(|entry| entry.is_owned_by(owner))
    }

    fn remove_matching<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&CallbackEntry) -> bool,
    {
        let mut removed = 0;
        for bucket in self.buckets.values_mut() {
            removed += bucket.remove_where(&pred, &mut self.retired);
        }
        self.buckets.retain(|_, bucket| !bucket.is_disposable());
        self.live -= removed;
        removed
    }

    /// Returns whether `id` is live at any priority.
    pub fn has(&self, id: &CallbackId) -> bool {
        self.priority_of(id).is_some()
    }

    /// Returns whether `id` is live at `priority`.
    pub fn has_at(&self, priority: Priority, id: &CallbackId) -> bool {
        self.buckets
            .get(&priority)
            .is_some_and(|bucket| bucket.position(id).is_some())
    }

    /// Returns the lowest priority `id` is live at.
    pub fn priority_of(&self, id: &CallbackId) -> Option<Priority> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.position(id).is_some())
            .map(|(priority, _)| *priority)
    }

    /// Returns whether no live entry remains.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Priorities that currently hold at least one live entry, ascending.
    pub fn priorities(&self) -> Vec<Priority> {
        self.buckets
            .iter()
            .filter(|(_, bucket)| bucket.live > 0)
            .map(|(priority, _)| *priority)
            .collect()
    }

    /// Number of cursors handed out so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of cursors currently open.
    pub fn active_cursors(&self) -> usize {
        self.active_cursors
    }

    /// Hands back every entry removed since the last call.
    ///
    /// Drop the result only after releasing any borrow of the registry.
    pub fn take_retired(&mut self) -> Vec<CallbackEntry> {
        std::mem::take(&mut self.retired)
    }

    /// Opens a cursor over the registry.
    ///
    /// This is the only way to reach entries for invocation. The cursor must
    /// be closed against this registry once the walk is over.
    pub fn snapshot_for_iteration(&mut self) -> IterationCursor {
        self.generation += 1;
        self.active_cursors += 1;
        IterationCursor::new(self.generation)
    }

    /// The first priority strictly after `after` (or the lowest one).
    pub(super) fn next_priority(&self, after: Option<Priority>) -> Option<Priority> {
        let lower = match after {
            Some(priority) => Bound::Excluded(priority),
            None => Bound::Unbounded,
        };
        self.buckets
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(priority, _)| *priority)
    }

    /// Pins the bucket at `priority`, returning its current slot count.
    pub(super) fn pin(&mut self, priority: Priority) -> Option<usize> {
        let bucket = self.buckets.get_mut(&priority)?;
        bucket.pins += 1;
        Some(bucket.slots.len())
    }

    /// Releases a pin, sweeping tombstones once the bucket is free.
    pub(super) fn unpin(&mut self, priority: Priority) {
        let Some(bucket) = self.buckets.get_mut(&priority) else {
            return;
        };
        bucket.pins = bucket.pins.saturating_sub(1);
        if bucket.pins == 0 {
            bucket.sweep(&mut self.retired);
            if bucket.is_disposable() {
                self.buckets.remove(&priority);
            }
        }
    }

    /// The live entry at `index` in a pinned bucket.
    pub(super) fn live_entry(&self, priority: Priority, index: usize) -> Option<&CallbackEntry> {
        self.buckets
            .get(&priority)
            .and_then(|bucket| bucket.slots.get(index))
            .filter(|slot| slot.live)
            .map(|slot| &slot.entry)
    }

    pub(super) fn release_cursor(&mut self) {
        self.active_cursors = self.active_cursors.saturating_sub(1);
    }

    /// Total slots including tombstones, for tests.
    #[cfg(test)]
    pub(super) fn slot_count(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.slots.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definitions::{Callback, Value};

    fn entry(name: &str, priority: Priority) -> CallbackEntry {
        Callback::named(name, |_| Value::Null)
            .expect("valid callable")
            .into_entry(priority, 1)
    }

    fn id(name: &str) -> CallbackId {
        CallbackId::parse(name).expect("valid callable")
    }

    fn walk(registry: &mut CallbackRegistry) -> Vec<String> {
        let mut cursor = registry.snapshot_for_iteration();
        let mut seen = Vec::new();
        while let Some(entry) = cursor.next(registry) {
            seen.push(entry.id.to_string());
        }
        cursor.close(registry);
        seen
    }

    #[test]
    fn test_add_orders_by_priority_then_insertion() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("late", 20));
        registry.add(entry("first", 10));
        registry.add(entry("second", 10));
        registry.add(entry("early", -5));

        assert_eq!(walk(&mut registry), ["early", "first", "second", "late"]);
        assert_eq!(registry.priorities(), vec![-5, 10, 20]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_add_is_idempotent_per_priority() {
        let mut registry = CallbackRegistry::new();
        assert!(registry.add(entry("cb", 10)));
        assert!(!registry.add(entry("cb", 10)));
        assert!(registry.add(entry("cb", 20)));
        assert_eq!(registry.len(), 2);
        assert_eq!(walk(&mut registry), ["cb", "cb"]);
    }

    #[test]
    fn test_remove_drops_empty_bucket() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("cb", 10));
        assert!(registry.remove(10, &id("cb")));
        assert!(!registry.remove(10, &id("cb")));
        assert!(!registry.remove(99, &id("cb")));
        assert!(registry.is_empty());
        assert!(registry.priorities().is_empty());
        assert_eq!(registry.next_priority(None), None);
    }

    #[test]
    fn test_queries() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("cb", 20));
        registry.add(entry("cb", 5));
        assert!(registry.has(&id("cb")));
        assert!(registry.has_at(20, &id("cb")));
        assert!(!registry.has_at(10, &id("cb")));
        assert_eq!(registry.priority_of(&id("cb")), Some(5));
        assert_eq!(registry.priority_of(&id("other")), None);
    }

    #[test]
    fn test_remove_in_pinned_bucket_tombstones_until_unpinned() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        registry.add(entry("b", 10));
        registry.add(entry("c", 10));

        let mut cursor = registry.snapshot_for_iteration();
        let first = cursor.next(&mut registry).expect("entry");
        assert_eq!(first.id, id("a"));

        assert!(registry.remove(10, &id("a")));
        assert!(registry.remove(10, &id("b")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.slot_count(), 3);

        let next = cursor.next(&mut registry).expect("entry");
        assert_eq!(next.id, id("c"));
        assert!(cursor.next(&mut registry).is_none());
        cursor.close(&mut registry);

        assert_eq!(registry.slot_count(), 1);
        assert_eq!(registry.active_cursors(), 0);
    }

    #[test]
    fn test_empty_pinned_bucket_is_disposed_after_close() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));

        let mut cursor = registry.snapshot_for_iteration();
        assert!(cursor.next(&mut registry).is_some());
        assert!(registry.remove(10, &id("a")));
        assert_eq!(registry.next_priority(None), Some(10));

        cursor.close(&mut registry);
        assert_eq!(registry.next_priority(None), None);
        assert_eq!(registry.slot_count(), 0);
    }

    #[test]
    fn test_clear_and_remove_priority() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        registry.add(entry("b", 10));
        registry.add(entry("c", 20));

        assert_eq!(registry.remove_priority(10), 2);
        assert_eq!(registry.remove_priority(10), 0);
        assert_eq!(registry.priorities(), vec![20]);
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_owned_by() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        registry.add(
            Callback::named("b", |_| Value::Null)
                .expect("valid")
                .owned_by("seo")
                .into_entry(10, 1),
        );
        registry.add(
            Callback::named("c", |_| Value::Null)
                .expect("valid")
                .owned_by("seo")
                .into_entry(30, 1),
        );

        assert_eq!(registry.remove_owned_by("seo"), 2);
        assert_eq!(walk(&mut registry), ["a"]);
        assert_eq!(registry.priorities(), vec![10]);
    }

    #[test]
    fn test_readd_after_tombstone_appends_new_slot() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        registry.add(entry("b", 10));

        let mut cursor = registry.snapshot_for_iteration();
        assert!(cursor.next(&mut registry).is_some());
        assert!(registry.remove(10, &id("a")));
        assert!(registry.add(entry("a", 10)));

        // Appended past the bucket end captured on entry: not part of this walk.
        let rest: Vec<_> = std::iter::from_fn(|| cursor.next(&mut registry))
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(rest, ["b"]);
        cursor.close(&mut registry);

        assert_eq!(walk(&mut registry), ["b", "a"]);
    }

    #[test]
    fn test_removed_entries_are_retired_not_dropped() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        registry.add(entry("b", 10));
        assert!(!registry.add(entry("a", 10)));
        assert_eq!(registry.take_retired().len(), 1);

        let mut cursor = registry.snapshot_for_iteration();
        assert!(cursor.next(&mut registry).is_some());
        assert!(registry.remove(10, &id("b")));
        assert!(registry.take_retired().is_empty());

        cursor.close(&mut registry);
        let swept: Vec<String> = registry
            .take_retired()
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(swept, ["b"]);

        assert_eq!(registry.clear(), 1);
        assert_eq!(registry.take_retired().len(), 1);
        assert!(registry.take_retired().is_empty());
    }

    #[test]
    fn test_generation_counts_snapshots() {
        let mut registry = CallbackRegistry::new();
        registry.add(entry("a", 10));
        walk(&mut registry);
        walk(&mut registry);
        assert_eq!(registry.generation(), 2);
    }
}
