//! Brings a stored collection in line with its edited copy, one store call
//! per changed record.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    record::Record,
    store::{RecordStore, StoreError},
};

/// How an edited collection differs from the stored one.
#[derive(Debug)]
pub struct Diff<'a, R> {
    pub to_update: Vec<&'a R>,
    pub to_create: Vec<&'a R>,
    pub unchanged: Vec<&'a R>,
    pub to_delete: Vec<&'a R>,
}

/// Classifies every record of `before` and `after`. Records are matched by
/// id and compared field by field.
pub fn diff<'a, R: Record>(before: &'a [R], after: &'a [R]) -> Diff<'a, R> {
    let stored: IndexMap<&str, &R> =
        before.iter().map(|record| (record.id(), record)).collect();

    let mut diff = Diff {
        to_update: Vec::new(),
        to_create: Vec::new(),
        unchanged: Vec::new(),
        to_delete: Vec::new(),
    };

    for record in after {
        match stored.get(record.id()) {
            Some(old) if *old == record => diff.unchanged.push(record),
            Some(_) => diff.to_update.push(record),
            None => diff.to_create.push(record),
        }
    }

    let kept: IndexMap<&str, &R> =
        after.iter().map(|record| (record.id(), record)).collect();
    diff.to_delete = before
        .iter()
        .filter(|record| !kept.contains_key(record.id()))
        .collect();

    diff
}

/// The outcome of [`reconcile_collection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<R> {
    /// The collection as it now stands, grouped by parent and in natural
    /// order within each parent.
    pub records: Vec<R>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl<R> Reconciled<R> {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// A collection whose updates and creates have been applied but whose
/// removed records are still stored.
///
/// Collections which reference each other are reconciled in two sweeps:
/// writes parents first, then deletes children first. A child moved away
/// from a parent is then never caught by the delete of that parent.
#[derive(Debug)]
pub struct Pending<'a, R> {
    diff: Diff<'a, R>,
    before: &'a [R],
    after: &'a [R],
    stored: IndexMap<String, R>,
    deleted: usize,
}

/// Applies the updates and creates of `after` against `before`: updates
/// first, then creates. The first failing call is returned as is.
#[tracing::instrument(skip_all, fields(path = R::PATH, before = before.len(), after = after.len()))]
pub fn write_changes<'a, R, S>(
    store: &mut S,
    before: &'a [R],
    after: &'a [R],
) -> Result<Pending<'a, R>, StoreError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    let diff = diff(before, after);

    let mut stored = IndexMap::new();
    for record in &diff.to_update {
        let record = store.put(record)?;
        stored.insert(record.id().to_string(), record);
    }
    for record in &diff.to_create {
        let record = store.post(record)?;
        stored.insert(record.id().to_string(), record);
    }

    Ok(Pending {
        diff,
        before,
        after,
        stored,
        deleted: 0,
    })
}

impl<R: Record> Pending<'_, R> {
    /// Deletes the records of `before` missing from `after`, per parent.
    ///
    /// A parent left with no records in `after` is emptied with a single
    /// `delete_many`; otherwise each record goes by id, so records created
    /// under the same parent are kept.
    #[tracing::instrument(skip_all, fields(path = R::PATH, n = self.diff.to_delete.len()))]
    pub fn delete_removed<S>(&mut self, store: &mut S) -> Result<(), StoreError>
    where
        S: RecordStore<R> + ?Sized,
    {
        let before_per_parent =
            self.before.iter().counts_by(|record| record.parent_id());
        let kept_parents = self
            .after
            .iter()
            .map(|record| record.parent_id())
            .collect::<HashSet<_>>();

        let mut doomed: IndexMap<&str, Vec<&R>> = IndexMap::new();
        for record in &self.diff.to_delete {
            doomed.entry(record.parent_id()).or_default().push(record);
        }

        for (parent_id, group) in doomed {
            let emptied = !kept_parents.contains(parent_id)
                && before_per_parent.get(parent_id) == Some(&group.len());
            if emptied {
                self.deleted += store.delete_many(parent_id)?;
            } else {
                for record in group {
                    self.deleted += store.delete(record.id())?;
                }
            }
        }
        Ok(())
    }

    /// The collection as stored, with the store's copy of every record it
    /// wrote.
    pub fn finish(mut self) -> Reconciled<R> {
        let mut records = self
            .after
            .iter()
            .map(|record| {
                self.stored
                    .swap_remove(record.id())
                    .unwrap_or_else(|| record.clone())
            })
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            a.parent_id()
                .cmp(b.parent_id())
                .then(a.sort_key().cmp(&b.sort_key()))
        });

        let reconciled = Reconciled {
            records,
            created: self.diff.to_create.len(),
            updated: self.diff.to_update.len(),
            deleted: self.deleted,
        };
        tracing::debug!(
            path = R::PATH,
            created = reconciled.created,
            updated = reconciled.updated,
            deleted = reconciled.deleted,
            "reconciled collection"
        );
        reconciled
    }
}

/// Applies the difference between `before` (what is stored) and `after`
/// (what should be stored): updates first, then creates, then deletes.
///
/// The first failing call is returned as is, in which case the collection
/// may be partly applied.
pub fn reconcile_collection<R, S>(
    store: &mut S,
    before: &[R],
    after: &[R],
) -> Result<Reconciled<R>, StoreError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    let mut pending = write_changes(store, before, after)?;
    pending.delete_removed(store)?;
    Ok(pending.finish())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        state::test_connection,
        test::{
            fixtures,
            recording::{Op, RecordingStore},
        },
        tournaments::{
            Tournament,
            events::Event,
            lanes::{Lane, lanes_for_squad},
            squads::Squad,
        },
    };

    /// A store holding the fixture tournament with its events and squads,
    /// but no lanes.
    fn store_with_squads() -> (RecordingStore<diesel::SqliteConnection>, Vec<Squad>)
    {
        let tree = fixtures::tree();
        let mut conn = test_connection();
        RecordStore::<Tournament>::post(&mut conn, tree.tmnt.as_ref().unwrap())
            .unwrap();
        RecordStore::<Event>::post_many(&mut conn, &tree.events).unwrap();
        RecordStore::<Squad>::post_many(&mut conn, &tree.squads).unwrap();
        (RecordingStore::new(conn), tree.squads)
    }

    fn lane(squad: &Squad, n: i64) -> Lane {
        Lane {
            id: fixtures::fixed_id(crate::ids::IdKind::Lane, n as u32),
            squad_id: squad.id.clone(),
            lane_number: n,
            in_use: true,
        }
    }

    #[test]
    fn lanes_are_updated_created_and_deleted() {
        let (mut store, squads) = store_with_squads();
        let squad = &squads[0];

        let before = (1..=4).map(|n| lane(squad, n)).collect::<Vec<_>>();
        reconcile_collection(&mut store, &[], &before).unwrap();
        store.calls.clear();

        let mut l2 = before[1].clone();
        l2.lane_number = 22;
        let after = vec![before[0].clone(), l2, lane(squad, 99)];

        let reconciled = reconcile_collection(&mut store, &before, &after).unwrap();
        assert_eq!(reconciled.records.len(), 3);
        assert_eq!(
            reconciled
                .records
                .iter()
                .map(|lane| lane.lane_number)
                .collect::<Vec<_>>(),
            vec![1, 22, 99]
        );
        assert!(!reconciled.records.iter().any(|l| l.id == before[3].id));
        assert_eq!(
            (reconciled.updated, reconciled.created, reconciled.deleted),
            (1, 1, 2)
        );

        let ops = store.calls.iter().map(|call| call.op).collect::<Vec<_>>();
        assert_eq!(ops, vec![Op::Put, Op::Post, Op::Delete, Op::Delete]);

        let stored = RecordStore::<Lane>::get_many(&mut store, &squad.id).unwrap();
        assert_eq!(stored, reconciled.records);
    }

    #[test]
    fn emptied_collection_is_deleted_per_parent() {
        let (mut store, squads) = store_with_squads();
        let squad = &squads[0];

        let before = (1..=12).map(|n| lane(squad, n)).collect::<Vec<_>>();
        reconcile_collection(&mut store, &[], &before).unwrap();
        store.calls.clear();

        let reconciled = reconcile_collection(&mut store, &before, &[]).unwrap();
        assert!(reconciled.records.is_empty());
        assert_eq!(reconciled.deleted, 12);
        assert_eq!(store.calls.len(), 1);
        assert_eq!(store.calls[0].op, Op::DeleteMany);
        assert_eq!(store.calls[0].key, squad.id);
    }

    #[test]
    fn regenerated_lanes_replace_the_stored_ones() {
        let (mut store, squads) = store_with_squads();
        let squad = &squads[0];

        let before = lanes_for_squad(squad);
        reconcile_collection(&mut store, &[], &before).unwrap();
        store.calls.clear();

        let after = lanes_for_squad(squad);
        let reconciled = reconcile_collection(&mut store, &before, &after).unwrap();
        assert_eq!(reconciled.records, after);
        assert_eq!((reconciled.created, reconciled.deleted), (12, 12));
        assert_eq!(store.count(Lane::PATH, Op::DeleteMany), 0);
        assert_eq!(store.count(Lane::PATH, Op::Delete), 12);

        let stored = RecordStore::<Lane>::get_many(&mut store, &squad.id).unwrap();
        assert_eq!(stored, after);
    }

    #[test]
    fn deletes_wait_for_delete_removed() {
        let (mut store, squads) = store_with_squads();
        let before = (1..=4).map(|n| lane(&squads[0], n)).collect::<Vec<_>>();
        reconcile_collection(&mut store, &[], &before).unwrap();
        store.calls.clear();

        let after = before[..2].to_vec();
        let mut pending = write_changes(&mut store, &before, &after).unwrap();
        assert!(store.calls.is_empty());
        assert_eq!(
            RecordStore::<Lane>::get_many(&mut store, &squads[0].id)
                .unwrap()
                .len(),
            4
        );

        pending.delete_removed(&mut store).unwrap();
        let reconciled = pending.finish();
        assert_eq!(reconciled.records, after);
        assert_eq!(reconciled.deleted, 2);
    }

    #[test]
    fn empty_before_only_creates() {
        let (mut store, squads) = store_with_squads();
        let after = (1..=4).map(|n| lane(&squads[0], n)).collect::<Vec<_>>();

        let reconciled = reconcile_collection(&mut store, &[], &after).unwrap();
        assert_eq!(reconciled.records, after);
        assert_eq!(reconciled.created, 4);
        assert!(store.calls.iter().all(|call| call.op == Op::Post));
    }

    #[test]
    fn unchanged_collection_makes_no_calls() {
        let (mut store, squads) = store_with_squads();
        let lanes = (1..=4).map(|n| lane(&squads[0], n)).collect::<Vec<_>>();
        reconcile_collection(&mut store, &[], &lanes).unwrap();
        store.calls.clear();

        let reconciled = reconcile_collection(&mut store, &lanes, &lanes).unwrap();
        assert!(reconciled.is_noop());
        assert!(store.calls.is_empty());
        assert_eq!(reconciled.records, lanes);
    }

    #[test]
    fn a_failed_call_stops_reconciliation() {
        let (mut store, squads) = store_with_squads();
        store.fail_at_write(2);
        let after = (1..=4).map(|n| lane(&squads[0], n)).collect::<Vec<_>>();

        assert!(reconcile_collection(&mut store, &[], &after).is_err());
        assert_eq!(store.count(Lane::PATH, Op::Post), 3);
        assert_eq!(
            RecordStore::<Lane>::get_many(&mut store, &squads[0].id)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn diff_covers_every_record_once() {
        let squad = fixtures::tree().squads.remove(0);
        let before = (1..=6).map(|n| lane(&squad, n)).collect::<Vec<_>>();
        let mut after = before[2..].to_vec();
        after[0].in_use = false;
        after.push(lane(&squad, 40));

        let d = diff(&before, &after);
        let out = d
            .to_update
            .iter()
            .chain(&d.to_create)
            .chain(&d.unchanged)
            .map(|lane| lane.id.as_str())
            .collect::<HashSet<_>>();
        let expected = after.iter().map(|l| l.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(out, expected);
        assert_eq!(d.to_delete.len(), 2);
        assert_eq!(d.to_update.len(), 1);
        assert_eq!(d.to_create.len(), 1);
    }

    #[test]
    fn diff_does_not_depend_on_order() {
        let squad = fixtures::tree().squads.remove(0);
        let before = (1..=6).map(|n| lane(&squad, n)).collect::<Vec<_>>();
        let mut after = before[1..].to_vec();
        after[2].lane_number = 50;
        after.push(lane(&squad, 60));

        let ids = |lanes: &[&Lane]| {
            lanes.iter().map(|l| l.id.clone()).collect::<HashSet<_>>()
        };

        let forward = diff(&before, &after);
        let mut before_rev = before.clone();
        before_rev.reverse();
        let mut after_rev = after.clone();
        after_rev.reverse();
        let backward = diff(&before_rev, &after_rev);

        assert_eq!(ids(&forward.to_update), ids(&backward.to_update));
        assert_eq!(ids(&forward.to_create), ids(&backward.to_create));
        assert_eq!(ids(&forward.unchanged), ids(&backward.unchanged));
        assert_eq!(ids(&forward.to_delete), ids(&backward.to_delete));
    }
}
