use diesel::{prelude::*, sqlite::SqliteConnection};

use crate::{
    record::Record,
    schema,
    store::{RecordStore, StoreError},
    tournaments::{
        Tournament, brackets::Bracket, divisions::Division,
        eliminations::Elimination, entries::DivEntry, entries::ElimEntry,
        events::Event, lanes::Lane, players::Player, pots::Pot, squads::Squad,
    },
};

/// Implements [`RecordStore`] for a record type on top of its table.
/// `$parent` is the column holding the record's parent id.
macro_rules! sqlite_store {
    ($record:ty, $table:ident, $parent:ident) => {
        impl RecordStore<$record> for SqliteConnection {
            #[tracing::instrument(skip(self), fields(path = <$record as Record>::PATH))]
            fn get(&mut self, id: &str) -> Result<$record, StoreError> {
                schema::$table::table
                    .find(id)
                    .select(<$record>::as_select())
                    .first(self)
                    .map_err(StoreError::from)
            }

            #[tracing::instrument(skip(self), fields(path = <$record as Record>::PATH))]
            fn get_many(
                &mut self,
                parent_id: &str,
            ) -> Result<Vec<$record>, StoreError> {
                let mut records = schema::$table::table
                    .filter(schema::$table::$parent.eq(parent_id))
                    .order_by(schema::$table::id)
                    .select(<$record>::as_select())
                    .load(self)?;
                records.sort_by_key(|record| record.sort_key());
                Ok(records)
            }

            #[tracing::instrument(skip_all, fields(path = <$record as Record>::PATH, id = record.id()))]
            fn post(&mut self, record: &$record) -> Result<$record, StoreError> {
                diesel::insert_into(schema::$table::table)
                    .values(record)
                    .execute(self)?;
                RecordStore::<$record>::get(self, record.id())
            }

            #[tracing::instrument(skip_all, fields(path = <$record as Record>::PATH, n = records.len()))]
            fn post_many(
                &mut self,
                records: &[$record],
            ) -> Result<Vec<$record>, StoreError> {
                self.transaction::<_, StoreError, _>(|conn| {
                    records
                        .iter()
                        .map(|record| RecordStore::<$record>::post(conn, record))
                        .collect()
                })
            }

            #[tracing::instrument(skip_all, fields(path = <$record as Record>::PATH, id = record.id()))]
            fn put(&mut self, record: &$record) -> Result<$record, StoreError> {
                let n = diesel::update(schema::$table::table.find(record.id()))
                    .set(record)
                    .execute(self)?;
                if n == 0 {
                    return Err(StoreError::NotFound);
                }
                RecordStore::<$record>::get(self, record.id())
            }

            #[tracing::instrument(skip(self), fields(path = <$record as Record>::PATH))]
            fn delete(&mut self, id: &str) -> Result<usize, StoreError> {
                Ok(diesel::delete(schema::$table::table.find(id))
                    .execute(self)?)
            }

            #[tracing::instrument(skip(self), fields(path = <$record as Record>::PATH))]
            fn delete_many(
                &mut self,
                parent_id: &str,
            ) -> Result<usize, StoreError> {
                Ok(diesel::delete(
                    schema::$table::table
                        .filter(schema::$table::$parent.eq(parent_id)),
                )
                .execute(self)?)
            }
        }
    };
}

sqlite_store!(Tournament, tmnts, user_id);
sqlite_store!(Event, events, tmnt_id);
sqlite_store!(Division, divs, tmnt_id);
sqlite_store!(Squad, squads, event_id);
sqlite_store!(Lane, lanes, squad_id);
sqlite_store!(Pot, pots, squad_id);
sqlite_store!(Bracket, brkts, squad_id);
sqlite_store!(Elimination, elims, squad_id);
sqlite_store!(Player, players, squad_id);
sqlite_store!(DivEntry, div_entries, div_id);
sqlite_store!(ElimEntry, elim_entries, elim_id);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ids::IdKind, state::test_connection, test::fixtures};

    #[test]
    fn post_then_get() {
        let mut conn = test_connection();
        let tmnt = fixtures::tmnt();

        let stored = RecordStore::<Tournament>::post(&mut conn, &tmnt).unwrap();
        assert_eq!(stored, tmnt);
        assert_eq!(
            RecordStore::<Tournament>::get(&mut conn, &tmnt.id).unwrap(),
            tmnt
        );
    }

    #[test]
    fn missing_record_is_not_found() {
        let mut conn = test_connection();
        let err = RecordStore::<Tournament>::get(
            &mut conn,
            &crate::ids::new_id(IdKind::Tmnt),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn dangling_parent_is_reported() {
        let mut conn = test_connection();
        let event = fixtures::tree().events.remove(0);

        let err = RecordStore::<Event>::post(&mut conn, &event).unwrap_err();
        assert!(matches!(err, StoreError::DanglingReference(_)), "{err:?}");
        assert!(err.is_not_found());
    }

    #[test]
    fn duplicate_name_is_a_conflict() {
        let mut conn = test_connection();
        let tree = fixtures::tree();
        RecordStore::<Tournament>::post(&mut conn, tree.tmnt.as_ref().unwrap())
            .unwrap();
        RecordStore::<Event>::post(&mut conn, &tree.events[0]).unwrap();

        let mut twin = tree.events[1].clone();
        twin.event_name = tree.events[0].event_name.clone();
        let err = RecordStore::<Event>::post(&mut conn, &twin).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
    }

    #[test]
    fn post_many_is_all_or_nothing() {
        let mut conn = test_connection();
        let tree = fixtures::tree();
        RecordStore::<Tournament>::post(&mut conn, tree.tmnt.as_ref().unwrap())
            .unwrap();

        let mut events = tree.events.clone();
        events[1].event_name = events[0].event_name.clone();
        assert!(RecordStore::<Event>::post_many(&mut conn, &events).is_err());
        let tmnt_id = tree.tmnt_id().unwrap();
        assert!(
            RecordStore::<Event>::get_many(&mut conn, tmnt_id)
                .unwrap()
                .is_empty()
        );

        let stored =
            RecordStore::<Event>::post_many(&mut conn, &tree.events).unwrap();
        assert_eq!(stored, tree.events);
    }

    #[test]
    fn put_and_delete() {
        let mut conn = test_connection();
        let tree = fixtures::tree();
        RecordStore::<Tournament>::post(&mut conn, tree.tmnt.as_ref().unwrap())
            .unwrap();
        RecordStore::<Division>::post_many(&mut conn, &tree.divs).unwrap();

        let mut div = tree.divs[0].clone();
        div.hdcp_from = 210;
        assert_eq!(RecordStore::<Division>::put(&mut conn, &div).unwrap(), div);

        assert_eq!(RecordStore::<Division>::delete(&mut conn, &div.id).unwrap(), 1);
        assert_eq!(RecordStore::<Division>::delete(&mut conn, &div.id).unwrap(), 0);
        assert!(matches!(
            RecordStore::<Division>::put(&mut conn, &div),
            Err(StoreError::NotFound)
        ));

        let tmnt_id = tree.tmnt_id().unwrap();
        assert_eq!(
            RecordStore::<Division>::delete_many(&mut conn, tmnt_id).unwrap(),
            tree.divs.len() - 1
        );
        assert_eq!(
            RecordStore::<Division>::delete_many(&mut conn, tmnt_id).unwrap(),
            0
        );
    }

    #[test]
    fn get_many_is_in_natural_order() {
        let mut conn = test_connection();
        let tree = fixtures::tree();
        RecordStore::<Tournament>::post(&mut conn, tree.tmnt.as_ref().unwrap())
            .unwrap();
        RecordStore::<Event>::post_many(&mut conn, &tree.events).unwrap();
        RecordStore::<Squad>::post_many(&mut conn, &tree.squads).unwrap();

        let squad = &tree.squads[0];
        let mut lanes: Vec<Lane> = tree
            .lanes
            .iter()
            .filter(|lane| lane.squad_id == squad.id)
            .cloned()
            .collect();
        lanes.reverse();
        RecordStore::<Lane>::post_many(&mut conn, &lanes).unwrap();

        let numbers = RecordStore::<Lane>::get_many(&mut conn, &squad.id)
            .unwrap()
            .into_iter()
            .map(|lane| lane.lane_number)
            .collect::<Vec<_>>();
        assert!(numbers.is_sorted());
        assert_eq!(numbers.len(), lanes.len());
    }
}
