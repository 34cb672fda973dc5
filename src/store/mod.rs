//! The record store. Every collection of the tournament tree is read and
//! written one call at a time through [`RecordStore`]; nothing above this
//! layer assumes the calls share a transaction.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::{
    record::Record,
    tournaments::{
        Tournament, brackets::Bracket, divisions::Division,
        eliminations::Elimination,
        entries::{DivEntry, ElimEntry},
        events::Event,
        lanes::Lane,
        players::Player,
        pots::Pot,
        squads::Squad,
    },
};

mod sqlite;

/// Errors returned by a [`RecordStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// The record points at a parent which doesn't exist.
    #[error("referenced record does not exist: {0}")]
    DanglingReference(String),
    /// The record clashes with a stored one (same id, or a name which has to
    /// be unique within its parent).
    #[error("record conflicts with an existing record: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DieselError),
    #[error(transparent)]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl StoreError {
    /// Both a missing record and a missing parent are reported to clients as
    /// "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound | StoreError::DanglingReference(_))
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => StoreError::DanglingReference(info.message().to_string()),
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            ) => StoreError::Conflict(info.message().to_string()),
            err => StoreError::Database(err),
        }
    }
}

/// Storage for one kind of record.
///
/// `post` and `put` return the record as it was stored. Deletes return how
/// many records went; deleting nothing is not an error.
pub trait RecordStore<R: Record> {
    fn get(&mut self, id: &str) -> Result<R, StoreError>;

    /// Every record belonging to `parent_id`, in their natural order.
    fn get_many(&mut self, parent_id: &str) -> Result<Vec<R>, StoreError>;

    fn post(&mut self, record: &R) -> Result<R, StoreError>;

    /// Inserts a batch of records. Either all of them are stored or none
    /// are.
    fn post_many(&mut self, records: &[R]) -> Result<Vec<R>, StoreError>;

    fn put(&mut self, record: &R) -> Result<R, StoreError>;

    fn delete(&mut self, id: &str) -> Result<usize, StoreError>;

    /// Deletes every record belonging to `parent_id`.
    fn delete_many(&mut self, parent_id: &str) -> Result<usize, StoreError>;
}

/// A store holding every collection of a tournament tree.
pub trait TreeStore:
    RecordStore<Tournament>
    + RecordStore<Event>
    + RecordStore<Division>
    + RecordStore<Squad>
    + RecordStore<Lane>
    + RecordStore<Pot>
    + RecordStore<Bracket>
    + RecordStore<Elimination>
    + RecordStore<Player>
    + RecordStore<DivEntry>
    + RecordStore<ElimEntry>
{
}

impl<S> TreeStore for S where
    S: RecordStore<Tournament>
        + RecordStore<Event>
        + RecordStore<Division>
        + RecordStore<Squad>
        + RecordStore<Lane>
        + RecordStore<Pot>
        + RecordStore<Bracket>
        + RecordStore<Elimination>
        + RecordStore<Player>
        + RecordStore<DivEntry>
        + RecordStore<ElimEntry>
        + ?Sized
{
}
