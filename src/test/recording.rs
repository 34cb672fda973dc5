//! A [`RecordStore`] wrapper which remembers every call made through it and
//! can be told to fail a given write.

use crate::{
    record::Record,
    store::{RecordStore, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    GetMany,
    Post,
    PostMany,
    Put,
    Delete,
    DeleteMany,
}

impl Op {
    fn is_write(self) -> bool {
        !matches!(self, Op::Get | Op::GetMany)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub path: &'static str,
    pub op: Op,
    /// The id (or parent id) the call was made with.
    pub key: String,
}

pub struct RecordingStore<S> {
    pub inner: S,
    pub calls: Vec<Call>,
    writes: usize,
    fail_at: Option<usize>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Vec::new(),
            writes: 0,
            fail_at: None,
        }
    }

    /// Makes the `n`th write from now (counting from zero) fail. Reads are
    /// not counted.
    pub fn fail_at_write(&mut self, n: usize) {
        self.fail_at = Some(self.writes + n);
    }

    pub fn count(&self, path: &str, op: Op) -> usize {
        self.calls
            .iter()
            .filter(|call| call.path == path && call.op == op)
            .count()
    }

    pub fn writes(&self) -> impl Iterator<Item = &Call> {
        self.calls.iter().filter(|call| call.op.is_write())
    }

    fn record<R: Record>(&mut self, op: Op, key: &str) -> Result<(), StoreError> {
        self.calls.push(Call {
            path: R::PATH,
            op,
            key: key.to_string(),
        });

        if !op.is_write() {
            return Ok(());
        }
        let n = self.writes;
        self.writes += 1;
        if self.fail_at == Some(n) {
            tracing::debug!(path = R::PATH, ?op, key, "injecting store failure");
            return Err(StoreError::Database(
                diesel::result::Error::QueryBuilderError(
                    "injected store failure".into(),
                ),
            ));
        }
        Ok(())
    }
}

impl<R: Record, S: RecordStore<R>> RecordStore<R> for RecordingStore<S> {
    fn get(&mut self, id: &str) -> Result<R, StoreError> {
        self.record::<R>(Op::Get, id)?;
        self.inner.get(id)
    }

    fn get_many(&mut self, parent_id: &str) -> Result<Vec<R>, StoreError> {
        self.record::<R>(Op::GetMany, parent_id)?;
        self.inner.get_many(parent_id)
    }

    fn post(&mut self, record: &R) -> Result<R, StoreError> {
        self.record::<R>(Op::Post, record.id())?;
        self.inner.post(record)
    }

    fn post_many(&mut self, records: &[R]) -> Result<Vec<R>, StoreError> {
        let key = records.first().map_or("", |record| record.parent_id());
        self.record::<R>(Op::PostMany, key)?;
        self.inner.post_many(records)
    }

    fn put(&mut self, record: &R) -> Result<R, StoreError> {
        self.record::<R>(Op::Put, record.id())?;
        self.inner.put(record)
    }

    fn delete(&mut self, id: &str) -> Result<usize, StoreError> {
        self.record::<R>(Op::Delete, id)?;
        self.inner.delete(id)
    }

    fn delete_many(&mut self, parent_id: &str) -> Result<usize, StoreError> {
        self.record::<R>(Op::DeleteMany, parent_id)?;
        self.inner.delete_many(parent_id)
    }
}
